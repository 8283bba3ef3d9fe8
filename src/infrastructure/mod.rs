pub mod clock;
pub mod memory_store;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory_store::{MemoryStore, StoredSubmission};
pub use store::{DailyCounterStore, SubmissionRepository};
