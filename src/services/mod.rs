pub mod language;
pub mod quota_guard;
pub mod task_detector;
pub mod text_validator;

pub use language::{detect_language, DetectedLanguage};
pub use quota_guard::{QuotaGuard, QuotaLimits};
pub use task_detector::{DetectionThresholds, TaskTypeDetector};
pub use text_validator::{TextValidator, ValidationErrorKind, ValidationOutcome, ValidatorSettings};
