pub mod assessment;
pub mod outcome;
pub mod quota;
pub mod submission;
pub mod task;

pub use assessment::{Criterion, RawAssessment, RubricScores};
pub use outcome::{
    ClarificationRequest, EvaluationFailure, EvaluationOutcome, EvaluationSuccess, FailureKind,
    PersistenceIssue,
};
pub use quota::{QuotaDecision, QuotaRecord, QuotaTier};
pub use submission::{HistoryEntry, SubmissionId, SubmissionRequest, SubmissionStatus, UserId};
pub use task::{TaskDetectionOutcome, TaskType};
