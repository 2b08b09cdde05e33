pub mod job;
pub mod loaders;
pub mod payload;
pub mod question;

pub use job::{BatchStatusResponse, JobHandle, JobStatus, PollStep};
pub use loaders::{load_image, load_questions_file, FilePreview, QuestionFile};
pub use payload::{
    ExportArtifact, ExportFormat, ExportRequest, ProcessRequest, RawSubmissionResponse,
    SubmissionOutcome, SubmissionPayload,
};
pub use question::{QaResult, QuestionEntry, TokenUsage};
