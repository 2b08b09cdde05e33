pub mod export_gateway;
pub mod question_batch;
pub mod result_sink;
pub mod submission_dispatcher;

pub use export_gateway::ExportGateway;
pub use question_batch::QuestionBatch;
pub use result_sink::ResultSink;
pub use submission_dispatcher::{classify_response, SubmissionDispatcher};
