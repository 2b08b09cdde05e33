pub mod text_loader;

pub use text_loader::{
    load_image, load_questions_file, split_questions, FilePreview, QuestionFile,
};
