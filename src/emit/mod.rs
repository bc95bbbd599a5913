mod json;

pub use json::{output_file_name, AnalysisOutput, Metadata, QuestionResult, Routing, RunError};
