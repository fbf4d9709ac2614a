//! LLM-based article categorization.

mod model;
mod prompt;
mod service;
mod worker;

pub use model::{HttpTextModel, TextModel, MODEL_ID_HEADER};
pub use prompt::{build_prompt, normalize_output, CategoryVocabulary};
pub use service::{BatchReport, Categorizer};
pub use worker::{start_categorizer_worker, CategorizerWorker};
