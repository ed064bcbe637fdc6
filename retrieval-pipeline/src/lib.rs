pub mod answer_retrieval;

pub use answer_retrieval::{Answer, QueryHandler, NO_ANSWER_TEXT, NO_RESULTS_ANSWER};
