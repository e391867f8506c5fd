pub mod category;
pub mod conversation;
pub mod filter;
pub mod llm_json;
pub mod plan;
