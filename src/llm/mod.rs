pub mod client;
pub mod extractor;
pub mod invoker;
pub mod tools;

pub use client::LLMClient;
pub use invoker::{InvokeError, InvokeRequest, LanguageModel, ToolBinding};
