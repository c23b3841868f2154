//! Text-generation client abstractions and implementations

pub mod client;
#[cfg(test)]
pub mod mock;
pub mod openai;

pub use client::{GenerateRequest, ImageData, TextGenerator};
pub use openai::OpenAiCompatClient;
