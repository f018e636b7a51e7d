pub mod client;
pub mod dispatcher;
pub mod extract;
pub mod types;

pub use client::{GeminiHttpClient, KeyPlacement};
pub use dispatcher::GeminiDispatcher;
pub use extract::Extraction;
