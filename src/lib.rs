//! Generative study-assistant core
//!
//! Dispatches role-tagged prompts to the Gemini `generateContent` endpoint and
//! normalizes the replies into chat text, summaries, flashcards and quizzes.

pub mod ai;
pub mod assistant;
pub mod document;
pub mod error;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod task;

pub use error::{Error, Result};
