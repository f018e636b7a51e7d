//! Study-assistant operations.
//!
//! Each operation builds a prompt, issues exactly one generator call and
//! normalizes the reply. No state is kept between calls; conversation history
//! is whatever the caller passes in.

use crate::ai::{GeminiDispatcher, TextGenerator};
use crate::document::Document;
use crate::models::{
    chat_title, ChatExchange, ChatMessage, Config, Flashcard, PromptPart, QuizQuestion,
    StructuredResult, UserProfile,
};
use crate::normalize::{self, StructuredKind};
use crate::task::{CancelToken, RequestHandle};
use crate::{prompts, Error, Result};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_QUIZ_QUESTIONS: usize = 10;
pub const NO_SUMMARY: &str = "No summary returned.";

#[derive(Clone)]
pub struct StudyAssistant {
    generator: Arc<dyn TextGenerator>,
}

impl StudyAssistant {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(GeminiDispatcher::from_config(config)))
    }

    /// Chat reply, optionally preceded by an instruction part.
    pub async fn chat_reply(&self, message: &str, system_prompt: Option<&str>) -> Result<String> {
        info!("Chat message received ({} chars)", message.chars().count());
        let parts = chat_parts(message, system_prompt);
        self.converse(&parts).await
    }

    /// Run one chat turn and record it as transcript messages. A failed request
    /// becomes an inline `Error: ...` AI message.
    pub async fn chat_exchange(&self, message: &str, system_prompt: Option<&str>) -> ChatExchange {
        let user = ChatMessage::user(message);
        let reply = match self.chat_reply(message, system_prompt).await {
            Ok(text) => ChatMessage::ai(text),
            Err(e) => {
                tracing::error!("Chat request failed: {}", e);
                ChatMessage::error(&e)
            }
        };
        ChatExchange {
            title: chat_title(message),
            messages: vec![user, reply],
        }
    }

    /// Dispatch a caller-assembled conversation and clean the reply.
    pub async fn converse(&self, parts: &[PromptPart]) -> Result<String> {
        let raw = self.generator.generate(parts).await?;
        Ok(normalize::clean(Some(&raw)))
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        info!("Summarizing text ({} chars)", text.chars().count());
        let prompt = prompts::render(prompts::SUMMARIZE, &[("text", text)]);
        let summary = self.converse(&[PromptPart::user(prompt)]).await?;
        tracing::debug!("Summary output: {}", summary);
        Ok(summary)
    }

    /// Summarize an uploaded document. Returns [`NO_SUMMARY`] when the reply
    /// carries no text at the primary location.
    pub async fn summarize_document(&self, document: &Document) -> Result<String> {
        info!("Summarizing document: {}", document.name);
        let summary = self
            .generator
            .generate_with_document(prompts::SUMMARIZE_DOCUMENT, document)
            .await?;
        Ok(summary.unwrap_or_else(|| NO_SUMMARY.to_string()))
    }

    pub async fn improve_note(&self, note: &str) -> Result<String> {
        let prompt = prompts::render(prompts::IMPROVE_NOTE, &[("note", note)]);
        self.converse(&[PromptPart::user(prompt)]).await
    }

    pub async fn flashcards(&self, interests: &[String]) -> Result<Vec<Flashcard>> {
        self.flashcards_for_profile(&profile(interests)).await
    }

    pub async fn flashcards_for_profile(&self, user: &UserProfile) -> Result<Vec<Flashcard>> {
        let raw = self.generator.generate(&[flashcards_prompt(user)?]).await?;
        Ok(normalize::decode_flashcards(&normalize::clean(Some(&raw))))
    }

    /// Like [`flashcards_for_profile`](Self::flashcards_for_profile), with
    /// request failures turned into a single `Error` card.
    pub async fn flashcards_or_error_card(&self, user: &UserProfile) -> Vec<Flashcard> {
        match self.flashcards_for_profile(user).await {
            Ok(cards) => cards,
            Err(e) => {
                tracing::error!("Flashcards load error: {}", e);
                vec![Flashcard::error(e.to_string())]
            }
        }
    }

    pub async fn quiz(&self, topics: &[String], count: usize) -> Result<Vec<QuizQuestion>> {
        self.quiz_for_profile(&profile(topics), count).await
    }

    pub async fn quiz_for_profile(
        &self,
        user: &UserProfile,
        count: usize,
    ) -> Result<Vec<QuizQuestion>> {
        info!("Generating {} questions for topics: {:?}", count, user.interests);
        let raw = self.generator.generate(&[quiz_prompt(user, count)?]).await?;
        Ok(normalize::decode_quiz(&normalize::clean(Some(&raw))))
    }

    pub fn spawn_chat_reply(
        &self,
        message: String,
        system_prompt: Option<String>,
        token: CancelToken,
    ) -> RequestHandle<String> {
        let this = self.clone();
        RequestHandle::spawn(token, async move {
            this.chat_reply(&message, system_prompt.as_deref()).await
        })
    }

    pub fn spawn_summarize_document(
        &self,
        document: Document,
        token: CancelToken,
    ) -> RequestHandle<String> {
        let this = self.clone();
        RequestHandle::spawn(token, async move { this.summarize_document(&document).await })
    }

    pub fn spawn_flashcards(
        &self,
        interests: Vec<String>,
        token: CancelToken,
    ) -> RequestHandle<StructuredResult> {
        let user = UserProfile { interests };
        self.spawn_structured(StructuredKind::Flashcards, flashcards_prompt(&user), token)
    }

    pub fn spawn_quiz(
        &self,
        topics: Vec<String>,
        count: usize,
        token: CancelToken,
    ) -> RequestHandle<StructuredResult> {
        let user = UserProfile { interests: topics };
        self.spawn_structured(StructuredKind::Quiz, quiz_prompt(&user, count), token)
    }

    fn spawn_structured(
        &self,
        kind: StructuredKind,
        prompt: Result<PromptPart>,
        token: CancelToken,
    ) -> RequestHandle<StructuredResult> {
        let generator = Arc::clone(&self.generator);
        let decode_token = token.clone();
        RequestHandle::spawn(token, async move {
            let raw = generator.generate(&[prompt?]).await?;
            normalize::decode_unless_cancelled(&decode_token, kind, &raw).ok_or(Error::Cancelled)
        })
    }
}

fn chat_parts(message: &str, system_prompt: Option<&str>) -> Vec<PromptPart> {
    let mut parts = Vec::with_capacity(2);
    if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
        parts.push(PromptPart::user(prompts::render(
            prompts::CHAT_INSTRUCTION,
            &[("system", system)],
        )));
    }
    parts.push(PromptPart::user(message));
    parts
}

fn profile(interests: &[String]) -> UserProfile {
    UserProfile {
        interests: interests.to_vec(),
    }
}

fn flashcards_prompt(user: &UserProfile) -> Result<PromptPart> {
    if !user.has_interests() {
        return Err(Error::MissingInterests);
    }
    let text = prompts::render(prompts::FLASHCARDS, &[("interests", &user.interests_text())]);
    Ok(PromptPart::user(text))
}

fn quiz_prompt(user: &UserProfile, count: usize) -> Result<PromptPart> {
    if !user.has_interests() {
        return Err(Error::MissingInterests);
    }
    let text = prompts::render(
        prompts::QUIZ,
        &[("count", &count.to_string()), ("topics", &user.interests_text())],
    );
    Ok(PromptPart::user(text))
}
