use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use study_assistant::assistant::{StudyAssistant, DEFAULT_QUIZ_QUESTIONS};
use study_assistant::document::Document;
use study_assistant::models::{Config, StructuredResult, UserProfile};
use study_assistant::prompts;
use study_assistant::task::{CancelToken, RequestHandle};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "study-assistant")]
#[command(about = "Chat, summaries, flashcards and quizzes from Gemini")]
struct CliArgs {
    /// Gemini model ID, overriding GEMINI_MODEL.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Read configuration from this file instead of `.env`.
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the study assistant a question.
    Chat {
        message: String,
        /// Instruction sent ahead of the message.
        #[arg(long, default_value = prompts::CHAT_SYSTEM)]
        system: String,
        /// Send the message without any instruction.
        #[arg(long, conflicts_with = "system")]
        no_system: bool,
        /// Print the chat title and both messages as JSON.
        #[arg(long)]
        transcript: bool,
    },
    /// Reorganize a study note into bullet points and a summary.
    Notes { note: String },
    /// Summarize text into key points and study questions.
    Summarize { text: String },
    /// Summarize a document file.
    SummarizeDoc {
        path: PathBuf,
        /// Mime type of the file; detected when omitted.
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// Generate flashcards for a list of interests.
    Flashcards {
        #[arg(required = true)]
        interests: Vec<String>,
    },
    /// Generate a multiple-choice quiz for a list of topics.
    Quiz {
        #[arg(required = true)]
        topics: Vec<String>,
        #[arg(long, default_value_t = DEFAULT_QUIZ_QUESTIONS)]
        count: usize,
    },
}

fn load_config(args: &CliArgs) -> study_assistant::Result<Config> {
    let mut config = match &args.env_file {
        Some(path) => Config::from_env_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    Ok(config)
}

fn spawn_command(
    assistant: &StudyAssistant,
    command: Command,
    document: Option<Document>,
    token: CancelToken,
) -> RequestHandle<String> {
    let this = assistant.clone();
    match command {
        Command::Chat {
            message,
            system,
            no_system,
            transcript,
        } => {
            let system = (!no_system).then_some(system);
            if transcript {
                RequestHandle::spawn(token, async move {
                    let exchange = this.chat_exchange(&message, system.as_deref()).await;
                    render(&exchange)
                })
            } else {
                assistant.spawn_chat_reply(message, system, token)
            }
        }
        Command::Notes { note } => {
            RequestHandle::spawn(token, async move { this.improve_note(&note).await })
        }
        Command::Summarize { text } => {
            RequestHandle::spawn(token, async move { this.summarize(&text).await })
        }
        Command::SummarizeDoc { .. } => match document {
            Some(document) => assistant.spawn_summarize_document(document, token),
            None => RequestHandle::spawn(token, async {
                Err(study_assistant::Error::Config(
                    "No document loaded".to_string(),
                ))
            }),
        },
        Command::Flashcards { interests } => RequestHandle::spawn(token, async move {
            let cards = this
                .flashcards_or_error_card(&UserProfile { interests })
                .await;
            render(&StructuredResult::Flashcards(cards))
        }),
        Command::Quiz { topics, count } => {
            let handle = assistant.spawn_quiz(topics, count, token.clone());
            RequestHandle::spawn(token, async move { render(&handle.join().await?) })
        }
    }
}

fn render<T: serde::Serialize>(value: &T) -> study_assistant::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_assistant=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Using model {}", config.model);

    let document = match &args.command {
        Command::SummarizeDoc { path, mime_type } => {
            Some(Document::from_path(path, mime_type.as_deref()).await?)
        }
        _ => None,
    };

    let assistant = StudyAssistant::from_config(&config);
    let token = CancelToken::new();
    let handle = spawn_command(&assistant, args.command, document, token.clone());

    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            ctrl_c_token.cancel();
        }
    });

    match handle.join().await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(study_assistant::Error::Cancelled) => {
            std::process::exit(130);
        }
        Err(e) => {
            error!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}
