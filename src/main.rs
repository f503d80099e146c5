//! Terminal front end: runs an interview on stdin/stdout.
//!
//! Logs go to stderr so they never interleave with the conversation.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use interview_orchestrator::adapters::ai::{
    LlmDocumentGenerator, LlmFieldExtractor, LlmQuestionGenerator, LlmRoleClassifier,
    OpenAICompatibleProvider,
};
use interview_orchestrator::adapters::retrieval::KeywordContextRetriever;
use interview_orchestrator::adapters::schema::{builtin_schemas, FileSchemaLoader};
use interview_orchestrator::adapters::storage::{FileSessionRepository, InMemorySessionRepository};
use interview_orchestrator::application::{
    AbandonInterviewCommand, AbandonInterviewHandler, CompletionSummary, GenerateDocumentHandler,
    GenerateDocumentQuery, GetInterviewStatusHandler, GetInterviewStatusQuery,
    InterviewHandlerError, NextStep, ResumeInterviewCommand, ResumeInterviewHandler, SessionLocks,
    StartInterviewCommand, StartInterviewHandler, SubmitAnswerCommand, SubmitAnswerHandler,
};
use interview_orchestrator::config::{AppConfig, LogFormat, LoggingConfig, ValidationError};
use interview_orchestrator::domain::foundation::SessionId;
use interview_orchestrator::domain::interview::{
    render_progress, FieldExtractor, InterviewEngine, ProcessDocumenter, Question, RoleClassifier,
};
use interview_orchestrator::ports::{AIProvider, SessionRepository};

type BoxError = Box<dyn std::error::Error>;

#[derive(Parser)]
#[command(name = "interview-orchestrator")]
#[command(version, about = "Structured role interviews in the terminal")]
struct Cli {
    /// Ignore any configured API key: canned questions, fallback classification
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new interview (default)
    Start,
    /// Continue a stored interview
    Resume { session_id: SessionId },
    /// Print the status of a stored interview as JSON
    Status { session_id: SessionId },
    /// List stored interviews
    List,
    /// Delete a stored interview
    Abandon { session_id: SessionId },
    /// Write process documentation for a stored interview as markdown
    Document {
        session_id: SessionId,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

struct App {
    engine: Arc<InterviewEngine>,
    repository: Arc<dyn SessionRepository>,
    locks: Arc<SessionLocks>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let app = build(&config, cli.offline).await?;
    match cli.command.unwrap_or(Command::Start) {
        Command::Start => {
            println!("Antworten Sie frei; bei Auswahlfragen genügt die Nummer. /quit beendet.");
            let mut printer = LivePrinter::new(1);
            let mut on_delta = |delta: &str| printer.delta(delta);
            let started = StartInterviewHandler::new(app.engine.clone(), app.repository.clone())
                .handle_streaming(StartInterviewCommand::default(), &mut on_delta)
                .await?;
            if let Some(question) = &started.question {
                printer.finish(question);
            }
            run_interview(&app, started.session_id, 1, started.question).await?;
        }
        Command::Resume { session_id } => {
            let resumed = ResumeInterviewHandler::new(app.engine.clone(), app.repository.clone(), app.locks.clone())
                .handle(ResumeInterviewCommand { session_id })
                .await;
            let resumed = match resumed {
                Ok(resumed) => resumed,
                Err(InterviewHandlerError::SessionNotFound(_)) => {
                    eprintln!("Keine Sitzung {} gefunden.", session_id);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };
            let number = resumed.answered + 1;
            if let Some(question) = &resumed.question {
                print_question(number, question);
            }
            run_interview(&app, session_id, number, resumed.question).await?;
        }
        Command::Status { session_id } => {
            let status = GetInterviewStatusHandler::new(app.engine.clone(), app.repository.clone())
                .handle(GetInterviewStatusQuery { session_id })
                .await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::List => {
            for id in app.repository.list().await? {
                if let Some(session) = app.repository.load(id).await? {
                    let role = session.role().map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
                    println!("{}  {:<14} {:<10} {}", id, session.phase(), role, session.updated_at());
                }
            }
        }
        Command::Abandon { session_id } => {
            AbandonInterviewHandler::new(app.repository.clone(), app.locks.clone())
                .handle(AbandonInterviewCommand { session_id })
                .await?;
            println!("Sitzung {} gelöscht.", session_id);
        }
        Command::Document { session_id, output } => {
            let document = GenerateDocumentHandler::new(app.engine.clone(), app.repository.clone())
                .handle(GenerateDocumentQuery { session_id })
                .await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, format!("{}\n", document.content.trim_end())).await?;
                    println!("Dokumentation geschrieben: {}", path.display());
                }
                None => println!("{}", document.content.trim_end()),
            }
        }
    }
    Ok(())
}

fn init_tracing(config: &LoggingConfig) -> Result<(), ValidationError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_writer(std::io::stderr)
        .with_target(false);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

async fn build(config: &AppConfig, force_offline: bool) -> Result<App, BoxError> {
    let mut schemas = builtin_schemas()?;
    if let Some(dir) = &config.interview.schema_dir {
        FileSchemaLoader::new(dir).apply_to(&mut schemas).await?;
    }

    let mut engine =
        InterviewEngine::new(Arc::new(schemas)).with_config(config.interview.engine_config());

    match config.ai.provider_config().filter(|_| !force_offline) {
        Some(provider_config) => {
            let provider: Arc<dyn AIProvider> = Arc::new(OpenAICompatibleProvider::new(provider_config)?);
            let info = provider.provider_info();
            tracing::info!(provider = %info.name, model = %info.model, "using chat model");
            engine = engine
                .with_generator(Arc::new(LlmQuestionGenerator::new(provider.clone())))
                .with_classifier(RoleClassifier::new(Arc::new(LlmRoleClassifier::new(provider.clone()))))
                .with_extractor(FieldExtractor::new(Arc::new(LlmFieldExtractor::new(provider.clone()))))
                .with_documenter(ProcessDocumenter::new(Arc::new(LlmDocumentGenerator::new(provider))));
        }
        None => tracing::info!("offline mode: canned questions and fallback classification"),
    }

    if let Some(dir) = &config.interview.knowledge_dir {
        let mut retriever = KeywordContextRetriever::new();
        retriever.load_dir(dir).await?;
        engine = engine.with_retriever(Arc::new(retriever));
    }

    let repository: Arc<dyn SessionRepository> = match &config.storage.session_dir {
        Some(dir) => Arc::new(FileSessionRepository::new(dir)),
        None => Arc::new(InMemorySessionRepository::new()),
    };

    Ok(App {
        engine: Arc::new(engine),
        repository,
        locks: Arc::new(SessionLocks::new()),
    })
}

/// Reads answers until the interview completes or the user quits.
/// `first` has already been shown as question `number`.
async fn run_interview(
    app: &App,
    session_id: SessionId,
    mut number: usize,
    first: Option<Question>,
) -> Result<(), BoxError> {
    let submit = SubmitAnswerHandler::new(app.engine.clone(), app.repository.clone(), app.locks.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let Some(mut question) = first else {
        println!("Das Interview ist bereits abgeschlossen.");
        return Ok(());
    };

    loop {
        let Some(answer) = read_answer(&mut lines).await? else {
            println!("\nSitzung {} gespeichert.", session_id);
            return Ok(());
        };
        if answer == "/quit" {
            println!("Sitzung {} gespeichert.", session_id);
            return Ok(());
        }

        let mut printer = LivePrinter::new(number + 1);
        let mut on_delta = |delta: &str| printer.delta(delta);
        let result = submit
            .handle_streaming(
                SubmitAnswerCommand {
                    session_id,
                    question_id: question.id.clone(),
                    answer,
                },
                &mut on_delta,
            )
            .await;
        let result = match result {
            Ok(result) => result,
            Err(err) if err.is_client_error() => {
                eprintln!("{}", err);
                print_question(number, &question);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        match result.next {
            NextStep::Question(next) => {
                printer.finish(&next);
                question = next;
                number += 1;
            }
            NextStep::Complete(summary) => {
                print_summary(app, session_id, &summary);
                return Ok(());
            }
        }
    }
}

async fn read_answer(lines: &mut Lines<BufReader<Stdin>>) -> std::io::Result<Option<String>> {
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        match lines.next_line().await? {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => return Ok(Some(line.trim().to_string())),
            None => return Ok(None),
        }
    }
}

/// Echoes generated wording while it streams in.
struct LivePrinter {
    number: usize,
    shown: String,
}

impl LivePrinter {
    fn new(number: usize) -> Self {
        Self {
            number,
            shown: String::new(),
        }
    }

    fn delta(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        if self.shown.is_empty() {
            print!("\n[{}] ", self.number);
        }
        self.shown.push_str(delta);
        print!("{}", delta);
        // A failed flush only delays the echo.
        let _ = std::io::stdout().flush();
    }

    /// True when the stream already showed the final wording.
    fn showed(&self, question: &Question) -> bool {
        !self.shown.is_empty() && self.shown.trim() == question.text
    }

    /// Prints what the stream did not already show. The final wording can
    /// differ from the streamed text when generation fell back to canned text.
    fn finish(&self, question: &Question) {
        if self.showed(question) {
            println!();
            print_details(question);
        } else {
            print_question(self.number, question);
        }
    }
}

fn print_question(number: usize, question: &Question) {
    println!("\n[{}] {}", number, question.text);
    print_details(question);
}

fn print_details(question: &Question) {
    for (index, option) in question.options.iter().enumerate() {
        println!("    {}) {}", index + 1, option);
    }
    if let Some(hint) = &question.hint {
        println!("    ({})", hint);
    }
}

fn print_summary(app: &App, session_id: SessionId, summary: &CompletionSummary) {
    println!("\nVielen Dank, das Interview ist abgeschlossen.");
    if let Some(role) = summary.role {
        let note = if summary.role_low_confidence { " (unsicher)" } else { "" };
        println!("Rolle: {}{}", role, note);
        if let (Some(report), Ok(schema)) = (&summary.progress, app.engine.schemas().load(role)) {
            println!("{}", render_progress(report, &schema.role_name));
        }
    }
    println!("{} Antworten erfasst.", summary.answered);
    println!("Dokumentation: interview-orchestrator document {}", session_id);
}
