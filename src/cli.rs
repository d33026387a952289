//! Terminal front end: stdin/stdout REPL over an `InterviewSession`.

use std::path::PathBuf;

use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::Result;
use crate::interview::prompts::{CONFIDENCE_QUESTION, IMPORTANCE_QUESTION};
use crate::interview::{GenerationOutcome, InterviewSession, TurnReport};

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A conversation turn.
    Say(String),
    /// `/key <secret>`
    SetKey(String),
    /// `/assess <importance> <confidence>`
    Assess { importance: u8, confidence: u8 },
    /// `/save`
    Save,
    /// `/new`
    NewConversation,
    /// `/stage`
    ShowStage,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
    /// A command that could not be parsed, with a usage hint.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();

        match lower.as_str() {
            "/save" => return Command::Save,
            "/new" | "/reset" => return Command::NewConversation,
            "/stage" | "/status" => return Command::ShowStage,
            "/help" | "/?" => return Command::Help,
            "/quit" | "/exit" => return Command::Quit,
            _ => {}
        }

        if lower == "/key" || lower.starts_with("/key ") {
            let key = trimmed[4..].trim();
            if key.is_empty() {
                return Command::Invalid("Usage: /key <api-key>".to_string());
            }
            return Command::SetKey(key.to_string());
        }

        if lower == "/assess" || lower.starts_with("/assess ") {
            return parse_assess(&trimmed[7..]);
        }

        if trimmed.starts_with('/') {
            return Command::Invalid(format!("Unknown command {trimmed}. Type /help."));
        }

        Command::Say(trimmed.to_string())
    }
}

fn parse_assess(args: &str) -> Command {
    let usage = || Command::Invalid("Usage: /assess <importance 0-10> <confidence 0-10>".to_string());
    let parts: Vec<&str> = args.split_whitespace().collect();
    let [importance, confidence] = parts.as_slice() else {
        return usage();
    };
    match (importance.parse::<u8>(), confidence.parse::<u8>()) {
        (Ok(importance), Ok(confidence)) if importance <= 10 && confidence <= 10 => {
            Command::Assess {
                importance,
                confidence,
            }
        }
        _ => usage(),
    }
}

const HELP: &str = "\
Commands:
  /key <api-key>                 set or replace the OpenAI API key
  /assess <importance> <conf>    rate importance and confidence (0-10)
  /stage                         show the current stage and target behavior
  /save                          export the conversation as JSON
  /new                           start a new conversation (discards history)
  /quit                          exit
Anything else is sent as a message.";

/// Interactive loop. Returns when stdin closes or the user quits.
pub async fn run(session: &InterviewSession, export_dir: PathBuf) -> Result<()> {
    if session.start().await {
        print_last_ai_message(session).await;
    } else if !session.has_credential() {
        eprintln!("No API key configured. Enter one with /key <api-key>.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            eprint!("> ");
            continue;
        }

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => eprintln!("{HELP}"),
            Command::Invalid(hint) => eprintln!("{hint}"),
            Command::SetKey(key) => {
                let was_empty = session.snapshot().await.messages.is_empty();
                if session.set_credential(SecretString::from(key)).await {
                    eprintln!("API key saved.");
                    if was_empty {
                        print_last_ai_message(session).await;
                    }
                } else {
                    eprintln!("Please enter a valid API key.");
                }
            }
            Command::Say(text) => {
                eprintln!("(thinking...)");
                match session.send_message(&text).await {
                    Ok(report) => render_turn(session, &report).await,
                    Err(e) => eprintln!("{e}"),
                }
            }
            Command::Assess {
                importance,
                confidence,
            } => match session.submit_assessment(importance, confidence).await {
                Ok(stage) => {
                    print_last_ai_message(session).await;
                    eprintln!("Stage: {stage}");
                }
                Err(e) => eprintln!("{e}"),
            },
            Command::ShowStage => {
                let state = session.snapshot().await;
                eprintln!("Stage: {}", state.current_stage);
                match state.target_behavior.as_deref() {
                    Some(target) => eprintln!("Target behavior: {target}"),
                    None => eprintln!("Target behavior: (not set yet)"),
                }
                if let Some(a) = state.assessment {
                    eprintln!("Importance {}/10, confidence {}/10", a.importance, a.confidence);
                }
            }
            Command::Save => match session.export().await.write_to_dir(&export_dir) {
                Ok(path) => eprintln!("Saved to {}", path.display()),
                Err(e) => eprintln!("{e}"),
            },
            Command::NewConversation => {
                session.reset().await;
                eprintln!("Started a new conversation.");
                if session.start().await {
                    print_last_ai_message(session).await;
                }
            }
        }
        eprint!("> ");
    }

    Ok(())
}

async fn render_turn(session: &InterviewSession, report: &TurnReport) {
    match &report.outcome {
        None => {}
        Some(GenerationOutcome::Reply(text)) => println!("\n{text}\n"),
        Some(outcome) => {
            if let Some(guidance) = outcome.guidance() {
                eprintln!("{guidance}");
            }
            if outcome.needs_credential() {
                eprintln!("Enter a key with /key <api-key>.");
            }
        }
    }

    if report.assessment_due {
        let target = session
            .snapshot()
            .await
            .target_behavior
            .clone()
            .unwrap_or_default();
        eprintln!("\nLet's check in on your readiness to change {target}.");
        eprintln!("  {IMPORTANCE_QUESTION}");
        eprintln!("  {CONFIDENCE_QUESTION}");
        eprintln!("Answer with /assess <importance> <confidence>, e.g. /assess 7 5\n");
    }
}

async fn print_last_ai_message(session: &InterviewSession) {
    let state = session.snapshot().await;
    if let Some(msg) = state.messages.iter().rev().find(|m| !m.is_from_user()) {
        println!("\n{}\n", msg.content);
    }
}
