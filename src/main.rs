//! Chat assistant terminal front-end
//!
//! Reads messages from stdin, sends them through the session manager and
//! prints each reply segment as its own bubble.

use chat_assistant::failure::RecoveryAction;
use chat_assistant::session::{Rejection, SIMULATED_MODE_KEY};
use chat_assistant::{
    AssistantConfig, CanonicalResponse, ClientConfig, CtaItem, HttpDispatcher, JsonFileStore,
    KeyValueStore, LoggingDispatcher, MemoryStore, SendOutcome, SessionEvent, SessionManager,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Manager = SessionManager<LoggingDispatcher<HttpDispatcher>>;

const WAIT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ClientConfig::from_env();
    let ui = config
        .ui_config_path
        .as_deref()
        .map(AssistantConfig::load)
        .unwrap_or_default();

    let preferences: Arc<dyn KeyValueStore> = match &config.prefs_path {
        Some(path) => Arc::new(JsonFileStore::open(path)),
        None => Arc::new(MemoryStore::new()),
    };
    if config.simulated {
        preferences.set(SIMULATED_MODE_KEY, "true");
    }

    let dispatcher = LoggingDispatcher::new(HttpDispatcher::new(&config)?);
    let manager = SessionManager::new(dispatcher, preferences, Arc::new(MemoryStore::new()));

    tracing::info!(
        api_url = %config.api_url,
        session_id = %manager.session_id(),
        simulated = manager.is_simulated_mode(),
        "Chat client started"
    );

    spawn_typing_indicator(&manager);

    println!("== {} ==", ui.chat_header);
    for line in &ui.welcome_messages {
        println!("assistant> {line}");
    }
    println!("(type /help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        if !run_command(&manager, Command::parse(&line)).await {
            break;
        }
        prompt()?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chat_assistant=warn".into());
    let json = std::env::var("CHAT_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn prompt() -> std::io::Result<()> {
    print!("you> ");
    std::io::stdout().flush()
}

/// Print a typing hint whenever a reply is pending
fn spawn_typing_indicator(manager: &Manager) {
    let mut rx = manager.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SessionEvent::StateChange { busy: true }) => {
                    eprintln!("(assistant is typing...)");
                }
                Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Send(String),
    Clear,
    Info,
    Simulate(Option<bool>),
    Suggest(String),
    Action(usize),
    Feedback { rating: u8, comment: Option<String> },
    Help,
    Invalid(String),
    Quit,
}

impl Command {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };
        let (name, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, args)| (name, args.trim()));

        match name {
            "quit" | "exit" => Command::Quit,
            "clear" => Command::Clear,
            "info" => Command::Info,
            "help" => Command::Help,
            "simulate" => match args {
                "" => Command::Simulate(None),
                "on" => Command::Simulate(Some(true)),
                "off" => Command::Simulate(Some(false)),
                _ => Command::Invalid("usage: /simulate on|off".to_string()),
            },
            "suggest" => Command::Suggest(args.to_string()),
            "action" => args.parse().map_or_else(
                |_| Command::Invalid("usage: /action <number>".to_string()),
                Command::Action,
            ),
            "feedback" => {
                let (rating, comment) = args
                    .split_once(char::is_whitespace)
                    .map_or((args, None), |(r, c)| (r, Some(c.trim().to_string())));
                match rating.parse() {
                    Ok(rating) => Command::Feedback { rating, comment },
                    Err(_) => Command::Invalid("usage: /feedback <rating> [comment]".to_string()),
                }
            }
            other => Command::Invalid(format!("unknown command: /{other}")),
        }
    }
}

/// Run one command; returns false when the session should end.
async fn run_command(manager: &Manager, command: Command) -> bool {
    match command {
        Command::Quit => return false,
        Command::Send(text) => send(manager, &text).await,
        Command::Clear => {
            let outcome = manager.clear_session().await;
            match outcome.warning {
                Some(warning) => println!("(new session {}: {warning})", outcome.session_id),
                None => println!("(new session {})", outcome.session_id),
            }
        }
        Command::Info => {
            let info = manager.session_info().await;
            println!(
                "(session {}: {} messages, created {}{})",
                info.session_id,
                info.messages,
                info.created.to_rfc3339(),
                if info.remote { "" } else { ", local only" }
            );
        }
        Command::Simulate(Some(true)) => {
            manager.enable_simulated_mode();
            println!("(simulated replies enabled)");
        }
        Command::Simulate(Some(false)) => {
            manager.disable_simulated_mode();
            println!("(simulated replies disabled)");
        }
        Command::Simulate(None) => println!(
            "(simulated replies {})",
            if manager.is_simulated_mode() { "on" } else { "off" }
        ),
        Command::Suggest(partial) => {
            let suggestions = manager.completions(&partial).await;
            if suggestions.is_empty() {
                println!("(no suggestions)");
            }
            for suggestion in suggestions {
                println!("  ~ {suggestion}");
            }
        }
        Command::Action(index) => run_action(manager, index).await,
        Command::Feedback { rating, comment } => {
            let last_reply = manager.messages().into_iter().rev().find(|m| !m.is_from_user);
            match last_reply {
                Some(message) => match manager.submit_feedback(&message.id, rating, comment).await {
                    Ok(()) => println!("(thanks for the feedback)"),
                    Err(e) => println!("(feedback failed: {e})"),
                },
                None => println!("(nothing to rate yet)"),
            }
        }
        Command::Help => print_help(),
        Command::Invalid(message) => println!("({message})"),
    }
    true
}

async fn send(manager: &Manager, text: &str) {
    match manager.send_message(text).await {
        SendOutcome::Replied(response) => render_reply(&response),
        SendOutcome::Ignored(Rejection::Blank) => {}
        SendOutcome::Ignored(Rejection::Busy) => println!("(still waiting for the last reply)"),
    }
}

async fn run_action(manager: &Manager, index: usize) {
    let button: Option<CtaItem> = manager
        .last_reply()
        .and_then(|reply| index.checked_sub(1).and_then(|i| reply.buttons().nth(i).cloned()));
    let Some(button) = button else {
        println!("(no button {index} on the last reply)");
        return;
    };

    match RecoveryAction::from_token(&button.value) {
        Some(RecoveryAction::Retry) => resend_last(manager).await,
        Some(RecoveryAction::WaitRetry) => {
            println!("(waiting {}s before retrying)", WAIT_RETRY_DELAY.as_secs());
            tokio::time::sleep(WAIT_RETRY_DELAY).await;
            resend_last(manager).await;
        }
        Some(RecoveryAction::Refresh) => {
            let outcome = manager.clear_session().await;
            println!("(session refreshed: {})", outcome.session_id);
        }
        Some(RecoveryAction::Support) => {
            println!("(please contact support and mention session {})", manager.session_id());
        }
        None => match manager.submit_action(&button).await {
            Ok(_) => println!("(sent: {})", button.label),
            Err(e) => println!("(action failed: {e})"),
        },
    }
}

async fn resend_last(manager: &Manager) {
    let last = manager
        .messages()
        .into_iter()
        .rev()
        .find(|m| m.is_from_user)
        .map(|m| m.text);
    match last {
        Some(text) => send(manager, &text).await,
        None => println!("(nothing to retry)"),
    }
}

fn render_reply(response: &CanonicalResponse) {
    for segment in &response.segments {
        println!("assistant> {segment}");
    }
    for (i, button) in response.buttons().enumerate() {
        println!("  [{}] {}", i + 1, button.label);
    }
    for video in response.video_links() {
        println!("  > {}: {}", video.label, video.url);
    }
}

fn print_help() {
    println!(
        "  /clear                    start a new session\n\
         \x20 /info                     show session info\n\
         \x20 /simulate [on|off]        toggle simulated replies\n\
         \x20 /suggest <text>           auto-complete suggestions\n\
         \x20 /action <n>               press button n of the last reply\n\
         \x20 /feedback <rating> [text] rate the last reply\n\
         \x20 /quit                     exit"
    );
}
