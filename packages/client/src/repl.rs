//! Client runner: wiring plus the interactive loop.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use huddle_core::{
    ConversationSession, Dispatch, RandomPacing,
    domain::{ParticipantId, ParticipantRegistry},
    infrastructure::{GatewayConfig, HttpChatGateway},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    cli::Args,
    command::{Command, HELP},
    error::ClientError,
    render::Frontend,
    transcript::Transcript,
};

const PROMPT: &str = "> ";

/// Line-editor output forwarded to the async side
enum Input {
    Line(String),
    Closed,
}

/// Build a session from `args` and run it until the user quits, or until the
/// one-shot `--send` message has been fully answered.
pub async fn run(args: Args) -> Result<(), ClientError> {
    let gateway = HttpChatGateway::new(
        GatewayConfig::new(args.endpoint.clone()).with_timeout(args.timeout()),
    )
    .map_err(|e| ClientError::HttpClient(e.to_string()))?;
    tracing::info!("Using chat endpoint {}", gateway.endpoint());

    let session = ConversationSession::new(
        Arc::new(gateway),
        Arc::new(RandomPacing::new(args.pacing_config()?)),
        ParticipantRegistry::with_defaults(),
    );
    session.set_user(args.user_name.clone(), args.user_role.clone()).await;
    session.set_active(args.participant_ids()?).await?;

    let frontend = Frontend::attach(&session, std::io::stdout());
    let result = match &args.send {
        Some(text) => one_shot(&session, text).await,
        None => interactive(&session).await,
    };
    frontend.shutdown().await;

    if let Some(path) = &args.transcript {
        write_transcript(&session, path).await?;
    }
    result
}

async fn one_shot(session: &ConversationSession, text: &str) -> Result<(), ClientError> {
    let dispatch = session.send(text).await?;
    dispatch.join().await;
    Ok(())
}

async fn interactive(session: &ConversationSession) -> Result<(), ClientError> {
    print_active(session).await;
    println!("Type /help for commands.");

    let (tx, mut rx) = mpsc::channel::<Input>(8);
    let reader = tokio::task::spawn_blocking(move || read_lines(tx));

    let mut in_flight: Vec<Dispatch> = Vec::new();
    while let Some(input) = rx.recv().await {
        let line = match input {
            Input::Line(line) => line,
            Input::Closed => break,
        };
        in_flight.retain(|dispatch| !dispatch.is_finished());

        let Some(command) = Command::parse(&line) else {
            continue;
        };
        match command {
            Command::Send(text) => match session.send(&text).await {
                Ok(dispatch) => in_flight.push(dispatch),
                Err(e) => println!("{}", ClientError::from(e)),
            },
            Command::Who => print_roster(session).await,
            Command::Add(id) => match ParticipantId::try_from(id.as_str()) {
                Ok(id) => match session.select(id).await {
                    Ok(true) => print_active(session).await,
                    Ok(false) => println!("Already in the conversation."),
                    Err(e) => println!("{e}"),
                },
                Err(e) => println!("{}", ClientError::from(e)),
            },
            Command::Remove(id) => match ParticipantId::try_from(id.as_str()) {
                Ok(id) => {
                    if session.deselect(&id).await {
                        print_active(session).await;
                    } else {
                        println!("'{id}' is not in the conversation.");
                    }
                }
                Err(e) => println!("{}", ClientError::from(e)),
            },
            Command::Reset => {
                session.reset().await;
            }
            Command::Transcript(path) => {
                let path = path.unwrap_or_else(default_transcript_path);
                if let Err(e) = write_transcript(session, &path).await {
                    println!("{e}");
                } else {
                    println!("Transcript written to {}", path.display());
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Invalid(message) => println!("{message}"),
        }
    }

    for dispatch in &in_flight {
        dispatch.abort();
    }
    drop(rx);
    match reader.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Line reader task failed: {}", e);
            Ok(())
        }
    }
}

/// Blocking rustyline loop. Stops after `/quit`, Ctrl-C, Ctrl-D or once the
/// async side stops listening.
fn read_lines(tx: mpsc::Sender<Input>) -> Result<(), ClientError> {
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.as_str())?;
                }
                let quit = Command::parse(&line) == Some(Command::Quit);
                if tx.blocking_send(Input::Line(line)).is_err() || quit {
                    return Ok(());
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                let _ = tx.blocking_send(Input::Closed);
                return Ok(());
            }
            Err(e) => {
                let _ = tx.blocking_send(Input::Closed);
                return Err(e.into());
            }
        }
    }
}

async fn print_active(session: &ConversationSession) {
    let active = session.active().await;
    if active.is_empty() {
        println!("Nobody is in the conversation yet. Use /add <id>.");
        return;
    }
    let names: Vec<_> = active
        .ids()
        .iter()
        .filter_map(|id| session.participant(id))
        .map(|p| format!("{} {}", p.avatar, p.name))
        .collect();
    println!("Talking to: {}", names.join(", "));
}

async fn print_roster(session: &ConversationSession) {
    let active = session.active().await;
    for participant in session.registry().iter() {
        let marker = if active.contains(&participant.id) { '*' } else { ' ' };
        println!(
            "{marker} {:<8} {} {} ({})",
            participant.id.as_str(),
            participant.avatar,
            participant.name,
            participant.role
        );
    }
}

async fn write_transcript(session: &ConversationSession, path: &Path) -> Result<(), ClientError> {
    let transcript = Transcript::new(
        session.conversation_id().await,
        session.registry(),
        &session.messages().await,
    );
    transcript.write_to(path)
}

fn default_transcript_path() -> PathBuf {
    PathBuf::from(format!(
        "huddle-transcript-{}.json",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ))
}
