//! Interactive terminal client.

use std::time::{Duration, Instant};

use kizuna_server::infrastructure::dto::websocket::ClientEvent;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    command::{Command, HELP},
    connection::Connection,
    error::ClientError,
    history::HistoryClient,
    reconcile::DEFAULT_SEND_TIMEOUT,
    render::{entry_line, notice_line},
    session::{ChatSession, Effects},
};

const TICK: Duration = Duration::from_millis(250);
const PROMPT: &str = "> ";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint, without the `userId` query
    pub url: String,
    pub user_id: String,
    pub send_timeout: Duration,
    pub api_url: Option<String>,
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_id: user_id.into(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
            api_url: None,
            token: None,
        }
    }

    fn history_client(&self) -> Option<HistoryClient> {
        match (&self.api_url, &self.token) {
            (Some(api_url), Some(token)) => Some(HistoryClient::new(api_url, token)),
            _ => None,
        }
    }
}

enum Input {
    Line(String),
    Eof,
    Failed(ReadlineError),
}

/// Read lines on a blocking thread and forward them to the event loop.
fn spawn_reader(tx: mpsc::UnboundedSender<Input>) {
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = tx.send(Input::Failed(e));
                return;
            }
        };
        loop {
            let input = match editor.readline(PROMPT) {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    Input::Line(line)
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => Input::Eof,
                Err(e) => Input::Failed(e),
            };
            let last = !matches!(input, Input::Line(_));
            if tx.send(input).is_err() || last {
                break;
            }
        }
    });
}

fn print_effects(
    connection: &Connection,
    session: &ChatSession,
    effects: Effects,
) -> Result<(), ClientError> {
    for notice in &effects.notices {
        println!("{}", notice_line(notice, session.me()));
    }
    connection.send_all(effects.outgoing)
}

pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let mut connection = Connection::open(&config.url, &config.user_id).await?;
    let mut session = ChatSession::new(config.user_id.clone(), config.send_timeout);
    let history = config.history_client();
    tracing::info!(user_id = %config.user_id, url = %config.url, "connected");
    println!("connected as {}. /help for commands", config.user_id);

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    spawn_reader(input_tx);
    let mut ticker = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            input = input_rx.recv() => {
                let line = match input {
                    Some(Input::Line(line)) => line,
                    Some(Input::Failed(e)) => return Err(e.into()),
                    Some(Input::Eof) | None => {
                        connection.send(session.go_offline())?;
                        break;
                    }
                };
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                if command == Command::Quit {
                    connection.send(session.go_offline())?;
                    break;
                }
                handle_command(command, &mut session, &connection, history.as_ref()).await?;
            }
            event = connection.recv() => {
                let Some(event) = event else {
                    println!("connection closed by server");
                    return Err(ClientError::Closed);
                };
                let effects = session.apply(event, Instant::now());
                print_effects(&connection, &session, effects)?;
            }
            _ = ticker.tick() => {
                let effects = session.tick(Instant::now());
                print_effects(&connection, &session, effects)?;
            }
        }
    }

    connection.close().await;
    Ok(())
}

async fn handle_command(
    command: Command,
    session: &mut ChatSession,
    connection: &Connection,
    history: Option<&HistoryClient>,
) -> Result<(), ClientError> {
    match command {
        Command::Say(text) => match session.send(&text, Instant::now()) {
            Ok(outgoing) => connection.send_all(outgoing)?,
            Err(e) => println!("! {e}"),
        },
        Command::Chat(peer) => {
            let outgoing = session.open_chat(&peer);
            connection.send_all(outgoing)?;
            let status = if session.is_online(&peer) { "online" } else { "offline" };
            println!("* chatting with {peer} ({status})");
        }
        Command::Leave => connection.send_all(session.close_chat())?,
        Command::Online => connection.send(ClientEvent::GetOnlineUsers)?,
        Command::Read(id) => connection.send(session.mark_read(&id))?,
        Command::Typing => {
            if let Some(event) = session.keystroke(Instant::now()) {
                connection.send(event)?;
            }
        }
        Command::History => {
            let Some(peer) = session.active_peer().map(str::to_string) else {
                println!("! {}", ClientError::NoActiveChat);
                return Ok(());
            };
            let Some(history) = history else {
                println!("! {}", ClientError::HistoryUnavailable);
                return Ok(());
            };
            match history.fetch(&peer).await {
                Ok(messages) => {
                    let added = session.merge_history(&messages);
                    println!("* {added} new message(s) from history");
                    show(session);
                }
                Err(e) => println!("! {e}"),
            }
        }
        Command::Show => show(session),
        Command::Help => println!("{HELP}"),
        Command::Invalid(message) => println!("! {message}"),
        Command::Quit => {}
    }
    Ok(())
}

fn show(session: &ChatSession) {
    let Some(peer) = session.active_peer() else {
        println!("! {}", ClientError::NoActiveChat);
        return;
    };
    for entry in session.ledger().timeline(peer) {
        println!("{}", entry_line(entry, session.me()));
    }
    if session.is_typing(peer, Instant::now()) {
        println!("* {peer} is typing...");
    }
}
