//! The `chat`, `agents` and `ask` commands.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

use parley_client::AgentClient;
use parley_session::{ChatSession, SessionError, TurnReport};
use parley_types::{AgentInfo, MemoryMode};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::commands::{Command, HELP, parse_line};
use crate::config::{DEFAULT_SECRETS_PATH, Secrets, Settings};
use crate::error::ParleyError;
use crate::terminal::TerminalPresenter;

/// How the commands talk to the terminal.
#[derive(Debug, Clone, Copy)]
pub struct TermOptions {
    /// Draw the streaming cursor.
    pub cursor: bool,
    /// Ctrl-C cancels the running turn, or quits the chat between turns.
    pub interrupts: bool,
}

/// Resolve settings for `cli` from the secrets file, the process
/// environment and the flags.
pub fn load_settings(cli: &Cli) -> Result<Settings, ParleyError> {
    let (path, required) = match &cli.secrets {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_SECRETS_PATH), false),
    };
    let secrets = Secrets::from_path(&path, required)?;
    Ok(Settings::resolve(&secrets, |key| std::env::var(key).ok(), &cli.overrides)?)
}

/// Build the API client. An API key is required.
pub fn build_client(settings: &Settings) -> Result<AgentClient, ParleyError> {
    let api_key = settings.api_key.as_deref().ok_or_else(|| {
        ParleyError::Usage(
            "missing API key: pass --api-key, set PARLEY_API_KEY \
             or add codegpt_api_key to the secrets file"
                .to_string(),
        )
    })?;
    Ok(AgentClient::new(api_key).base_url(settings.base_url.as_str()))
}

/// Print the agent list, one `id  name` per line.
pub async fn agents<W: Write>(client: &AgentClient, out: &mut W) -> Result<(), ParleyError> {
    let agents = client.list_agents().await?;
    if agents.is_empty() {
        writeln!(out, "no agents available")?;
    }
    for agent in &agents {
        writeln!(out, "{}  {}", agent.id, agent.name)?;
    }
    Ok(())
}

/// Run a single turn and leave the reply on `out`.
pub async fn ask<W: Write>(
    client: AgentClient,
    settings: &Settings,
    prompt: &str,
    out: W,
    options: TermOptions,
) -> Result<TurnReport, ParleyError> {
    let mut session = ChatSession::new(client, settings.session_config());
    let mut presenter = TerminalPresenter::new(out, options.cursor);
    Ok(run_turn(&mut session, prompt, &mut presenter, options).await?)
}

/// Interactive chat over `input` lines until EOF, `/quit` or Ctrl-C.
pub async fn chat<R, W>(
    client: AgentClient,
    settings: &Settings,
    input: R,
    out: W,
    options: TermOptions,
) -> Result<(), ParleyError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut session = ChatSession::new(client, settings.session_config());
    let mut presenter = TerminalPresenter::new(out, options.cursor);

    let agent_label = match session.config().agent_id.clone() {
        Some(id) => id,
        None => {
            let picked =
                pick_agent(session.transport(), &mut lines, presenter.get_mut(), options).await?;
            let Some(agent) = picked else {
                return Ok(());
            };
            session.set_agent(agent.id.clone());
            label(&agent)
        }
    };
    writeln!(presenter.get_mut(), "Chat with: {agent_label}")?;
    writeln!(presenter.get_mut(), "Type /help for commands.")?;

    loop {
        write!(presenter.get_mut(), "> ")?;
        presenter.get_mut().flush()?;
        let Some(line) = next_line(&mut lines, options).await? else {
            break;
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };
        match command {
            Command::Say(text) => {
                match run_turn(&mut session, &text, &mut presenter, options).await {
                    Ok(report) if report.cancelled => {
                        writeln!(presenter.get_mut(), "(interrupted)")?
                    }
                    Ok(_) => {}
                    Err(SessionError::NoAgent) => {
                        writeln!(presenter.get_mut(), "no agent selected; use /agent <id>")?
                    }
                    Err(SessionError::EmptyInput) => {}
                }
            }
            Command::History => {
                if session.history().is_empty() {
                    writeln!(presenter.get_mut(), "(no messages yet)")?;
                }
                for message in session.history() {
                    let (role, content) = (message.role(), message.content());
                    writeln!(presenter.get_mut(), "{role}: {content}")?;
                }
            }
            Command::Memory(enabled) => {
                session.set_memory_mode(MemoryMode::from_enabled(enabled));
                let state = if enabled { "on" } else { "off" };
                writeln!(presenter.get_mut(), "memory {state}")?;
            }
            Command::Agent(id) => {
                writeln!(presenter.get_mut(), "Chat with: {id}")?;
                session.set_agent(id);
            }
            Command::Agents => {
                let listed = or_interrupt(session.transport().list_agents(), options).await;
                let out = presenter.get_mut();
                match listed {
                    Some(Ok(list)) => {
                        for agent in &list {
                            writeln!(out, "{}  {}", agent.id, agent.name)?;
                        }
                    }
                    Some(Err(e)) => writeln!(out, "cannot list agents: {e}")?,
                    None => writeln!(out, "(interrupted)")?,
                }
            }
            Command::Help => writeln!(presenter.get_mut(), "{HELP}")?,
            Command::Quit => break,
            Command::Unknown(line) => {
                writeln!(presenter.get_mut(), "unknown command {line}; /help lists commands")?
            }
        }
    }
    tracing::info!(session = %session.id(), messages = session.history().len(), "chat ended");
    Ok(())
}

async fn run_turn<W: Write>(
    session: &mut ChatSession<AgentClient>,
    text: &str,
    presenter: &mut TerminalPresenter<W>,
    options: TermOptions,
) -> Result<TurnReport, SessionError> {
    let cancel = CancellationToken::new();
    let watcher = options.interrupts.then(|| cancel_on_ctrl_c(cancel.clone()));
    let result = session.send(text, presenter, cancel).await;
    if let Some(watcher) = watcher {
        watcher.abort();
    }
    result
}

fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received");
            cancel.cancel();
        }
    })
}

/// Next input line. `None` on EOF or, between turns, Ctrl-C.
async fn next_line<R: AsyncBufRead + Unpin>(
    lines: &mut Lines<R>,
    options: TermOptions,
) -> Result<Option<String>, ParleyError> {
    match or_interrupt(lines.next_line(), options).await {
        Some(line) => Ok(line?),
        None => Ok(None),
    }
}

/// Run `work` unless Ctrl-C arrives first. `None` when interrupted.
async fn or_interrupt<F: Future>(work: F, options: TermOptions) -> Option<F::Output> {
    if !options.interrupts {
        return Some(work.await);
    }
    first_of(work, async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler: never interrupt.
            std::future::pending::<()>().await;
        }
    })
    .await
}

async fn first_of<F: Future, I: Future>(work: F, interrupt: I) -> Option<F::Output> {
    tokio::select! {
        biased;
        out = work => Some(out),
        _ = interrupt => None,
    }
}

/// List the agents and let the user choose one by number or id.
async fn pick_agent<R, W>(
    client: &AgentClient,
    lines: &mut Lines<R>,
    out: &mut W,
    options: TermOptions,
) -> Result<Option<AgentInfo>, ParleyError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let Some(agents) = or_interrupt(client.list_agents(), options).await else {
        return Ok(None);
    };
    let agents = agents?;
    if agents.is_empty() {
        return Err(ParleyError::Usage("no agents available for this API key".to_string()));
    }
    writeln!(out, "Available agents:")?;
    for (i, agent) in agents.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, label(agent))?;
    }

    loop {
        write!(out, "Select an agent: ")?;
        out.flush()?;
        let Some(line) = next_line(lines, options).await? else {
            return Ok(None);
        };
        let choice = line.trim();
        let picked = match choice.parse::<usize>() {
            Ok(n) if n >= 1 => agents.get(n - 1),
            _ => agents.iter().find(|a| a.id == choice),
        };
        match picked {
            Some(agent) => return Ok(Some(agent.clone())),
            None if choice.is_empty() => {}
            None => writeln!(out, "no agent {choice:?}")?,
        }
    }
}

fn label(agent: &AgentInfo) -> String {
    if agent.name.is_empty() {
        agent.id.clone()
    } else {
        format!("{} ({})", agent.name, agent.id)
    }
}
