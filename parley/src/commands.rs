//! Lines typed at the chat prompt.

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the text to the agent.
    Say(String),
    /// Print the conversation so far.
    History,
    /// Turn memory on or off.
    Memory(bool),
    /// Switch to another agent.
    Agent(String),
    /// List available agents.
    Agents,
    /// Print the command list.
    Help,
    /// Leave the chat.
    Quit,
    /// A `/` command that is not recognized, or is missing its argument.
    Unknown(String),
}

/// Command list shown by `/help`.
pub const HELP: &str = "\
/history          show the conversation so far
/memory on|off    send the whole conversation or only the latest message
/agent <id>       chat with another agent
/agents           list available agents
/quit             leave";

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Say(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let command = match (name, arg) {
        ("history", "") => Command::History,
        ("memory", "on") => Command::Memory(true),
        ("memory", "off") => Command::Memory(false),
        ("agent", id) if !id.is_empty() => Command::Agent(id.to_string()),
        ("agents", "") => Command::Agents,
        ("help" | "?", "") => Command::Help,
        ("quit" | "exit" | "q", "") => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}
