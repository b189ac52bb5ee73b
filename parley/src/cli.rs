//! Command-line parsing.

use std::path::PathBuf;

use crate::config::Overrides;
use crate::error::ParleyError;

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Interactive chat.
    Chat,
    /// Print the agent list.
    Agents,
    /// One turn; the prompt comes from `--prompt` or stdin.
    Ask {
        /// `--prompt` value.
        prompt: Option<String>,
    },
    /// Print usage.
    Help,
}

/// Parsed command line.
#[derive(Debug, Clone)]
pub struct Cli {
    /// Subcommand.
    pub mode: Mode,
    /// `--secrets PATH`. When given, the file must exist.
    pub secrets: Option<PathBuf>,
    /// Setting overrides from flags.
    pub overrides: Overrides,
}

/// Usage text.
pub const USAGE: &str = "\
parley [chat|agents|ask] [options]

  chat                 interactive chat (default)
  agents               list the agents available to the API key
  ask --prompt TEXT    one turn; reads stdin when --prompt is absent

options:
  --secrets PATH       secrets JSON (default .parley/secrets.json)
  --url URL            URL carrying codegpt_api_key / codegpt_agent_id
  --api-key KEY        API key
  --agent ID           agent to chat with
  --base-url URL       API base URL
  --no-memory          send only the latest message
  --pacing-ms N        delay between rendered fragments";

impl Cli {
    /// Parse arguments, program name excluded.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ParleyError> {
        let mut args: Vec<String> = args.into_iter().collect();
        let mut command = "chat".to_string();
        if let Some(first) = args.first().cloned() {
            if !first.starts_with('-') || first == "--help" || first == "-h" {
                args.remove(0);
                command = first;
            }
        }

        let mut secrets = None;
        let mut overrides = Overrides::default();
        let mut prompt = None;

        let mut remaining = args;
        while let Some(flag) = remaining.first().cloned() {
            remaining.remove(0);
            match flag.as_str() {
                "--secrets" => {
                    secrets = Some(PathBuf::from(take_arg("--secrets", &mut remaining)?))
                }
                "--url" => overrides.url = Some(take_arg("--url", &mut remaining)?),
                "--api-key" => overrides.api_key = Some(take_arg("--api-key", &mut remaining)?),
                "--agent" => overrides.agent_id = Some(take_arg("--agent", &mut remaining)?),
                "--base-url" => overrides.base_url = Some(take_arg("--base-url", &mut remaining)?),
                "--no-memory" => overrides.no_memory = true,
                "--pacing-ms" => {
                    let value = take_arg("--pacing-ms", &mut remaining)?;
                    let ms = value.parse().map_err(|_| {
                        ParleyError::Usage(format!("invalid value for --pacing-ms: {value}"))
                    })?;
                    overrides.pacing_ms = Some(ms);
                }
                "--prompt" if command == "ask" => {
                    prompt = Some(take_arg("--prompt", &mut remaining)?)
                }
                "--help" | "-h" => command = "--help".to_string(),
                other => return Err(ParleyError::Usage(format!("unknown flag: {other}"))),
            }
        }

        let mode = match command.as_str() {
            "chat" => Mode::Chat,
            "agents" => Mode::Agents,
            "ask" => Mode::Ask { prompt },
            "help" | "--help" | "-h" => Mode::Help,
            other => return Err(ParleyError::Usage(format!("unknown subcommand: {other}"))),
        };
        Ok(Self {
            mode,
            secrets,
            overrides,
        })
    }
}

fn take_arg(flag: &str, remaining: &mut Vec<String>) -> Result<String, ParleyError> {
    if remaining.is_empty() {
        return Err(ParleyError::Usage(format!("missing value for {flag}")));
    }
    Ok(remaining.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, ParleyError> {
        Cli::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn chat_is_the_default() {
        assert_eq!(parse(&[]).unwrap().mode, Mode::Chat);
        let cli = parse(&["--agent", "a1", "--no-memory"]).unwrap();
        assert_eq!(cli.mode, Mode::Chat);
        assert_eq!(cli.overrides.agent_id.as_deref(), Some("a1"));
        assert!(cli.overrides.no_memory);
    }

    #[test]
    fn subcommands_and_flags() {
        let cli = parse(&[
            "ask",
            "--prompt",
            "hi there",
            "--api-key",
            "k",
            "--pacing-ms",
            "0",
            "--secrets",
            "/tmp/s.json",
            "--url",
            "http://x/?codegpt_agent_id=a",
        ])
        .unwrap();
        assert_eq!(
            cli.mode,
            Mode::Ask {
                prompt: Some("hi there".into())
            }
        );
        assert_eq!(cli.overrides.api_key.as_deref(), Some("k"));
        assert_eq!(cli.overrides.pacing_ms, Some(0));
        assert_eq!(cli.secrets, Some(PathBuf::from("/tmp/s.json")));
        assert!(cli.overrides.url.is_some());

        assert_eq!(parse(&["agents"]).unwrap().mode, Mode::Agents);
        assert_eq!(parse(&["--help"]).unwrap().mode, Mode::Help);
        assert_eq!(parse(&["chat", "-h"]).unwrap().mode, Mode::Help);
    }

    #[test]
    fn usage_errors() {
        assert!(matches!(parse(&["bogus"]), Err(ParleyError::Usage(_))));
        assert!(matches!(parse(&["--agent"]), Err(ParleyError::Usage(_))));
        assert!(matches!(parse(&["--pacing-ms", "fast"]), Err(ParleyError::Usage(_))));
        assert!(matches!(parse(&["chat", "--prompt", "x"]), Err(ParleyError::Usage(_))));
    }
}
