use std::io::{IsTerminal, Read};

use parley::ParleyError;
use parley::app::{self, TermOptions};
use parley::cli::{Cli, Mode, USAGE};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run_cli().await {
        eprintln!("parley error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), ParleyError> {
    let cli = Cli::parse(std::env::args().skip(1))?;
    if cli.mode == Mode::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let settings = app::load_settings(&cli)?;
    let client = app::build_client(&settings)?;
    let stdout = std::io::stdout();
    let options = TermOptions {
        cursor: stdout.is_terminal(),
        interrupts: true,
    };

    match cli.mode {
        Mode::Agents => app::agents(&client, &mut stdout.lock()).await,
        Mode::Ask { prompt } => {
            let prompt = match prompt {
                Some(text) => text,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            if prompt.trim().is_empty() {
                return Err(ParleyError::Usage(
                    "missing prompt: pass --prompt or pipe stdin".to_string(),
                ));
            }
            app::ask(client, &settings, &prompt, stdout, options).await?;
            Ok(())
        }
        Mode::Chat => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            app::chat(client, &settings, input, stdout, options).await
        }
        Mode::Help => Ok(()),
    }
}
