use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use chatchain::{
    load_transcript, render_transcript, save_transcript, AnthropicModel, ChatSessionConfig,
    ChatUseCase, InMemoryRetriever, LanguageModel, MockLanguageModel, Retriever,
};

mod cli;

use cli::Commands;

const DEFAULT_PROMPT: &str = "You are a helpful assistant. Answer the following question based on the \
provided context. If you don't know the answer, just say that you don't know. \
Don't make up an answer.";

#[derive(Parser)]
#[command(name = "chatchain")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer with a local echo model instead of calling an API
    #[arg(long, global = true)]
    mock_model: bool,

    /// Model name (overrides ANTHROPIC_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// API base URL (overrides ANTHROPIC_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Reply length cap (overrides ANTHROPIC_MAX_TOKENS)
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Prompt template; may use {{input}}, {{context}} and {{history}}
    #[arg(short, long, global = true, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// JSON transcript of [actor, text] pairs to continue from
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    /// Text file whose paragraphs are offered as retrieval context
    #[arg(long, global = true)]
    context: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let model: Arc<dyn LanguageModel> = if cli.mock_model {
        info!("Using mock language model");
        Arc::new(MockLanguageModel::new())
    } else {
        let mut model = AnthropicModel::from_env();
        if let Some(name) = &cli.model {
            model = model.with_model(name.clone());
        }
        if let Some(url) = &cli.base_url {
            model = model.with_base_url(url);
        }
        if let Some(max_tokens) = cli.max_tokens {
            model = model.with_max_tokens(max_tokens);
        }
        info!("Using model {} at {}", model.model_name(), model.endpoint());
        Arc::new(model)
    };

    let retriever: Option<Arc<dyn Retriever>> = match &cli.context {
        Some(path) => {
            let retriever = InMemoryRetriever::from_file(path)?;
            info!(
                "Loaded {} context documents from {}",
                retriever.len().await,
                path.display()
            );
            Some(Arc::new(retriever))
        }
        None => None,
    };

    let config = ChatSessionConfig::new(model, cli.prompt.as_str(), retriever)?;
    debug!("Session configuration: {:?}", config);
    let use_case = ChatUseCase::new(config);

    let mut history = match &cli.history {
        Some(path) if path.exists() => load_transcript(path)?,
        _ => Vec::new(),
    };

    match cli.command {
        Commands::Ask {
            message,
            stream,
            save,
        } => {
            let history_path = save_target(&cli.history, save)?;

            if stream {
                use_case
                    .stream_and_update_history(&message, &mut history, print_fragment)
                    .await?;
                println!();
            } else {
                let reply = use_case
                    .chat_and_update_history(&message, &mut history)
                    .await?;
                println!("{}", reply);
            }

            if let Some(path) = history_path {
                save_transcript(&path, &history)?;
            }
        }

        Commands::Repl { save } => {
            let history_path = save_target(&cli.history, save)?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            println!(
                "Chatting with {} previous messages. /history shows the transcript, /exit quits.",
                history.len()
            );
            loop {
                print!("> ");
                std::io::stdout().flush()?;

                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let input = line.trim();

                match input {
                    "" => continue,
                    "/exit" | "/quit" => break,
                    "/history" => {
                        if history.is_empty() {
                            println!("(empty)");
                        } else {
                            println!("{}", render_transcript(&history));
                        }
                        continue;
                    }
                    _ => {}
                }

                match use_case
                    .stream_and_update_history(input, &mut history, print_fragment)
                    .await
                {
                    Ok(_) => println!(),
                    Err(e) => {
                        println!();
                        eprintln!("Error: {}", e);
                    }
                }
            }

            if let Some(path) = history_path {
                save_transcript(&path, &history)?;
                info!("Saved {} messages to {}", history.len(), path.display());
            }
        }
    }

    Ok(())
}

fn print_fragment(fragment: &str) {
    if let Err(e) = write_fragment(&mut std::io::stdout().lock(), fragment) {
        debug!("Failed to write reply fragment to stdout: {}", e);
    }
}

fn write_fragment(out: &mut impl Write, fragment: &str) -> std::io::Result<()> {
    out.write_all(fragment.as_bytes())?;
    out.flush()
}

fn save_target(history: &Option<PathBuf>, save: bool) -> Result<Option<PathBuf>> {
    match (save, history) {
        (false, _) => Ok(None),
        (true, Some(path)) => Ok(Some(path.clone())),
        (true, None) => bail!("--save requires --history <FILE>"),
    }
}
