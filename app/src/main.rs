#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use duologue_config::{Config, LlmConfig, ProviderKind};
use duologue_conversation::{ConversationManager, DEFAULT_MAX_TURNS};
use duologue_providers::GeminiProvider;

#[derive(Parser)]
#[command(name = "duologue")]
#[command(about = "Scripted dialogues between two simulated personas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a dialogue between two configured agents
    Run {
        /// Path to the agent roster
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Name of the initiating agent
        #[arg(long, default_value = "Ptolmey")]
        initiator: String,

        /// Name of the recipient agent
        #[arg(long, default_value = "Aryabhata")]
        recipient: String,

        /// Opening message (defaults to the astronomer demo prompt)
        #[arg(short, long)]
        message: Option<String>,

        /// Maximum number of round trips
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: usize,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Write a starter config.yaml
    Init {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            initiator,
            recipient,
            message,
            max_turns,
            model,
        } => {
            let mut llm = LlmConfig::from_env(ProviderKind::Gemini)?;
            if let Some(model) = model {
                llm = llm.with_model(model);
            }

            let provider =
                Arc::new(GeminiProvider::new(llm.api_key.clone()).with_max_tokens(llm.max_tokens));

            let mut manager = ConversationManager::new(provider, &llm, &config)?;
            info!("Loaded agent roster from {}", config.display());

            let initial_message = message.unwrap_or_else(|| {
                format!("I'm Ptolemy. {recipient}, what's your most interesting discovery?")
            });

            let result = manager
                .initiate_conversation(&initiator, &recipient, &initial_message, max_turns)
                .await?;

            println!("Chat History:");
            for entry in &result.chat_history {
                println!("  [{}] {}", entry.name, entry.content);
            }
            println!("\nCost:");
            println!(
                "  {} call(s), {} prompt + {} completion = {} tokens",
                result.cost.calls,
                result.cost.prompt_tokens,
                result.cost.completion_tokens,
                result.cost.total_tokens
            );
            println!("\nSummary:");
            println!("  {}", result.summary);

            // The recipient asks about the last topic on record.
            if let Some(last_topic) = manager.get_last_topic(&recipient) {
                let question =
                    format!("What's the last topic we discussed? I recall: {last_topic}");
                if let (Some(sender), Some(target)) =
                    (manager.agent(&recipient).cloned(), manager.agent(&initiator))
                {
                    let reply = sender.send(&question, target).await?;
                    println!("\nFollow-up:");
                    println!("  [{}] {question}", sender.name());
                    println!("  [{}] {}", reply.name, reply.content);
                }
            }

            println!("\nTopic History:");
            for record in manager.topic_history() {
                println!(
                    "  {} -> {} at {}: {}",
                    record.initiator, record.recipient, record.timestamp, record.topic
                );
            }
        }
        Commands::Init { config } => {
            Config::create_starter(&config)?;
            println!("Created starter config at {}", config.display());
        }
        Commands::Version => {
            println!("duologue {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
