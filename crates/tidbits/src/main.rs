//! Tidbits CLI - daily email of three random tools, explained by an LLM.

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tidbits::config::{env_lookup, ENV_LLM_BIN, ENV_MODEL, ENV_TRANSPORT};
use tidbits::{
    build_transport, AppConfig, DeliveryConfig, Email, LlmCli, Publisher, RunMode, RunState,
    TransportKind,
};

/// Markdown body for `send-test`.
const TEST_EMAIL_MARKDOWN: &str = "\
Hi there,

## Tidbits test email

Your delivery settings work. Scheduled runs will land here.

Run `tidbits run --dry-run` to preview a generated email without sending it.

Cheers,
Tidbits
";

/// Tidbits CLI - pick three tools from a README list and email an explanation.
#[derive(Parser)]
#[command(name = "tidbits")]
#[command(about = "Daily tidbits from README-style tool lists")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one generate-and-deliver cycle (for cron / CronJob use)
    Run {
        /// Generate and print only; never deliver
        #[arg(long, env = "TIDBITS_DRY_RUN", value_parser = FalseyValueParser::new())]
        dry_run: bool,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the prompt for a fresh random draw without calling the model
    Prompt {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Deliver a fixed test email to verify transport credentials
    SendTest {
        /// Transport to test (defaults to TIDBITS_TRANSPORT or smtp)
        #[arg(long, value_enum)]
        transport: Option<TransportKind>,
    },
}

/// Command-line overrides for environment configuration.
#[derive(Args)]
pub struct Overrides {
    /// Delivery transport
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// Model identifier passed to the generation CLI
    #[arg(long)]
    model: Option<String>,

    /// Generation CLI program
    #[arg(long)]
    llm_bin: Option<String>,
}

impl Overrides {
    /// Layer the flags over `fallback`, so a flag wins before its
    /// environment variable is ever parsed.
    fn layered<'a, F>(&'a self, fallback: F) -> impl Fn(&str) -> Option<String> + 'a
    where
        F: Fn(&str) -> Option<String> + 'a,
    {
        move |key| {
            let flag = match key {
                ENV_TRANSPORT => self.transport.map(|t| t.as_str().to_string()),
                ENV_MODEL => self.model.clone(),
                ENV_LLM_BIN => self.llm_bin.clone(),
                _ => None,
            };
            flag.or_else(|| fallback(key))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("tidbits=debug,info")
    } else {
        EnvFilter::new("tidbits=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run { dry_run, overrides } => {
            let lookup = overrides.layered(env_lookup);
            let config = load_config(&lookup)?;
            run_cycle(&config, dry_run, &lookup).await
        }
        Commands::Prompt { overrides } => {
            let config = load_config(overrides.layered(env_lookup))?;
            run_prompt(&config)
        }
        Commands::SendTest { transport } => {
            let overrides = Overrides {
                transport,
                model: None,
                llm_bin: None,
            };
            let config = load_config(overrides.layered(env_lookup))?;
            run_send_test(config.transport).await
        }
    }
}

fn load_config<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    AppConfig::from_lookup(lookup).context("Failed to load configuration")
}

async fn run_cycle<F>(config: &AppConfig, dry_run: bool, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    tracing::info!(
        transport = %config.transport,
        model = %config.model,
        dry_run,
        "Starting tidbits run"
    );

    let backend = Arc::new(LlmCli::new(&config.llm_program, &config.model));
    let publisher = Publisher::for_run(config, dry_run, lookup, backend)
        .with_context(|| format!("Failed to prepare {} run", config.transport))?;
    let report = publisher.run().await.context("Tidbits run aborted")?;

    println!("📚 Source: {}", report.source);
    println!("🎲 Seed: {}", report.seed);

    if let Some(content) = &report.content {
        println!("\nGenerated email:\n");
        println!("{content}");
    }

    match report.state {
        RunState::Delivered => {
            println!("\n✅ Successfully sent today's tidbits!");
            Ok(())
        }
        RunState::Skipped => {
            println!("\n📭 Dry run, nothing sent");
            Ok(())
        }
        RunState::Failed(reason) => {
            eprintln!("\n❌ Run failed: {reason}");
            Err(anyhow::anyhow!("tidbits run failed: {reason}"))
        }
    }
}

fn run_prompt(config: &AppConfig) -> Result<()> {
    let publisher = Publisher::from_config(config, RunMode::Test)?;
    let (source, seed) = publisher.draw();
    let prompt = publisher.prompt_for(&source, &seed)?;

    println!("{prompt}");
    Ok(())
}

async fn run_send_test(kind: TransportKind) -> Result<()> {
    let delivery = DeliveryConfig::from_env(kind)
        .with_context(|| format!("Missing credentials for {kind} transport"))?;
    let transport = build_transport(&delivery)?;

    let email = Email::from_markdown("Tidbits - Test Email", TEST_EMAIL_MARKDOWN);
    let result = transport.deliver(&email).await?;

    if result.success {
        println!("✅ Test email delivered via {kind}");
        Ok(())
    } else {
        let detail = result.message.unwrap_or_default();
        eprintln!("❌ Test email failed via {kind}: {detail}");
        Err(anyhow::anyhow!("test delivery failed: {detail}"))
    }
}
