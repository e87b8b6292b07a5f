//! Shopfront CLI - drive the basket and checkout from a terminal.
//!
//! Commands:
//! - `shopfront price` - Resolve a product's price right now
//! - `shopfront cart` - Add, update and inspect the basket
//! - `shopfront quote` - Price the basket for a zone and payment method
//! - `shopfront checkout` - Submit, retry or cancel a checkout
//! - `shopfront return` - Reconcile a payment gateway return
//! - `shopfront config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{CartArgs, CheckoutArgs, ConfigArgs, PriceArgs, QuoteArgs, ReturnArgs};

/// Shopfront CLI - basket and checkout for the storefront
#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the current price of a product
    Price(PriceArgs),

    /// Manage the basket
    Cart(CartArgs),

    /// Price the basket for checkout
    Quote(QuoteArgs),

    /// Place an order
    Checkout(CheckoutArgs),

    /// Reconcile a payment gateway return URL
    Return(ReturnArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Price(args) => commands::price::run(args, &ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Quote(args) => commands::quote::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Return(args) => commands::gateway_return::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean for command output.
///
/// `SHOPFRONT_LOG` overrides the level; `--json` switches to JSON lines.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SHOPFRONT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("failed to initialize logging: {e}");
    }
}
