//! Culto CLI - checks against the Culto API and local portal helpers.
//!
//! # Usage
//!
//! ```bash
//! # List a customer's subscriptions, marking the current one
//! culto-cli subscriptions --email ana@example.com
//!
//! # List the price catalog
//! culto-cli prices
//!
//! # Apply a coupon by hand
//! culto-cli coupon --email ana@example.com --flow retention
//!
//! # Print a signed app-proxy URL for a local portal
//! culto-cli proxy-url --shop culto.myshopify.com --customer-id 1234
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};

use culto_portal_core::FlowType;

mod commands;

#[derive(Parser)]
#[command(name = "culto-cli")]
#[command(author, version, about = "Culto subscription portal tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a customer's subscriptions
    Subscriptions {
        /// Customer email address
        #[arg(short, long)]
        email: String,
    },
    /// List the Culto price catalog
    Prices,
    /// Apply the retention or reactivation coupon
    Coupon {
        /// Customer email address
        #[arg(short, long)]
        email: String,

        /// Coupon flow
        #[arg(short, long, value_enum)]
        flow: Flow,
    },
    /// Print a signed app-proxy URL for local testing
    ProxyUrl {
        /// Shop domain, e.g. `culto.myshopify.com`
        #[arg(short, long)]
        shop: String,

        /// Shopify customer id (numeric)
        #[arg(short, long)]
        customer_id: String,

        /// Portal base URL (defaults to `PORTAL_BASE_URL`)
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Flow {
    Retention,
    Reactivation,
}

impl From<Flow> for FlowType {
    fn from(flow: Flow) -> Self {
        match flow {
            Flow::Retention => Self::Retention,
            Flow::Reactivation => Self::Reactivation,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Subscriptions { email } => commands::culto::subscriptions(&email).await?,
        Commands::Prices => commands::culto::prices().await?,
        Commands::Coupon { email, flow } => {
            commands::culto::coupon(&email, flow.into()).await?;
        }
        Commands::ProxyUrl {
            shop,
            customer_id,
            base_url,
        } => commands::proxy::proxy_url(&shop, &customer_id, base_url.as_deref())?,
    }
    Ok(())
}
