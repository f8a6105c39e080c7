use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pixtrack::application::poller::{PollOutcome, TrackerConfig};
use pixtrack::application::tracker::PaymentTracker;
use pixtrack::domain::buyer::{BuyerIdentity, Delivery};
use pixtrack::domain::ports::PaymentBackendRef;
use pixtrack::infrastructure::http::{HttpBackendConfig, HttpPaymentBackend};
use pixtrack::infrastructure::simulated::{
    MerchantProfile, SimulatedPaymentBackend, SimulationConfig,
};
use pixtrack::interfaces::csv::cart_reader::CartReader;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "PIX checkout for the shop's cart", long_about = None)]
struct Cli {
    /// Cart CSV file with `product,qty` rows
    cart: PathBuf,

    /// Buyer full name
    #[arg(long)]
    name: String,

    /// Buyer email
    #[arg(long)]
    email: String,

    /// Buyer CPF, punctuation allowed
    #[arg(long)]
    tax_id: String,

    /// Delivery address (adds the delivery surcharge)
    #[arg(long, conflicts_with = "pickup", required_unless_present = "pickup")]
    address: Option<String>,

    /// Pick the order up at the shop instead of delivering it
    #[arg(long)]
    pickup: bool,

    /// Payment server URL. Without it payments are simulated.
    #[arg(long, env = "PIX_BACKEND_URL")]
    backend_url: Option<String>,

    /// Milliseconds between payment status checks
    #[arg(long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval_ms: u64,

    /// Milliseconds to wait after approval before confirming the order
    #[arg(long, default_value_t = 3000)]
    grace_ms: u64,

    /// Simulated backend: intent creation latency
    #[arg(long, default_value_t = 1500)]
    sim_delay_ms: u64,

    /// Simulated backend: time until an intent is approved
    #[arg(long, default_value_t = 5000)]
    sim_approval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let file = File::open(&cli.cart).into_diagnostic()?;
    let cart = CartReader::new(file).into_cart().into_diagnostic()?;

    let delivery = match cli.address {
        Some(address) if !cli.pickup => Delivery::Address(address),
        _ => Delivery::Pickup,
    };
    let amount = cart.charge_total(delivery.is_delivery()).into_diagnostic()?;

    let backend: PaymentBackendRef = if let Some(url) = cli.backend_url {
        info!(%url, "using payment server");
        Arc::new(HttpPaymentBackend::new(HttpBackendConfig::new(url)).into_diagnostic()?)
    } else {
        info!("no payment server configured, simulating payments");
        let config = SimulationConfig {
            creation_delay: Duration::from_millis(cli.sim_delay_ms),
            approval_after: Duration::from_millis(cli.sim_approval_ms),
            ..SimulationConfig::default()
        };
        Arc::new(SimulatedPaymentBackend::new(config, MerchantProfile::default()))
    };

    let tracker = PaymentTracker::new(
        backend,
        TrackerConfig {
            poll_interval: Duration::from_millis(cli.poll_interval_ms),
            grace_delay: Duration::from_millis(cli.grace_ms),
            ..TrackerConfig::default()
        },
    );

    let identity = BuyerIdentity {
        name: cli.name,
        email: cli.email,
        tax_id: cli.tax_id,
        delivery,
    };

    println!("Total: {}", amount);
    let intent = match tracker.create(amount.value(), &identity).await {
        Ok(intent) => intent,
        Err(e) => {
            eprintln!("Could not generate the PIX payment, please try again.");
            return Err(e).into_diagnostic();
        }
    };

    println!("Payment id: {}", intent.id);
    println!("PIX copy-paste code: {}", intent.payload.copy_paste_code);
    if let Some(url) = &intent.payload.receipt_url {
        println!("Receipt: {}", url);
    }
    println!("Waiting for payment...");

    tracker
        .poll_status(intent.id, || {
            println!("Payment confirmed! Your order is being prepared.");
        })
        .await
        .into_diagnostic()?;

    tokio::select! {
        outcome = tracker.wait(intent.id) => {
            if outcome != Some(PollOutcome::Reported) {
                eprintln!("Payment was not confirmed.");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracker.cancel(intent.id).await;
            eprintln!("Payment view closed.");
        }
    }

    Ok(())
}
