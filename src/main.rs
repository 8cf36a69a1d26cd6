// src/main.rs
//! MVM bridge wallet CLI entry point.
use anyhow::{Context, Result};
use clap::Parser;
use mvm_bridge_wallet::cli::{Cli, Commands};
use mvm_bridge_wallet::core::config::BridgeConfig;
use mvm_bridge_wallet::core::domain::{RegisteredUser, SwapOrder};
use mvm_bridge_wallet::service::BridgeService;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;
    info!("Starting MVM bridge wallet v{}", env!("CARGO_PKG_VERSION"));

    let config = BridgeConfig::from_env()?;
    let private_key = std::env::var("BRIDGE_PRIVATE_KEY")
        .context("BRIDGE_PRIVATE_KEY must be set to a hex private key")?;
    let service = BridgeService::from_config(config, &private_key)?;

    if let Some(user) = user_from_env() {
        info!(user_id = %user.user_id, "Signed in from environment");
        service.sign_in(user);
    }

    match cli.command {
        Commands::Balance { account, network, contract } => {
            let balance = service.balance(&account, network, contract.as_deref()).await?;
            println!("{}", balance);
        }
        Commands::Assets => {
            service.ledger().update_assets().await?;
            for asset in service.ledger().assets().get() {
                let balance = asset.balance.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<8} {:>24} {:?} {}",
                    asset.symbol,
                    balance,
                    service.deposit_mode(&asset),
                    asset.asset_id
                );
            }
            print_totals(&service);
        }
        Commands::Fee { asset, destination } => {
            service.ledger().update_assets().await?;
            let asset = service
                .ledger()
                .get_asset(&asset)
                .with_context(|| format!("Unknown asset {}", asset))?;
            let fee = service.fee_quote(&asset, &destination).value().await?;
            println!("{} {}", fee, asset.symbol);
        }
        Commands::Deposit { asset, amount } => {
            service.ledger().update_assets().await?;
            let tx_hash = service.deposit(&asset, &amount).await?;
            println!("{:?}", tx_hash);
        }
        Commands::Withdraw { asset, amount, destination, tag, fee } => {
            service.ledger().update_assets().await?;
            let receipt =
                service.withdraw(&asset, &amount, &destination, &tag, fee.as_deref()).await?;
            println!("trace {}", receipt.trace_id);
            println!("asset {:?}", receipt.asset_tx);
            println!("fee   {:?}", receipt.fee_tx);
        }
        Commands::Swap { pay_asset, fill_asset, funds, routes, min_received } => {
            service.ledger().update_assets().await?;
            let order = SwapOrder {
                pay_asset_id: pay_asset,
                fill_asset_id: fill_asset,
                funds,
                amount: String::new(),
                routes,
            };
            let receipt = service.swap(&order, &min_received).await?;
            println!("trace {} code {} tx {:?}", receipt.trace_id, receipt.code, receipt.tx_hash);
        }
        Commands::Watch => {
            let mut assets = service.ledger().assets().subscribe();
            service.ledger().update_assets().await?;
            print_totals(&service);
            loop {
                tokio::select! {
                    changed = assets.changed() => {
                        changed?;
                        print_totals(&service);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, stopping watch");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_totals(service: &BridgeService) {
    let render = |v: Option<rust_decimal::Decimal>| v.map(|d| d.normalize().to_string()).unwrap_or_else(|| "-".into());
    println!(
        "total: {} USD / {} BTC",
        render(service.ledger().total_balance_usd()),
        render(service.ledger().total_balance_btc())
    );
}

/// `BRIDGE_USER_ID`, `BRIDGE_USER_CONTRACT` and `BRIDGE_ACCESS_TOKEN`.
fn user_from_env() -> Option<RegisteredUser> {
    let user_id = std::env::var("BRIDGE_USER_ID").ok()?;
    let contract = std::env::var("BRIDGE_USER_CONTRACT").ok()?;
    Some(RegisteredUser {
        user_id,
        contract,
        access_token: std::env::var("BRIDGE_ACCESS_TOKEN").ok(),
    })
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
