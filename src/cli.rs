use clap::{Parser, Subcommand};

use crate::core::domain::Network;

/// MVM bridge wallet CLI (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "bridge-cli", about = "MVM bridge wallet", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Native or token balance of an account
    Balance {
        #[arg(long)]
        account: String,
        #[arg(long, default_value = "mainnet")]
        network: Network,
        /// Token contract; omit for the native balance
        #[arg(long)]
        contract: Option<String>,
    },
    /// List the signed-in user's assets and totals
    Assets,
    /// Withdrawal fee quote for an asset
    Fee {
        #[arg(long)]
        asset: String,
        #[arg(long)]
        destination: String,
    },
    /// Deposit into the bridge from mainnet
    Deposit {
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: String,
    },
    /// Withdraw to the asset's home chain
    Withdraw {
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        destination: String,
        #[arg(long, default_value = "")]
        tag: String,
        /// Fee in native currency; quoted when omitted
        #[arg(long)]
        fee: Option<String>,
    },
    /// Settle a priced swap order
    Swap {
        #[arg(long = "pay-asset")]
        pay_asset: String,
        #[arg(long = "fill-asset")]
        fill_asset: String,
        #[arg(long)]
        funds: String,
        #[arg(long)]
        routes: String,
        #[arg(long = "min-received")]
        min_received: String,
    },
    /// Poll assets and print totals on every change
    Watch,
}
