use anyhow::Result;
use clap::Parser;
use gas_report::{generate_report, node::HttpNode};

use crate::cli::AppArgs;

mod cli;

/// Create a gas report.
///
/// Walks every block of the chain from block 1 to the current height and writes
/// one CSV row per transaction with its receipt fields, whether it deployed or
/// called a contract, and for calls to known contracts the decoded function and
/// arguments.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = AppArgs::parse();
    let node = HttpNode::from_url(args.node.clone());
    generate_report(&node, &args.report_config()).await?;
    Ok(())
}
