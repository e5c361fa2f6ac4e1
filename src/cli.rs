//! For Command Line Interface for gas_report

use std::path::PathBuf;

use clap::Parser;
use gas_report::{registry::KNOWN_CONTRACTS, ReportConfig};
use url::Url;

pub const LOCALHOST: &str = "http://127.0.0.1:8545/";

/// Write the gas used by every transaction on a development chain to a CSV file.
///
/// Calls to known contracts are decoded into function name and arguments using the
/// ABIs in the deployment artifacts.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct AppArgs {
    /// Url of node for eth_getBlockByNumber, eth_getTransactionReceipt and
    /// eth_getTransactionByHash requests
    #[clap(short, long, default_value_t = Url::parse(LOCALHOST).expect("Couldn't read node"))]
    pub node: Url,
    /// Directory with <ContractName>.json deployment artifacts
    #[clap(short, long, default_value = "build/contracts")]
    pub artifacts: PathBuf,
    /// Network id of deployments to use (defaults to net_version of the node)
    #[clap(long)]
    pub network_id: Option<String>,
    /// File to create (an existing file is replaced)
    #[clap(short, long, default_value = "report.csv")]
    pub output: PathBuf,
    /// Contract to register, may be repeated (defaults to the project contracts)
    #[clap(long = "contract")]
    pub contracts: Vec<String>,
    /// Number of blocks to fetch at once
    #[clap(short, long, default_value_t = 1)]
    pub concurrency: usize,
    /// Fail on deploys of unknown contracts and on calldata that does not match the ABI
    #[clap(long)]
    pub strict: bool,
}

impl AppArgs {
    pub fn report_config(&self) -> ReportConfig {
        let contracts = if self.contracts.is_empty() {
            KNOWN_CONTRACTS.iter().map(|name| name.to_string()).collect()
        } else {
            self.contracts.clone()
        };
        ReportConfig {
            artifacts_dir: self.artifacts.clone(),
            contracts,
            network_id: self.network_id.clone(),
            output: self.output.clone(),
            concurrency: self.concurrency,
            strict: self.strict,
        }
    }
}
