//! Report records, the scan that accumulates them and the CSV writer.
use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use ethers::types::{TransactionReceipt, H160, H256, U256};
use futures::{pin_mut, TryStreamExt};
use log::info;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::{
    artifacts::{ArtifactError, ArtifactStore},
    classify::{ClassifyError, Classifier},
    decoder::DecodedCall,
    node::{ChainNode, RpcError},
    registry::ContractRegistry,
    walker::BlockWalker,
};

/// Columns of the report, in order.
pub const CSV_HEADER: [&str; 13] = [
    "blockHeight",
    "transactionIndex",
    "txHash",
    "status",
    "from",
    "to",
    "contractAddress",
    "gasUsed",
    "callType",
    "contractName",
    "functionName",
    "argNames",
    "args",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("RPC error {0}")]
    RpcError(#[from] RpcError),
    #[error("Artifact error {0}")]
    ArtifactError(#[from] ArtifactError),
    #[error("Classify error {0}")]
    ClassifyError(#[from] ClassifyError),
    #[error("CSV error {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error {0}")]
    IoError(#[from] io::Error),
    #[error("Report {filename} could not be created {source}")]
    FileCreator {
        source: io::Error,
        filename: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Deploy,
    Call,
}

impl CallType {
    /// A transaction is a deploy if its receipt has the address of a created
    /// contract.
    pub fn of_receipt(receipt: &TransactionReceipt) -> Self {
        match receipt.contract_address {
            Some(address) if !address.is_zero() => CallType::Deploy,
            _ => CallType::Call,
        }
    }
}

/// One row of the report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub block_height: u64,
    pub transaction_index: u64,
    pub tx_hash: H256,
    pub status: Option<bool>,
    pub from: H160,
    pub to: Option<H160>,
    pub contract_address: Option<H160>,
    pub gas_used: u64,
    pub call_type: CallType,
    pub contract_name: String,
    pub function_name: Option<String>,
    #[serde(serialize_with = "serialize_as_json")]
    pub arg_names: Option<Vec<String>>,
    #[serde(serialize_with = "serialize_as_json")]
    pub args: Option<Vec<Value>>,
}

impl TransactionRecord {
    /// Creates a record holding the receipt fields. Contract and call fields
    /// are empty.
    pub fn from_receipt(receipt: &TransactionReceipt) -> Result<Self, RpcError> {
        let hash = receipt.transaction_hash;
        let block_height = receipt
            .block_number
            .ok_or(RpcError::NoBlockNumber(hash))?
            .as_u64();
        let gas_used = receipt.gas_used.ok_or(RpcError::NoGasUsed(hash))?;
        if gas_used > U256::from(u64::MAX) {
            return Err(RpcError::GasOverflow(hash));
        }
        Ok(TransactionRecord {
            block_height,
            transaction_index: receipt.transaction_index.as_u64(),
            tx_hash: hash,
            status: receipt.status.map(|status| status.as_u64() == 1),
            from: receipt.from,
            to: receipt.to,
            contract_address: receipt.contract_address,
            gas_used: gas_used.as_u64(),
            call_type: CallType::of_receipt(receipt),
            contract_name: String::new(),
            function_name: None,
            arg_names: None,
            args: None,
        })
    }

    pub fn set_call(&mut self, call: DecodedCall) {
        self.function_name = Some(call.function_name);
        self.arg_names = Some(call.param_names);
        self.args = Some(call.args);
    }
}

/// Writes a list as a JSON string in a single CSV field.
fn serialize_as_json<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match value {
        Some(value) => {
            let json = serde_json::to_string(value).map_err(serde::ser::Error::custom)?;
            serializer.serialize_str(&json)
        }
        None => serializer.serialize_none(),
    }
}

/// Counts of what a scan saw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanSummary {
    /// Chain height at the start of the scan (blocks 1..=height were visited).
    pub height: u64,
    pub non_empty_blocks: u64,
    pub deployments: usize,
    pub calls: usize,
    /// Call targets not in the registry, one per transaction. Zero address for
    /// a call without recipient.
    pub unknown_targets: Vec<H160>,
    /// Created contracts not in the registry.
    pub unregistered_deployments: Vec<H160>,
    /// Transactions whose calldata could not be decoded.
    pub decode_failures: Vec<H256>,
}

impl ScanSummary {
    pub fn empty_blocks(&self) -> u64 {
        self.height - self.non_empty_blocks
    }

    pub fn transactions(&self) -> usize {
        self.deployments + self.calls
    }
}

/// Records in chain order, plus what was seen while collecting them.
#[derive(Clone, Debug, Default)]
pub struct Report {
    pub records: Vec<TransactionRecord>,
    pub summary: ScanSummary,
}

impl Report {
    /// Walks blocks `1..=height` and classifies every transaction.
    ///
    /// Stops at the first error.
    pub async fn collect<N: ChainNode>(
        walker: &BlockWalker<'_, N>,
        classifier: &Classifier<'_>,
        height: u64,
    ) -> Result<Self, ReportError> {
        let mut report = Report {
            records: vec![],
            summary: ScanSummary {
                height,
                ..Default::default()
            },
        };
        let blocks = walker.blocks(height);
        pin_mut!(blocks);
        while let Some(block) = blocks.try_next().await? {
            report.summary.non_empty_blocks += 1;
            for observed in &block.transactions {
                let record = classifier.classify(observed, &mut report.summary)?;
                report.records.push(record);
            }
        }
        Ok(report)
    }

    /// Writes the header row followed by one row per record.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(CSV_HEADER)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the report to a file, replacing any existing file.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        let filename = path.as_ref();
        let file = File::create(filename).map_err(|e| ReportError::FileCreator {
            source: e,
            filename: filename.to_path_buf(),
        })?;
        self.write_csv(file)
    }
}

/// Everything needed to produce a report.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    /// Directory holding `<ContractName>.json` deployment artifacts.
    pub artifacts_dir: PathBuf,
    pub contracts: Vec<String>,
    /// Network id deployments are looked up under. Asked from the node if absent.
    pub network_id: Option<String>,
    pub output: PathBuf,
    /// Blocks fetched at once.
    pub concurrency: usize,
    /// Whether unknown deploys and undecodable calls abort the report.
    pub strict: bool,
}

/// Builds the registry, scans the chain and writes the CSV report.
pub async fn generate_report<N: ChainNode>(
    node: &N,
    config: &ReportConfig,
) -> Result<ScanSummary, ReportError> {
    let height = node.block_number().await?;
    info!("chain height is {height}");

    let network = match &config.network_id {
        Some(id) => id.clone(),
        None => node.network_id().await?,
    };
    let store = ArtifactStore::new(&config.artifacts_dir);
    let registry = ContractRegistry::build(&store, &config.contracts, &network)?;
    info!(
        "{} contracts registered for network {network}",
        registry.len()
    );

    let walker = BlockWalker::new(node).with_concurrency(config.concurrency);
    let classifier = Classifier::new(&registry).strict(config.strict);
    let report = Report::collect(&walker, &classifier, height).await?;

    report.write_to_path(&config.output)?;
    let summary = report.summary;
    info!(
        "{} transactions from {} blocks ({} empty) written to {}",
        summary.transactions(),
        summary.height,
        summary.empty_blocks(),
        config.output.display()
    );
    if !summary.unknown_targets.is_empty() {
        info!(
            "{} calls to unknown contracts",
            summary.unknown_targets.len()
        );
    }
    if !summary.decode_failures.is_empty() {
        info!("{} calls could not be decoded", summary.decode_failures.len());
    }
    Ok(summary)
}
