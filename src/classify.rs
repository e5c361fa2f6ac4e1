//! Turns an observed transaction into a report record.
use ethers::types::{H160, H256};
use log::warn;
use thiserror::Error;

use crate::{
    decoder::DecodeError,
    node::RpcError,
    registry::ContractRegistry,
    report::{CallType, ScanSummary, TransactionRecord},
    utils::hex_encode,
    walker::ObservedTransaction,
};

/// Contract name recorded when the contract is not in the registry.
pub const UNKNOWN_CONTRACT: &str = "UnknownContract";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("RPC error {0}")]
    RpcError(#[from] RpcError),
    #[error("Transaction {0:?} is a call but its body was not fetched")]
    MissingTransaction(H256),
    #[error("Contract deployed at {} is not a known contract", hex_encode(.0))]
    UnregisteredDeployment(H160),
    #[error("Calldata of transaction {hash:?} could not be decoded {source}")]
    Decode { hash: H256, source: DecodeError },
}

/// Classifies transactions as deploys or calls and decodes calls to known
/// contracts.
///
/// By default a deploy of an unknown contract and calldata that does not
/// match the ABI are logged and recorded with empty fields. In strict mode
/// both are errors.
pub struct Classifier<'a> {
    registry: &'a ContractRegistry,
    strict: bool,
}

impl<'a> Classifier<'a> {
    pub fn new(registry: &'a ContractRegistry) -> Self {
        Classifier {
            registry,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn classify(
        &self,
        observed: &ObservedTransaction,
        summary: &mut ScanSummary,
    ) -> Result<TransactionRecord, ClassifyError> {
        let receipt = &observed.receipt;
        let mut record = TransactionRecord::from_receipt(receipt)?;
        match record.call_type {
            CallType::Deploy => {
                summary.deployments += 1;
                let created = receipt.contract_address.unwrap_or_default();
                record.contract_name = match self.registry.get(&created) {
                    Some(entry) => entry.name.clone(),
                    None => {
                        if self.strict {
                            return Err(ClassifyError::UnregisteredDeployment(created));
                        }
                        warn!("unknown deployed contract:{}", hex_encode(created));
                        summary.unregistered_deployments.push(created);
                        UNKNOWN_CONTRACT.to_owned()
                    }
                };
            }
            CallType::Call => {
                summary.calls += 1;
                let Some(tx) = &observed.transaction else {
                    return Err(ClassifyError::MissingTransaction(observed.hash))
                };
                let target = tx.to.unwrap_or_default();
                let Some(entry) = tx.to.and_then(|to| self.registry.get(&to)) else {
                    warn!("unknown contract:{}", hex_encode(target));
                    summary.unknown_targets.push(target);
                    record.contract_name = UNKNOWN_CONTRACT.to_owned();
                    return Ok(record);
                };
                record.contract_name = entry.name.clone();
                // Plain value transfer, no function invoked.
                if tx.input.is_empty() {
                    return Ok(record);
                }
                match entry.decoder.decode(&tx.input) {
                    Ok(call) => record.set_call(call),
                    Err(source) if self.strict => {
                        return Err(ClassifyError::Decode {
                            hash: observed.hash,
                            source,
                        })
                    }
                    Err(e) => {
                        warn!(
                            "could not decode call to {} in transaction {}: {e}",
                            entry.name,
                            hex_encode(observed.hash)
                        );
                        summary.decode_failures.push(observed.hash);
                    }
                }
            }
        }
        Ok(record)
    }
}
