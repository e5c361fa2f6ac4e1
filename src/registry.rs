//! Known contracts, keyed by the address they are deployed at.
use std::{collections::HashMap, fmt};

use ethers::types::H160;
use log::{debug, warn};

use crate::{
    artifacts::{ArtifactError, ArtifactStore, Deployment},
    decoder::{AbiDecoder, Decoder},
    utils::hex_encode,
};

/// Contracts deployed by the project migrations, in deployment order.
pub const KNOWN_CONTRACTS: [&str; 12] = [
    "Migrations",
    "IBCCommitment",
    "IBCMsgs",
    "IBCClient",
    "IBCConnection",
    "IBCChannel",
    "OwnableIBCHandler",
    "MockClient",
    "IBFT2Client",
    "SimpleToken",
    "ICS20Bank",
    "ICS20TransferBank",
];

pub struct ContractEntry {
    pub address: H160,
    pub name: String,
    pub decoder: Box<dyn Decoder>,
}

impl ContractEntry {
    pub fn new(address: H160, name: impl Into<String>, decoder: Box<dyn Decoder>) -> Self {
        ContractEntry {
            address,
            name: name.into(),
            decoder,
        }
    }
}

impl From<Deployment> for ContractEntry {
    fn from(deployment: Deployment) -> Self {
        let decoder = AbiDecoder::new(&deployment.abi);
        ContractEntry::new(deployment.address, deployment.name, Box::new(decoder))
    }
}

impl fmt::Debug for ContractEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractEntry")
            .field("address", &self.address)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Address -> contract map. Built once, then only read.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: HashMap<H160, ContractEntry>,
}

impl ContractRegistry {
    /// Creates a registry from entries. If two entries share an address the
    /// later one is kept.
    pub fn from_entries<I: IntoIterator<Item = ContractEntry>>(entries: I) -> Self {
        let mut contracts = HashMap::new();
        for entry in entries {
            if let Some(replaced) = contracts.insert(entry.address, entry) {
                warn!(
                    "contract {} replaced at {}",
                    replaced.name,
                    hex_encode(replaced.address)
                );
            }
        }
        ContractRegistry { contracts }
    }

    /// Resolves every named contract to its deployment on the network.
    ///
    /// Fails on the first contract that can not be resolved.
    pub fn build<S: AsRef<str>>(
        store: &ArtifactStore,
        names: &[S],
        network: &str,
    ) -> Result<Self, ArtifactError> {
        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let deployment = store.deployment(name.as_ref(), network)?;
            debug!(
                "{} deployed at {}",
                deployment.name,
                hex_encode(deployment.address)
            );
            entries.push(ContractEntry::from(deployment));
        }
        Ok(Self::from_entries(entries))
    }

    pub fn get(&self, address: &H160) -> Option<&ContractEntry> {
        self.contracts.get(address)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
