//! Deployment artifacts written by the contract build/migration tooling.
//!
//! Each contract has a `<dir>/<ContractName>.json` file holding its ABI and,
//! per network id, the address it was deployed at.
use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use ethers::{
    abi::Abi,
    types::H160,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Contract {name} has not been deployed to network {network}")]
    DeploymentNotFound { name: String, network: String },
    #[error("Artifact {filename} could not be opened {source}")]
    FileOpener {
        source: io::Error,
        filename: PathBuf,
    },
    #[error("Artifact {filename} could not be parsed {source}")]
    InvalidArtifact {
        source: serde_json::Error,
        filename: PathBuf,
    },
}

/// The parts of a compiled contract artifact used for reporting.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Abi,
    /// Map of network id -> deployment.
    #[serde(default)]
    pub networks: HashMap<String, NetworkDeployment>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NetworkDeployment {
    pub address: H160,
}

/// A contract resolved to its on-chain address.
#[derive(Clone, Debug)]
pub struct Deployment {
    pub name: String,
    pub address: H160,
    pub abi: Abi,
}

/// Directory of contract artifacts.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        ArtifactStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Reads the artifact for a contract.
    pub fn load(&self, name: &str) -> Result<ContractArtifact, ArtifactError> {
        let filename = self.artifact_path(name);
        let file = File::open(&filename).map_err(|e| ArtifactError::FileOpener {
            source: e,
            filename: filename.to_owned(),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| ArtifactError::InvalidArtifact {
            source: e,
            filename,
        })
    }

    /// Resolves the address a contract is deployed at on a network.
    ///
    /// A contract with no deployment on the network is an error: the report
    /// can not be produced without it.
    pub fn deployment(&self, name: &str, network: &str) -> Result<Deployment, ArtifactError> {
        let artifact = self.load(name)?;
        let Some(deployed) = artifact.networks.get(network) else {
            return Err(ArtifactError::DeploymentNotFound {
                name: name.to_owned(),
                network: network.to_owned(),
            })
        };
        Ok(Deployment {
            name: artifact.contract_name,
            address: deployed.address,
            abi: artifact.abi,
        })
    }
}
