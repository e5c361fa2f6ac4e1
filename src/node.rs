//! Access to a chain node over JSON-RPC.
use async_trait::async_trait;
use ethers::types::{Block, Transaction, TransactionReceipt, H256, U64};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::{ParseError, Url};

use crate::{
    rpc::{
        eth_block_number, get_block_by_number, get_transaction_by_hash, get_transaction_receipt,
        net_version, JsonRpcRequest, JsonRpcResponse,
    },
    utils::block_number_hex,
};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Reqwest error {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Url error {0}")]
    UrlError(#[from] ParseError),
    #[error("Node returned error {code} for {method}: {message}")]
    NodeError {
        method: String,
        code: i64,
        message: String,
    },
    #[error("Node returned no result for {method}")]
    MissingResult { method: String },
    #[error("Receipt for transaction {0:?} does not have a block number")]
    NoBlockNumber(H256),
    #[error("Receipt for transaction {0:?} does not have gas used")]
    NoGasUsed(H256),
    #[error("Gas used by transaction {0:?} does not fit in 64 bits")]
    GasOverflow(H256),
}

/// The node calls the report needs. Each call suspends the caller until the
/// node responds.
#[async_trait]
pub trait ChainNode: Send + Sync {
    /// Current chain height.
    async fn block_number(&self) -> Result<u64, RpcError>;
    /// Network id that deployments are recorded under.
    async fn network_id(&self) -> Result<String, RpcError>;
    /// Block at the given height, with transaction hashes only.
    async fn block_by_number(&self, number: u64) -> Result<Block<H256>, RpcError>;
    async fn transaction_receipt(&self, tx: H256) -> Result<TransactionReceipt, RpcError>;
    async fn transaction(&self, tx: H256) -> Result<Transaction, RpcError>;
}

/// A node reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpNode {
    client: Client,
    url: Url,
}

impl HttpNode {
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Ok(Self::from_url(Url::parse(url)?))
    }

    pub fn from_url(url: Url) -> Self {
        HttpNode {
            client: Client::new(),
            url,
        }
    }

    async fn request<T>(&self, request: JsonRpcRequest) -> Result<T, RpcError>
    where
        T: DeserializeOwned + Send,
    {
        let response: JsonRpcResponse<T> = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        unwrap_response(request.method(), response)
    }
}

fn unwrap_response<T>(method: &str, response: JsonRpcResponse<T>) -> Result<T, RpcError> {
    if let Some(error) = response.error {
        return Err(RpcError::NodeError {
            method: method.to_owned(),
            code: error.code,
            message: error.message,
        });
    }
    response.result.ok_or_else(|| RpcError::MissingResult {
        method: method.to_owned(),
    })
}

#[async_trait]
impl ChainNode for HttpNode {
    async fn block_number(&self) -> Result<u64, RpcError> {
        let height: U64 = self.request(eth_block_number()).await?;
        Ok(height.as_u64())
    }

    async fn network_id(&self) -> Result<String, RpcError> {
        self.request(net_version()).await
    }

    async fn block_by_number(&self, number: u64) -> Result<Block<H256>, RpcError> {
        self.request(get_block_by_number(&block_number_hex(number)))
            .await
    }

    async fn transaction_receipt(&self, tx: H256) -> Result<TransactionReceipt, RpcError> {
        self.request(get_transaction_receipt(&tx)).await
    }

    async fn transaction(&self, tx: H256) -> Result<Transaction, RpcError> {
        self.request(get_transaction_by_hash(&tx)).await
    }
}
