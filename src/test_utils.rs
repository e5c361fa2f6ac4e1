//! In-memory chain and fixtures shared by unit tests.
use std::{collections::HashMap, fs, path::Path, sync::Mutex};

use async_trait::async_trait;
use ethers::{
    abi::Abi,
    types::{Block, Bytes, Transaction, TransactionReceipt, H160, H256, U256, U64},
};

use crate::{
    decoder::AbiDecoder,
    node::{ChainNode, RpcError},
    registry::{ContractEntry, ContractRegistry},
};

pub(crate) const SIMPLE_TOKEN_ABI: &str = r#"[
    {"inputs": [{"internalType": "uint256", "name": "initialSupply", "type": "uint256"}], "stateMutability": "nonpayable", "type": "constructor"},
    {"inputs": [{"internalType": "address", "name": "to", "type": "address"}, {"internalType": "uint256", "name": "amount", "type": "uint256"}], "name": "transfer", "outputs": [{"internalType": "bool", "name": "", "type": "bool"}], "stateMutability": "nonpayable", "type": "function"},
    {"inputs": [{"internalType": "address", "name": "spender", "type": "address"}, {"internalType": "uint256", "name": "amount", "type": "uint256"}], "name": "approve", "outputs": [{"internalType": "bool", "name": "", "type": "bool"}], "stateMutability": "nonpayable", "type": "function"},
    {"inputs": [{"internalType": "address", "name": "account", "type": "address"}], "name": "balanceOf", "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}], "stateMutability": "view", "type": "function"},
    {"anonymous": false, "inputs": [{"indexed": true, "internalType": "address", "name": "from", "type": "address"}, {"indexed": true, "internalType": "address", "name": "to", "type": "address"}, {"indexed": false, "internalType": "uint256", "name": "value", "type": "uint256"}], "name": "Transfer", "type": "event"}
]"#;

/// Address the SimpleToken fixture is registered at.
pub(crate) const TOKEN: H160 = H160([0xaa; 20]);

pub(crate) fn simple_token_abi() -> Abi {
    serde_json::from_str(SIMPLE_TOKEN_ABI).unwrap()
}

/// Registry holding only SimpleToken at [`TOKEN`].
pub(crate) fn token_registry() -> ContractRegistry {
    ContractRegistry::from_entries([ContractEntry::new(
        TOKEN,
        "SimpleToken",
        Box::new(AbiDecoder::new(&simple_token_abi())),
    )])
}

/// Writes a SimpleToken-ABI artifact under a contract name, deployed to the
/// given (network id, address) pairs.
pub(crate) fn write_artifact(dir: &Path, name: &str, networks: &[(&str, &str)]) {
    let networks: serde_json::Map<String, serde_json::Value> = networks
        .iter()
        .map(|(id, address)| (id.to_string(), serde_json::json!({ "address": address })))
        .collect();
    let artifact = serde_json::json!({
        "contractName": name,
        "abi": serde_json::from_str::<serde_json::Value>(SIMPLE_TOKEN_ABI).unwrap(),
        "networks": networks,
    });
    fs::write(dir.join(format!("{name}.json")), artifact.to_string()).unwrap();
}

/// A contract creation, identified by `H256::repeat_byte(id)`.
pub(crate) fn deploy(id: u8, created: H160) -> (TransactionReceipt, Transaction) {
    let (mut receipt, tx) = transaction(id, None, vec![]);
    receipt.contract_address = Some(created);
    (receipt, tx)
}

/// A call, identified by `H256::repeat_byte(id)`.
pub(crate) fn call(id: u8, to: H160, input: Vec<u8>) -> (TransactionReceipt, Transaction) {
    transaction(id, Some(to), input)
}

fn transaction(id: u8, to: Option<H160>, input: Vec<u8>) -> (TransactionReceipt, Transaction) {
    let hash = H256::repeat_byte(id);
    let from = H160::repeat_byte(0x01);
    let receipt = TransactionReceipt {
        transaction_hash: hash,
        block_number: Some(U64::one()),
        from,
        to,
        gas_used: Some(U256::from(21000 + id as u64)),
        status: Some(U64::one()),
        ..Default::default()
    };
    let tx = Transaction {
        hash,
        from,
        to,
        input: Bytes::from(input),
        ..Default::default()
    };
    (receipt, tx)
}

/// Chain held in memory. Block `n` is at index `n - 1`.
#[derive(Default)]
pub(crate) struct MemoryNode {
    pub(crate) network: String,
    blocks: Vec<Block<H256>>,
    receipts: HashMap<H256, TransactionReceipt>,
    transactions: HashMap<H256, Transaction>,
    requested_blocks: Mutex<Vec<u64>>,
}

impl MemoryNode {
    /// An empty chain reporting the given network id.
    pub(crate) fn with_network(network: &str) -> Self {
        MemoryNode {
            network: network.to_owned(),
            ..Default::default()
        }
    }

    /// Appends a block holding the transactions, in order.
    pub(crate) fn push_block(&mut self, transactions: Vec<(TransactionReceipt, Transaction)>) {
        let number = self.blocks.len() as u64 + 1;
        let mut hashes = vec![];
        for (index, (mut receipt, mut tx)) in transactions.into_iter().enumerate() {
            receipt.block_number = Some(U64::from(number));
            receipt.transaction_index = U64::from(index as u64);
            tx.block_number = Some(U64::from(number));
            tx.transaction_index = Some(U64::from(index as u64));
            hashes.push(tx.hash);
            self.receipts.insert(tx.hash, receipt);
            self.transactions.insert(tx.hash, tx);
        }
        self.blocks.push(Block {
            number: Some(U64::from(number)),
            transactions: hashes,
            ..Default::default()
        });
    }

    /// Heights requested so far, in request order.
    pub(crate) fn requested_blocks(&self) -> Vec<u64> {
        self.requested_blocks.lock().unwrap().clone()
    }
}

fn missing(method: &str) -> RpcError {
    RpcError::MissingResult {
        method: method.to_owned(),
    }
}

#[async_trait]
impl ChainNode for MemoryNode {
    async fn block_number(&self) -> Result<u64, RpcError> {
        Ok(self.blocks.len() as u64)
    }

    async fn network_id(&self) -> Result<String, RpcError> {
        Ok(self.network.clone())
    }

    async fn block_by_number(&self, number: u64) -> Result<Block<H256>, RpcError> {
        self.requested_blocks.lock().unwrap().push(number);
        let index = usize::try_from(number).unwrap().wrapping_sub(1);
        self.blocks
            .get(index)
            .cloned()
            .ok_or_else(|| missing("eth_getBlockByNumber"))
    }

    async fn transaction_receipt(&self, tx: H256) -> Result<TransactionReceipt, RpcError> {
        self.receipts
            .get(&tx)
            .cloned()
            .ok_or_else(|| missing("eth_getTransactionReceipt"))
    }

    async fn transaction(&self, tx: H256) -> Result<Transaction, RpcError> {
        self.transactions
            .get(&tx)
            .cloned()
            .ok_or_else(|| missing("eth_getTransactionByHash"))
    }
}
