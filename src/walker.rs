//! Fetches blocks in chain order together with the receipts (and, for calls,
//! the bodies) of their transactions.
use ethers::types::{Transaction, TransactionReceipt, H256};
use futures::{
    future,
    stream::{self, Stream, StreamExt, TryStreamExt},
};
use log::debug;

use crate::{
    node::{ChainNode, RpcError},
    report::CallType,
};

/// A transaction as seen by the node after execution.
#[derive(Clone, Debug)]
pub struct ObservedTransaction {
    pub hash: H256,
    pub receipt: TransactionReceipt,
    /// Transaction body. Only fetched for calls, where the calldata is needed.
    pub transaction: Option<Transaction>,
}

/// A block with at least one transaction.
#[derive(Clone, Debug)]
pub struct ObservedBlock {
    pub number: u64,
    pub transactions: Vec<ObservedTransaction>,
}

pub struct BlockWalker<'a, N: ChainNode> {
    node: &'a N,
    concurrency: usize,
}

impl<'a, N: ChainNode> BlockWalker<'a, N> {
    /// Creates a walker that fetches one block at a time.
    pub fn new(node: &'a N) -> Self {
        BlockWalker {
            node,
            concurrency: 1,
        }
    }

    /// Sets how many blocks may be fetched at once. Blocks are still
    /// yielded in chain order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Yields the non-empty blocks in `1..=height`, in ascending order.
    ///
    /// The first RPC failure is yielded as an error.
    pub fn blocks(
        &self,
        height: u64,
    ) -> impl Stream<Item = Result<ObservedBlock, RpcError>> + '_ {
        stream::iter(1..=height)
            .map(move |number| self.fetch_block(number))
            .buffered(self.concurrency)
            .try_filter(|block| future::ready(!block.transactions.is_empty()))
    }

    /// Gets a block and the receipts of all its transactions.
    pub async fn fetch_block(&self, number: u64) -> Result<ObservedBlock, RpcError> {
        let block = self.node.block_by_number(number).await?;
        debug!(
            "block {number} has {} transactions",
            block.transactions.len()
        );
        let mut transactions = Vec::with_capacity(block.transactions.len());
        for hash in block.transactions {
            transactions.push(self.fetch_transaction(hash).await?);
        }
        Ok(ObservedBlock {
            number,
            transactions,
        })
    }

    async fn fetch_transaction(&self, hash: H256) -> Result<ObservedTransaction, RpcError> {
        let receipt = self.node.transaction_receipt(hash).await?;
        let transaction = match CallType::of_receipt(&receipt) {
            CallType::Deploy => None,
            CallType::Call => Some(self.node.transaction(hash).await?),
        };
        Ok(ObservedTransaction {
            hash,
            receipt,
            transaction,
        })
    }
}
