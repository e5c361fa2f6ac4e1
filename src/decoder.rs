//! Decoding of transaction calldata against a contract ABI.
use std::collections::HashMap;

use ethers::{
    abi::{Abi, Function, Token},
    types::I256,
};
use serde_json::Value;
use thiserror::Error;

use crate::utils::hex_encode;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Calldata of {0} bytes is too short to hold a function selector")]
    TooShort(usize),
    #[error("No function in the ABI has selector {0}")]
    UnknownSelector(String),
    #[error("Arguments of {function} could not be decoded {source}")]
    InvalidArguments {
        function: String,
        source: ethers::abi::Error,
    },
}

/// A function call recovered from calldata.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedCall {
    pub function_name: String,
    /// Parameter names in ABI order.
    pub param_names: Vec<String>,
    /// Decoded argument values, one per parameter.
    pub args: Vec<Value>,
}

/// Capability to turn calldata into a function call.
pub trait Decoder: Send + Sync {
    fn decode(&self, calldata: &[u8]) -> Result<DecodedCall, DecodeError>;
}

/// Decodes calldata using the functions of one contract ABI, keyed by
/// 4-byte selector so that overloaded functions are told apart.
#[derive(Clone, Debug)]
pub struct AbiDecoder {
    functions: HashMap<[u8; 4], Function>,
}

impl AbiDecoder {
    pub fn new(abi: &Abi) -> Self {
        let functions = abi
            .functions()
            .map(|function| (function.short_signature(), function.clone()))
            .collect();
        AbiDecoder { functions }
    }
}

impl Decoder for AbiDecoder {
    fn decode(&self, calldata: &[u8]) -> Result<DecodedCall, DecodeError> {
        if calldata.len() < 4 {
            return Err(DecodeError::TooShort(calldata.len()));
        }
        let (selector, data) = calldata.split_at(4);
        let Some(function) = self.functions.get(selector) else {
            return Err(DecodeError::UnknownSelector(hex_encode(selector)))
        };
        let tokens = function
            .decode_input(data)
            .map_err(|source| DecodeError::InvalidArguments {
                function: function.signature(),
                source,
            })?;
        Ok(DecodedCall {
            function_name: function.name.clone(),
            param_names: function.inputs.iter().map(|p| p.name.clone()).collect(),
            args: tokens.into_iter().map(token_to_value).collect(),
        })
    }
}

/// Represents a decoded ABI value as JSON.
///
/// Integers become decimal strings (they may exceed the JSON number range),
/// addresses and bytes become 0x-prefixed hex strings.
pub fn token_to_value(token: Token) -> Value {
    match token {
        Token::Address(address) => Value::String(hex_encode(address)),
        Token::FixedBytes(bytes) | Token::Bytes(bytes) => Value::String(hex_encode(bytes)),
        Token::Int(int) => Value::String(I256::from_raw(int).to_string()),
        Token::Uint(uint) => Value::String(uint.to_string()),
        Token::Bool(b) => Value::Bool(b),
        Token::String(s) => Value::String(s),
        Token::FixedArray(tokens) | Token::Array(tokens) | Token::Tuple(tokens) => {
            Value::Array(tokens.into_iter().map(token_to_value).collect())
        }
    }
}
