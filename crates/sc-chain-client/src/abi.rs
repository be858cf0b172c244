//! Solidity ABI encoding for the handful of types the item contract uses.
//!
//! Only `uint256` (held as `u128`), `string` and `address` are supported.

use crate::{ChainError, ChainResult};
use sc_api_types::Address;
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(u128),
    String(String),
    Address(Address),
}

impl Token {
    pub fn into_uint(self) -> ChainResult<u128> {
        match self {
            Token::Uint(value) => Ok(value),
            other => Err(ChainError::Decode(format!("expected uint, got {other:?}"))),
        }
    }

    pub fn into_string(self) -> ChainResult<String> {
        match self {
            Token::String(value) => Ok(value),
            other => Err(ChainError::Decode(format!("expected string, got {other:?}"))),
        }
    }

    pub fn into_address(self) -> ChainResult<Address> {
        match self {
            Token::Address(value) => Ok(value),
            other => Err(ChainError::Decode(format!("expected address, got {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Uint,
    String,
    Address,
}

/// A contract method invocation: canonical signature, arguments and the
/// shape of its return data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub signature: &'static str,
    pub args: Vec<Token>,
    pub outputs: &'static [ParamKind],
}

impl MethodCall {
    pub fn new(signature: &'static str, args: Vec<Token>, outputs: &'static [ParamKind]) -> Self {
        Self {
            signature,
            args,
            outputs,
        }
    }

    /// Method name without the parameter list.
    pub fn name(&self) -> &str {
        self.signature.split('(').next().unwrap_or(self.signature)
    }

    /// Calldata: selector followed by the encoded arguments.
    pub fn encode(&self) -> ChainResult<Vec<u8>> {
        let mut data = selector(self.signature).to_vec();
        data.extend(encode_args(&self.args)?);
        Ok(data)
    }

    pub fn decode_output(&self, data: &[u8]) -> ChainResult<Vec<Token>> {
        decode(self.outputs, data)
    }
}

/// First four bytes of Keccak-256 over the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn encode_args(args: &[Token]) -> ChainResult<Vec<u8>> {
    let head_len = args.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        match arg {
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::Address(address) => head.extend_from_slice(&address_word(address)?),
            Token::String(value) => {
                // dynamic: offset in head, length + padded bytes in tail
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                tail.extend_from_slice(&uint_word(value.len() as u128));
                tail.extend_from_slice(value.as_bytes());
                let padding = (WORD - value.len() % WORD) % WORD;
                tail.resize(tail.len() + padding, 0);
            }
        }
    }

    head.extend(tail);
    Ok(head)
}

pub fn decode(kinds: &[ParamKind], data: &[u8]) -> ChainResult<Vec<Token>> {
    kinds
        .iter()
        .enumerate()
        .map(|(position, kind)| {
            let word = word_at(data, position * WORD)?;
            match kind {
                ParamKind::Uint => Ok(Token::Uint(word_to_u128(word)?)),
                ParamKind::Address => Ok(Token::Address(Address(format!(
                    "0x{}",
                    hex::encode(&word[12..])
                )))),
                ParamKind::String => {
                    let offset = word_to_usize(word)?;
                    let len = word_to_usize(word_at(data, offset)?)?;
                    let bytes = offset
                        .checked_add(WORD)
                        .and_then(|start| Some(start..start.checked_add(len)?))
                        .and_then(|range| data.get(range))
                        .ok_or_else(|| ChainError::Decode(format!("string of {len} bytes truncated")))?;
                    String::from_utf8(bytes.to_vec())
                        .map(Token::String)
                        .map_err(|e| ChainError::Decode(format!("string is not utf-8: {e}")))
                }
            }
        })
        .collect()
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn from_hex_data(raw: &str) -> ChainResult<Vec<u8>> {
    let body = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(body).map_err(|e| ChainError::Decode(format!("invalid hex data: {e}")))
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &Address) -> ChainResult<[u8; WORD]> {
    if !address.is_well_formed() {
        return Err(ChainError::Encode(format!("malformed address {address}")));
    }
    let bytes = hex::decode(&address.0[2..])
        .map_err(|e| ChainError::Encode(format!("malformed address {address}: {e}")))?;
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

fn word_at(data: &[u8], offset: usize) -> ChainResult<&[u8]> {
    offset
        .checked_add(WORD)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| ChainError::Decode(format!("output truncated at byte {offset}")))
}

fn word_to_u128(word: &[u8]) -> ChainResult<u128> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::Decode("integer exceeds 128 bits".to_owned()));
    }
    let low = <[u8; 16]>::try_from(&word[16..])
        .map_err(|_| ChainError::Decode("short integer word".to_owned()))?;
    Ok(u128::from_be_bytes(low))
}

fn word_to_usize(word: &[u8]) -> ChainResult<usize> {
    usize::try_from(word_to_u128(word)?)
        .map_err(|_| ChainError::Decode("offset does not fit in memory".to_owned()))
}
