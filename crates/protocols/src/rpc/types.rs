//! Wire types for the subset of Solana JSON-RPC responses this crate reads.
//!
//! Only the fields used downstream are modelled; everything else in the
//! payload is ignored by serde.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// One entry of `getSignaturesForAddress`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    /// Transaction error, `null` for successful transactions.
    #[serde(default)]
    pub err: Option<Value>,
}

impl SignatureInfo {
    /// Whether the transaction executed without error.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.err.as_ref().is_none_or(Value::is_null)
    }
}

/// A transaction fetched with `jsonParsed` encoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    pub transaction: TransactionEnvelope,
}

impl ParsedTransaction {
    /// Iterates over top-level and inner instructions.
    pub fn all_instructions(&self) -> impl Iterator<Item = &ParsedInstruction> {
        let inner = self
            .meta
            .iter()
            .flat_map(|meta| meta.inner_instructions.iter().flatten())
            .flat_map(|set| set.instructions.iter());
        self.transaction.message.instructions.iter().chain(inner)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEnvelope {
    pub message: TransactionMessage,
    #[serde(default)]
    pub signatures: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionMessage {
    #[serde(default)]
    pub instructions: Vec<ParsedInstruction>,
}

/// An instruction in `jsonParsed` form.
///
/// Programs the node knows how to parse carry `parsed`; everything else,
/// including AMM programs, carries base58 `data`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    pub program_id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub parsed: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub pre_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    pub inner_instructions: Option<Vec<InnerInstructionSet>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InnerInstructionSet {
    pub index: u32,
    #[serde(default)]
    pub instructions: Vec<ParsedInstruction>,
}

/// SPL token balance of one account before or after a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: u32,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    pub amount: String,
    pub decimals: u8,
    pub ui_amount_string: String,
}
