use crate::error::ProtocolError;
use crate::raydium::{AMM_V4_AUTHORITY, AMM_V4_PROGRAM_ID, SWAP_BASE_IN_TAG, SWAP_BASE_OUT_TAG};
use crate::rpc::types::{ParsedInstruction, ParsedTransaction, TokenBalance, TransactionMeta};
use crate::{SwapDecoder, SwapFill};
use candle_replay_domain::Pool;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Swap decoder for one Raydium AMM v4 pool.
///
/// A transaction is a swap when it carries a `SwapBaseIn` or `SwapBaseOut`
/// instruction of the AMM program, at top level or as an inner instruction
/// of a router. The fill is measured on the pool vaults (token accounts owned
/// by the AMM authority). Transactions whose vault balances are not reported
/// fall back to all accounts of the two mints, halving the absolute deltas
/// since every token moved leaves one account and enters another.
#[derive(Debug, Clone)]
pub struct RaydiumSwapDecoder {
    pool_address: String,
    base_mint: String,
    quote_mint: String,
}

impl RaydiumSwapDecoder {
    /// Creates a decoder for `pool`.
    #[must_use]
    pub fn new(pool: &Pool) -> Self {
        Self {
            pool_address: pool.address.clone(),
            base_mint: pool.base_mint.clone(),
            quote_mint: pool.quote_mint.clone(),
        }
    }

    fn is_pool_swap(&self, ix: &ParsedInstruction) -> bool {
        if ix.program_id != AMM_V4_PROGRAM_ID {
            return false;
        }
        if !ix.accounts.is_empty() && !ix.accounts.iter().any(|a| *a == self.pool_address) {
            return false;
        }
        let Some(data) = ix.data.as_deref() else {
            return false;
        };
        match bs58::decode(data).into_vec() {
            Ok(bytes) => matches!(
                bytes.first().copied(),
                Some(SWAP_BASE_IN_TAG | SWAP_BASE_OUT_TAG)
            ),
            Err(e) => {
                debug!(error = %e, "Undecodable AMM instruction data");
                false
            }
        }
    }
}

impl SwapDecoder for RaydiumSwapDecoder {
    fn is_swap(&self, tx: &ParsedTransaction) -> bool {
        let failed = tx
            .meta
            .as_ref()
            .and_then(|m| m.err.as_ref())
            .is_some_and(|e| !e.is_null());
        !failed && tx.all_instructions().any(|ix| self.is_pool_swap(ix))
    }

    fn extract_fill(&self, tx: &ParsedTransaction) -> Result<Option<SwapFill>, ProtocolError> {
        let meta = tx.meta.as_ref().ok_or(ProtocolError::MissingField("meta"))?;

        let vault_base = mint_delta(meta, &self.base_mint, Some(AMM_V4_AUTHORITY))?;
        let vault_quote = mint_delta(meta, &self.quote_mint, Some(AMM_V4_AUTHORITY))?;
        let (base, quote) = if vault_base.is_zero() || vault_quote.is_zero() {
            let two = Decimal::TWO;
            (
                mint_delta(meta, &self.base_mint, None)? / two,
                mint_delta(meta, &self.quote_mint, None)? / two,
            )
        } else {
            (vault_base, vault_quote)
        };

        if base.is_zero() {
            return Ok(None);
        }
        let price = quote
            .checked_div(base)
            .ok_or_else(|| ProtocolError::InvalidAmount(format!("{quote} / {base}")))?;
        if price.is_zero() {
            return Ok(None);
        }

        let to_f64 = |d: Decimal| {
            d.to_f64()
                .ok_or_else(|| ProtocolError::InvalidAmount(d.to_string()))
        };
        Ok(Some(SwapFill {
            price: to_f64(price)?,
            base_amount: to_f64(base)?,
            quote_amount: to_f64(quote)?,
        }))
    }
}

/// Sums the absolute balance changes of `mint` across token accounts.
///
/// Balances are matched by account index; an account missing on one side
/// (created or closed by the transaction) counts as zero on that side.
/// When `owner` is given only accounts owned by it are considered.
///
/// # Errors
/// Returns an error if the balance lists are absent or an amount does not parse.
pub fn mint_delta(
    meta: &TransactionMeta,
    mint: &str,
    owner: Option<&str>,
) -> Result<Decimal, ProtocolError> {
    let pre = meta
        .pre_token_balances
        .as_deref()
        .ok_or(ProtocolError::MissingField("preTokenBalances"))?;
    let post = meta
        .post_token_balances
        .as_deref()
        .ok_or(ProtocolError::MissingField("postTokenBalances"))?;

    let mut balances: BTreeMap<u32, (Decimal, Decimal)> = BTreeMap::new();
    for (side, list) in [(0usize, pre), (1usize, post)] {
        for balance in list.iter().filter(|b| selects(b, mint, owner)) {
            let amount = parse_amount(balance)?;
            let entry = balances
                .entry(balance.account_index)
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            if side == 0 {
                entry.0 = amount;
            } else {
                entry.1 = amount;
            }
        }
    }

    Ok(balances
        .values()
        .map(|(before, after)| (*after - *before).abs())
        .sum())
}

fn selects(balance: &TokenBalance, mint: &str, owner: Option<&str>) -> bool {
    balance.mint == mint && owner.is_none_or(|o| balance.owner.as_deref() == Some(o))
}

fn parse_amount(balance: &TokenBalance) -> Result<Decimal, ProtocolError> {
    let text = &balance.ui_token_amount.ui_amount_string;
    Decimal::from_str(text).map_err(|e| ProtocolError::InvalidAmount(format!("{text}: {e}")))
}
