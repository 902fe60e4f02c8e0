use alloy_primitives::{Address, U256, hex};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;

/// A token as persisted in the `tokens` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(serialize_with = "checksummed")]
    pub address: Address,
    pub name: String,
    pub symbol: String,
    #[serde(serialize_with = "as_string")]
    pub decimals: u8,
    #[serde(serialize_with = "as_string")]
    pub total_supply: U256,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage key for an address: lowercase hex, so differently cased inputs collide.
pub fn address_key(address: &Address) -> String {
    hex::encode_prefixed(address.as_slice())
}

/// Raw column values, converted into a [`Token`] outside the rusqlite row callback.
#[derive(Debug)]
pub(crate) struct TokenRow {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i64,
    pub total_supply: String,
    pub logo_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TokenRow {
    pub const COLUMNS: &'static str =
        "address, name, symbol, decimals, total_supply, logo_url, created_at, updated_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(TokenRow {
            address: row.get(0)?,
            name: row.get(1)?,
            symbol: row.get(2)?,
            decimals: row.get(3)?,
            total_supply: row.get(4)?,
            logo_url: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<TokenRow> for Token {
    type Error = anyhow::Error;

    fn try_from(row: TokenRow) -> Result<Self> {
        let address = Address::from_str(&row.address)
            .with_context(|| format!("Invalid stored address: {}", row.address))?;
        let decimals = u8::try_from(row.decimals)
            .with_context(|| format!("Invalid stored decimals for {}", row.address))?;
        let total_supply = U256::from_str(&row.total_supply)
            .map_err(|_| anyhow::anyhow!("Invalid total supply format: {}", row.total_supply))?;

        Ok(Token {
            address,
            name: row.name,
            symbol: row.symbol,
            decimals,
            total_supply,
            logo_url: row.logo_url,
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| anyhow::anyhow!("Invalid stored timestamp: {millis}"))
}

fn checksummed<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&address.to_checksum(None))
}

fn as_string<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
