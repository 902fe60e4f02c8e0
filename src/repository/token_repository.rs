use super::models::{Token, TokenRow, address_key};
use crate::fetcher::TokenInfo;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

pub struct TokenRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> TokenRepository<'a> {
    // Single statement, so the insert-or-update is atomic per address.
    // updated_at never moves backwards even if the wall clock does.
    const UPSERT_TOKEN: &'static str =
        "INSERT INTO tokens (address, name, symbol, decimals, total_supply, logo_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
         ON CONFLICT(address) DO UPDATE SET
            name = excluded.name,
            symbol = excluded.symbol,
            decimals = excluded.decimals,
            total_supply = excluded.total_supply,
            logo_url = excluded.logo_url,
            updated_at = MAX(tokens.updated_at, excluded.updated_at)
         RETURNING address, name, symbol, decimals, total_supply, logo_url, created_at, updated_at";

    const COUNT_TOKENS: &'static str = "SELECT COUNT(*) FROM tokens";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn upsert(
        &self,
        info: &TokenInfo,
        logo_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Token> {
        let row = self
            .conn
            .query_row(
                Self::UPSERT_TOKEN,
                params![
                    address_key(&info.address),
                    info.name,
                    info.symbol,
                    info.decimals,
                    info.total_supply.to_string(),
                    logo_url,
                    now.timestamp_millis(),
                ],
                TokenRow::from_row,
            )
            .with_context(|| format!("Failed to save token data for {}", info.address))?;

        Token::try_from(row)
    }

    /// All tokens ordered by symbol using SQLite's BINARY collation
    /// (case-sensitive, uppercase sorts before lowercase).
    pub fn list_all(&self) -> Result<Vec<Token>> {
        let sql = format!(
            "SELECT {} FROM tokens ORDER BY symbol ASC, address ASC",
            TokenRow::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql).context("Failed to fetch tokens")?;
        let rows = stmt
            .query_map([], TokenRow::from_row)
            .context("Failed to fetch tokens")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to fetch tokens")?;

        rows.into_iter().map(Token::try_from).collect()
    }

    pub fn get_by_address(&self, address: &Address) -> Result<Option<Token>> {
        let sql = format!("SELECT {} FROM tokens WHERE address = ?1", TokenRow::COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![address_key(address)], TokenRow::from_row)
            .optional()
            .with_context(|| format!("Failed to fetch token {address}"))?;

        row.map(Token::try_from).transpose()
    }

    pub fn count(&self) -> Result<u64> {
        let count: u64 = self
            .conn
            .query_row(Self::COUNT_TOKENS, [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Database;
    use alloy_primitives::U256;
    use chrono::{Duration, TimeZone};
    use std::str::FromStr;

    fn info(address: &str, symbol: &str, supply: U256) -> TokenInfo {
        TokenInfo {
            address: Address::from_str(address).unwrap(),
            name: format!("{symbol} token"),
            symbol: symbol.to_string(),
            decimals: 18,
            total_supply: supply,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    #[test]
    fn insert_sets_both_timestamps() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let repo = TokenRepository::new(conn);
            let token = repo.upsert(&info(WETH, "WETH", U256::from(1u64)), Some("logo"), t0())?;
            assert_eq!(token.created_at, t0());
            assert_eq!(token.updated_at, t0());
            assert_eq!(token.logo_url.as_deref(), Some("logo"));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn update_overwrites_fields_and_keeps_created_at() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let repo = TokenRepository::new(conn);
            repo.upsert(&info(WETH, "WETH", U256::from(1u64)), Some("old"), t0())?;

            let later = t0() + Duration::minutes(5);
            let mut changed = info(WETH, "WETH2", U256::from(2u64));
            changed.decimals = 6;
            let token = repo.upsert(&changed, None, later)?;

            assert_eq!(token.created_at, t0());
            assert_eq!(token.updated_at, later);
            assert_eq!(token.symbol, "WETH2");
            assert_eq!(token.decimals, 6);
            assert_eq!(token.total_supply, U256::from(2u64));
            assert_eq!(token.logo_url, None);
            assert_eq!(repo.count()?, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn updated_at_never_goes_backwards() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let repo = TokenRepository::new(conn);
            repo.upsert(&info(WETH, "WETH", U256::from(1u64)), None, t0())?;
            let token = repo.upsert(
                &info(WETH, "WETH", U256::from(1u64)),
                None,
                t0() - Duration::hours(1),
            )?;
            assert_eq!(token.updated_at, t0());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn differently_cased_addresses_share_a_row() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let repo = TokenRepository::new(conn);
            repo.upsert(&info(WETH, "WETH", U256::from(1u64)), None, t0())?;
            repo.upsert(&info(&WETH.to_lowercase(), "WETH", U256::from(1u64)), None, t0())?;
            assert_eq!(repo.count()?, 1);

            let lower = Address::from_str(&WETH.to_lowercase()).unwrap();
            assert!(repo.get_by_address(&lower)?.is_some());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn supply_round_trips_exactly() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let repo = TokenRepository::new(conn);
            repo.upsert(&info(WETH, "WETH", U256::MAX), None, t0())?;
            let stored = repo
                .get_by_address(&Address::from_str(WETH).unwrap())?
                .unwrap();
            assert_eq!(stored.total_supply.to_string(), U256::MAX.to_string());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn lists_by_symbol_case_sensitively() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let repo = TokenRepository::new(conn);
            repo.upsert(
                &info("0x6B175474E89094C44Da98b954EedeAC495271d0F", "cDAI", U256::ZERO),
                None,
                t0(),
            )?;
            repo.upsert(&info(WETH, "WETH", U256::ZERO), None, t0())?;
            repo.upsert(
                &info("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", U256::ZERO),
                None,
                t0(),
            )?;

            let symbols: Vec<_> = repo.list_all()?.into_iter().map(|t| t.symbol).collect();
            assert_eq!(symbols, vec!["USDC", "WETH", "cDAI"]);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn missing_token_is_none() {
        let db = Database::in_memory().unwrap();
        let found = db
            .with_conn(|conn| {
                TokenRepository::new(conn).get_by_address(&Address::from_str(WETH).unwrap())
            })
            .unwrap();
        assert!(found.is_none());
    }
}
