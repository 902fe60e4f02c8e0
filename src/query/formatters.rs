use crate::reconciler::RefreshSummary;
use crate::repository::Token;
use crate::units::{format_token_amount, shorten_address};
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

pub fn format_tokens(tokens: &[Token], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_tokens_table(tokens),
        OutputFormat::Json => format_tokens_json(tokens),
        OutputFormat::Csv => format_tokens_csv(tokens),
    }
}

fn format_tokens_table(tokens: &[Token]) -> String {
    if tokens.is_empty() {
        return "No token data available. Run `query refresh` to fetch it from the chain."
            .to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            "Token",
            "Symbol",
            "Address",
            "Total Supply",
            "Decimals",
        ]);

    for token in tokens {
        table.add_row(vec![
            Cell::new(&token.name),
            Cell::new(&token.symbol),
            Cell::new(shorten_address(&token.address.to_checksum(None))),
            Cell::new(format!(
                "{} {}",
                format_token_amount(token.total_supply, token.decimals),
                token.symbol
            )),
            Cell::new(token.decimals),
        ]);
    }

    table.to_string()
}

fn format_tokens_json(tokens: &[Token]) -> String {
    serde_json::to_string_pretty(&json!({ "tokens": tokens }))
        .unwrap_or_else(|_| "{}".to_string())
}

fn format_tokens_csv(tokens: &[Token]) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record([
        "address",
        "name",
        "symbol",
        "decimals",
        "total_supply",
        "total_supply_formatted",
        "logo_url",
        "created_at",
        "updated_at",
    ]);

    for token in tokens {
        let _ = wtr.write_record([
            token.address.to_checksum(None).as_str(),
            token.name.as_str(),
            token.symbol.as_str(),
            token.decimals.to_string().as_str(),
            token.total_supply.to_string().as_str(),
            format_token_amount(token.total_supply, token.decimals).as_str(),
            token.logo_url.as_deref().unwrap_or(""),
            token.created_at.to_rfc3339().as_str(),
            token.updated_at.to_rfc3339().as_str(),
        ]);
    }

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

pub fn format_token(token: &Token, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Field", "Value"]);

            table.add_row(vec![Cell::new("Name"), Cell::new(&token.name)]);
            table.add_row(vec![Cell::new("Symbol"), Cell::new(&token.symbol)]);
            table.add_row(vec![
                Cell::new("Address"),
                Cell::new(token.address.to_checksum(None)),
            ]);
            table.add_row(vec![Cell::new("Decimals"), Cell::new(token.decimals)]);
            table.add_row(vec![
                Cell::new("Total Supply"),
                Cell::new(format_token_amount(token.total_supply, token.decimals)),
            ]);
            table.add_row(vec![
                Cell::new("Total Supply (raw)"),
                Cell::new(token.total_supply.to_string()),
            ]);
            table.add_row(vec![
                Cell::new("Logo"),
                Cell::new(token.logo_url.as_deref().unwrap_or("N/A")),
            ]);
            table.add_row(vec![
                Cell::new("Updated"),
                Cell::new(token.updated_at.to_rfc3339()),
            ]);
            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({ "token": token }))
            .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Csv => format_tokens_csv(std::slice::from_ref(token)),
    }
}

pub fn format_refresh_summary(summary: &RefreshSummary, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Address", "Status", "Detail"]);

            for token in &summary.succeeded {
                table.add_row(vec![
                    Cell::new(token.address.to_checksum(None)),
                    Cell::new("refreshed"),
                    Cell::new(format!("{} ({})", token.name, token.symbol)),
                ]);
            }
            for failure in &summary.failed {
                table.add_row(vec![
                    Cell::new(&failure.address),
                    Cell::new("failed"),
                    Cell::new(&failure.error),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "message": "Token data refreshed",
            "tokens": summary.succeeded,
            "failed": summary.failed,
        }))
        .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["address", "status", "detail"]);
            for token in &summary.succeeded {
                let _ = wtr.write_record([
                    token.address.to_checksum(None).as_str(),
                    "refreshed",
                    token.symbol.as_str(),
                ]);
            }
            for failure in &summary.failed {
                let _ = wtr.write_record([failure.address.as_str(), "failed", failure.error.as_str()]);
            }
            String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
        }
    }
}
