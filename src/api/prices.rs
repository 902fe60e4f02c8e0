use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};

/// Static quotes for the demo price page; there is no live feed behind them.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MockPrice {
    pub id: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub price: &'static str,
}

pub const MOCK_PRICES: [MockPrice; 5] = [
    MockPrice { id: "1", symbol: "ETH", name: "Ethereum", price: "3500.50" },
    MockPrice { id: "2", symbol: "BTC", name: "Bitcoin", price: "65000.75" },
    MockPrice { id: "3", symbol: "USDC", name: "USD Coin", price: "1.00" },
    MockPrice { id: "4", symbol: "LINK", name: "Chainlink", price: "18.25" },
    MockPrice { id: "5", symbol: "UNI", name: "Uniswap", price: "10.50" },
];

/// GET /api/prices
pub async fn list_prices() -> Json<Value> {
    Json(json!({ "prices": MOCK_PRICES }))
}
