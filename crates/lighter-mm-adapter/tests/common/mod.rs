/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for lighter-mm-adapter tests

use lighter_mm_adapter::{ClientConfig, LighterClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> LighterClient {
    LighterClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init")
}

/// Account payload as returned by `/api/v1/account`
#[allow(dead_code)]
pub fn account_json(index: i64, available: &str, position: &str) -> serde_json::Value {
    serde_json::json!({
        "index": index,
        "available_balance": available,
        "total_asset_value": available,
        "positions": [
            { "market_id": 48, "symbol": "PAXG", "sign": 1, "position": position }
        ]
    })
}
