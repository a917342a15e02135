/*
[INPUT]:  Order and cancel intents from the control loop
[OUTPUT]: Signed, submitted transactions on Lighter
[POS]:    Execution layer - collaborator seams plus the Lighter-backed implementation
[UPDATE]: When adding transaction kinds or changing nonce/sign/send flow
*/

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use lighter_mm_adapter::{
    CancelAllOrdersRequest, CreateOrderRequest, LighterClient, OrderBookInfo, TxSigner,
};
use tracing::{debug, info};

pub type GatewayFuture<'a, T> =
    Pin<Box<dyn Future<Output = lighter_mm_adapter::Result<T>> + Send + 'a>>;

pub trait OrderSubmitter: Send + Sync {
    /// Submit one order, returning the transaction hash.
    fn submit(&self, req: CreateOrderRequest) -> GatewayFuture<'_, String>;
}

pub trait OrderCanceler: Send + Sync {
    /// Cancel every open order of the account.
    fn cancel_all(&self) -> GatewayFuture<'_, ()>;
}

pub trait MarketDirectory: Send + Sync {
    fn find_market(&self, symbol: &str) -> GatewayFuture<'_, OrderBookInfo>;
}

/// Everything the engine needs from the exchange for order flow.
pub trait ExchangeGateway: OrderSubmitter + OrderCanceler + MarketDirectory {}

impl<T> ExchangeGateway for T where T: OrderSubmitter + OrderCanceler + MarketDirectory {}

/// Gateway that fetches a nonce, signs, then sends each transaction.
#[derive(Clone)]
pub struct LighterGateway {
    client: LighterClient,
    signer: Arc<dyn TxSigner>,
    account_index: i64,
    api_key_index: u8,
}

impl std::fmt::Debug for LighterGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LighterGateway")
            .field("base_url", &self.client.base_url().as_str())
            .field("account_index", &self.account_index)
            .field("api_key_index", &self.api_key_index)
            .finish_non_exhaustive()
    }
}

impl LighterGateway {
    pub fn new(
        client: LighterClient,
        signer: Arc<dyn TxSigner>,
        account_index: i64,
        api_key_index: u8,
    ) -> Self {
        Self {
            client,
            signer,
            account_index,
            api_key_index,
        }
    }

    pub fn client(&self) -> &LighterClient {
        &self.client
    }

    async fn next_nonce(&self) -> lighter_mm_adapter::Result<i64> {
        let nonce = self
            .client
            .next_nonce(self.account_index, self.api_key_index)
            .await?;
        debug!(nonce, "nonce fetched");
        Ok(nonce)
    }
}

impl OrderSubmitter for LighterGateway {
    fn submit(&self, req: CreateOrderRequest) -> GatewayFuture<'_, String> {
        Box::pin(async move {
            let nonce = self.next_nonce().await?;
            let signed = self.signer.sign_create_order(&req, nonce).await?;
            let response = self.client.send_tx(&signed).await?;
            info!(
                client_order_index = req.client_order_index,
                is_ask = req.is_ask,
                price = req.price,
                base_amount = req.base_amount,
                reduce_only = req.reduce_only,
                tx_hash = %response.tx_hash,
                "order submitted"
            );
            Ok(response.tx_hash)
        })
    }
}

impl OrderCanceler for LighterGateway {
    fn cancel_all(&self) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let nonce = self.next_nonce().await?;
            let req = CancelAllOrdersRequest::immediate();
            let signed = self.signer.sign_cancel_all(&req, nonce).await?;
            let response = self.client.send_tx(&signed).await?;
            info!(tx_hash = %response.tx_hash, "cancel-all submitted");
            Ok(())
        })
    }
}

impl MarketDirectory for LighterGateway {
    fn find_market(&self, symbol: &str) -> GatewayFuture<'_, OrderBookInfo> {
        let symbol = symbol.to_string();
        Box::pin(async move { self.client.find_market(&symbol).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lighter_mm_adapter::{ClientConfig, LighterError, MockTxSigner, Side};
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer, signer: Arc<MockTxSigner>) -> LighterGateway {
        let client = LighterClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
            .expect("client");
        LighterGateway::new(client, signer, 42, 3)
    }

    async fn mount_nonce(server: &MockServer, nonce: i64) {
        Mock::given(method("GET"))
            .and(path("/api/v1/nextNonce"))
            .and(query_param("account_index", "42"))
            .and(query_param("api_key_index", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "nonce": nonce
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn submit_fetches_nonce_signs_and_sends() {
        let server = MockServer::start().await;
        mount_nonce(&server, 11).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sendTx"))
            .and(body_string_contains("tx_type=14"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "tx_hash": "0xabc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let signer = Arc::new(MockTxSigner::new());
        let gateway = gateway_for(&server, signer.clone());
        let req = CreateOrderRequest::post_only_limit(48, Side::Buy, 100, 250_000, false);

        let tx_hash = gateway.submit(req).await.expect("submitted");
        assert_eq!(tx_hash, "0xabc");
        assert_eq!(signer.nonces(), vec![11]);
    }

    #[tokio::test]
    async fn cancel_all_sends_cancel_transaction() {
        let server = MockServer::start().await;
        mount_nonce(&server, 5).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sendTx"))
            .and(body_string_contains("tx_type=16"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "tx_hash": "0xdef"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let signer = Arc::new(MockTxSigner::new());
        let gateway = gateway_for(&server, signer.clone());
        tokio_test::assert_ok!(gateway.cancel_all().await);
        assert_eq!(signer.nonces(), vec![5]);
    }

    #[tokio::test]
    async fn rejected_transaction_surfaces_api_error() {
        let server = MockServer::start().await;
        mount_nonce(&server, 5).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sendTx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 21120,
                "message": "invalid nonce"
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server, Arc::new(MockTxSigner::new()));
        let req = CreateOrderRequest::post_only_limit(48, Side::Sell, 100, 250_000, true);
        let err = gateway.submit(req).await.unwrap_err();
        assert!(matches!(err, LighterError::Api { code: 21120, .. }));
    }

    #[tokio::test]
    async fn find_market_resolves_symbol() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/orderBooks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "order_books": [{
                    "symbol": "PAXG",
                    "market_id": 48,
                    "status": "active",
                    "supported_price_decimals": 2,
                    "supported_size_decimals": 4
                }]
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server, Arc::new(MockTxSigner::new()));
        let info = gateway.find_market("paxg").await.expect("found");
        assert_eq!(info.market_id, 48);
    }
}
