/*
[INPUT]:  Transaction requests, nonces, signer endpoint
[OUTPUT]: Signed transaction payloads ready for `sendTx`
[POS]:    Signing seam - key material stays outside this process
[UPDATE]: When adding transaction kinds or changing the signer protocol
*/

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::http::{ClientConfig, LighterError, Result};
use crate::types::{CancelAllOrdersRequest, CreateOrderRequest, TxType};

/// Transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub tx_type: TxType,
    pub tx_info: String,
}

/// Produces signed transactions for one account/API key pair.
///
/// Async so that hardware or remote signers fit behind the same seam.
#[async_trait]
pub trait TxSigner: Send + Sync {
    async fn sign_create_order(&self, req: &CreateOrderRequest, nonce: i64) -> Result<SignedTx>;

    async fn sign_cancel_all(&self, req: &CancelAllOrdersRequest, nonce: i64) -> Result<SignedTx>;
}

#[derive(Debug, Serialize)]
struct SignRequest<'a, T: Serialize> {
    request_id: String,
    account_index: i64,
    api_key_index: u8,
    nonce: i64,
    tx_type: TxType,
    payload: &'a T,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    tx_info: String,
}

/// Signer that delegates to an HTTP signing service holding the API key.
///
/// POST {base}/sign with `{request_id, account_index, api_key_index, nonce, tx_type, payload}`
/// and expects `{tx_info}` back.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    http_client: Client,
    sign_url: Url,
    account_index: i64,
    api_key_index: u8,
}

impl RemoteSigner {
    pub fn new(
        config: ClientConfig,
        base_url: &str,
        account_index: i64,
        api_key_index: u8,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        let sign_url = Url::parse(base_url)?.join("/sign")?;
        Ok(Self {
            http_client,
            sign_url,
            account_index,
            api_key_index,
        })
    }

    async fn sign<T: Serialize + Sync>(
        &self,
        tx_type: TxType,
        payload: &T,
        nonce: i64,
    ) -> Result<SignedTx> {
        let request = SignRequest {
            request_id: Uuid::new_v4().to_string(),
            account_index: self.account_index,
            api_key_index: self.api_key_index,
            nonce,
            tx_type,
            payload,
        };

        let response = self
            .http_client
            .post(self.sign_url.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LighterError::Signer(format!("status {}: {}", status.as_u16(), body)));
        }

        let signed: SignResponse = response.json().await?;
        if signed.tx_info.is_empty() {
            return Err(LighterError::Signer("empty tx_info".to_string()));
        }
        debug!(request_id = %request.request_id, ?tx_type, nonce, "transaction signed");

        Ok(SignedTx {
            tx_type,
            tx_info: signed.tx_info,
        })
    }
}

#[async_trait]
impl TxSigner for RemoteSigner {
    async fn sign_create_order(&self, req: &CreateOrderRequest, nonce: i64) -> Result<SignedTx> {
        self.sign(TxType::CreateOrder, req, nonce).await
    }

    async fn sign_cancel_all(&self, req: &CancelAllOrdersRequest, nonce: i64) -> Result<SignedTx> {
        self.sign(TxType::CancelAllOrders, req, nonce).await
    }
}

/// Signer for tests: encodes the request as JSON and records every nonce.
#[derive(Debug, Default)]
pub struct MockTxSigner {
    nonces: Mutex<Vec<i64>>,
}

impl MockTxSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nonces(&self) -> Vec<i64> {
        self.nonces
            .lock()
            .map(|nonces| nonces.clone())
            .unwrap_or_default()
    }

    fn record(&self, nonce: i64) {
        if let Ok(mut nonces) = self.nonces.lock() {
            nonces.push(nonce);
        }
    }
}

#[async_trait]
impl TxSigner for MockTxSigner {
    async fn sign_create_order(&self, req: &CreateOrderRequest, nonce: i64) -> Result<SignedTx> {
        self.record(nonce);
        Ok(SignedTx {
            tx_type: TxType::CreateOrder,
            tx_info: serde_json::to_string(req)?,
        })
    }

    async fn sign_cancel_all(&self, req: &CancelAllOrdersRequest, nonce: i64) -> Result<SignedTx> {
        self.record(nonce);
        Ok(SignedTx {
            tx_type: TxType::CancelAllOrders,
            tx_info: serde_json::to_string(req)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn remote_signer_posts_nonce_and_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sign"))
            .and(body_partial_json(serde_json::json!({
                "account_index": 42,
                "api_key_index": 3,
                "nonce": 11,
                "tx_type": 14,
                "payload": { "market_index": 48, "base_amount": 47, "price": 265012 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tx_info": "signed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let signer = RemoteSigner::new(ClientConfig::default(), &server.uri(), 42, 3)
            .expect("signer init");
        let req = CreateOrderRequest::post_only_limit(48, Side::Buy, 47, 265_012, false);
        let signed = signer.sign_create_order(&req, 11).await.expect("sign");

        assert_eq!(signed.tx_type, TxType::CreateOrder);
        assert_eq!(signed.tx_info, "signed");
    }

    #[tokio::test]
    async fn remote_signer_maps_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sign"))
            .respond_with(ResponseTemplate::new(401).set_body_string("locked"))
            .mount(&server)
            .await;

        let signer = RemoteSigner::new(ClientConfig::default(), &server.uri(), 42, 3)
            .expect("signer init");
        let err = signer
            .sign_cancel_all(&CancelAllOrdersRequest::immediate(), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, LighterError::Signer(message) if message.contains("401")));
    }

    #[tokio::test]
    async fn mock_signer_records_nonces() {
        let signer = MockTxSigner::new();
        signer
            .sign_cancel_all(&CancelAllOrdersRequest::immediate(), 5)
            .await
            .expect("sign");
        signer
            .sign_create_order(&CreateOrderRequest::post_only_limit(1, Side::Sell, 1, 1, true), 6)
            .await
            .expect("sign");
        assert_eq!(signer.nonces(), vec![5, 6]);
    }
}
