/*
[INPUT]:  Account/API key indices and signed transaction payloads
[OUTPUT]: Nonces and transaction hashes
[POS]:    HTTP layer - transaction endpoints
[UPDATE]: When adding batch submission or changing the form encoding
*/

use crate::http::{LighterClient, Result};
use crate::signer::SignedTx;
use crate::types::{NextNonceResponse, SendTxResponse};
use reqwest::Method;
use tracing::debug;

impl LighterClient {
    /// Next usable nonce for an API key
    ///
    /// GET /api/v1/nextNonce?account_index={account_index}&api_key_index={api_key_index}
    pub async fn next_nonce(&self, account_index: i64, api_key_index: u8) -> Result<i64> {
        let endpoint = format!(
            "/api/v1/nextNonce?account_index={}&api_key_index={}",
            account_index, api_key_index
        );
        let builder = self.request(Method::GET, &endpoint)?;
        let response: NextNonceResponse = self.send_json(builder).await?;
        Ok(response.nonce)
    }

    /// Submit a signed transaction
    ///
    /// POST /api/v1/sendTx (form: tx_type, tx_info)
    pub async fn send_tx(&self, tx: &SignedTx) -> Result<SendTxResponse> {
        let tx_type = u8::from(tx.tx_type).to_string();
        let builder = self
            .request(Method::POST, "/api/v1/sendTx")?
            .form(&[("tx_type", tx_type.as_str()), ("tx_info", tx.tx_info.as_str())]);
        let response: SendTxResponse = self.send_json(builder).await?;
        debug!(tx_type = %tx_type, tx_hash = %response.tx_hash, "transaction accepted");
        Ok(response)
    }
}
