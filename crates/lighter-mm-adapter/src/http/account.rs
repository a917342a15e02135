/*
[INPUT]:  Account index
[OUTPUT]: Account balances and per-market positions
[POS]:    HTTP layer - account endpoints
[UPDATE]: When account lookup modes or response fields change
*/

use crate::http::{LighterClient, Result};
use crate::types::AccountsResponse;
use reqwest::Method;

impl LighterClient {
    /// Fetch an account by index
    ///
    /// GET /api/v1/account?by=index&value={account_index}
    pub async fn account_by_index(&self, account_index: i64) -> Result<AccountsResponse> {
        let endpoint = format!("/api/v1/account?by=index&value={}", account_index);
        let builder = self.request(Method::GET, &endpoint)?;
        self.send_json(builder).await
    }
}
