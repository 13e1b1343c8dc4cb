use async_trait::async_trait;
use fight_core::{Post, VoteKey};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use log::{debug, error};
use reqwest_middleware::{
    self,
    reqwest::{Method, Response, StatusCode, Url},
    ClientWithMiddleware, RequestBuilder,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::{AchievementUnlock, Caller};

#[derive(Error, Debug)]
pub enum Error {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("problem sending request to backend: {0}")]
    Send(#[from] reqwest_middleware::reqwest::Error),
    #[error("problem sending request to backend: {0}")]
    SendRetry(#[from] reqwest_middleware::Error),
    #[error("problem requesting backend: {0}")]
    Request(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("backend rejected credentials: {0}")]
    Unauthorized(String),
    #[error("backend temporarily unavailable: {0}")]
    Transient(String),
}

impl Error {
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}

/// Character catalogue entry from `GET /api/characters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe: Option<String>,
}

/// Upstream answer to a placed bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetReceipt {
    pub bet: Value,
    #[serde(default)]
    pub new_balance: Option<i64>,
}

/// The parts of the GeekFights REST api this service talks to
#[async_trait]
pub trait GeekFightsApi: Send + Sync {
    async fn get_post(&self, post_id: &str, caller: &Caller) -> Result<Post, Error>;
    async fn submit_fight_vote(
        &self,
        post_id: &str,
        choice: &VoteKey,
        caller: &Caller,
    ) -> Result<(), Error>;
    async fn place_bet(
        &self,
        post_id: &str,
        prediction: &VoteKey,
        amount: u64,
        caller: &Caller,
    ) -> Result<BetReceipt, Error>;
    async fn get_characters(&self) -> Result<Vec<Character>, Error>;
    async fn unlock_achievement(&self, unlock: &AchievementUnlock) -> Result<(), Error>;
}

#[derive(Clone)]
pub struct BackendClient {
    pub base_url: Url,
    pub client: ClientWithMiddleware,
}

impl BackendClient {
    pub fn new(client: ClientWithMiddleware, base_url: &Url) -> Self {
        Self {
            base_url: base_url.to_owned(),
            client,
        }
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Request(format!("invalid backend path {}: {}", path, e)))
    }

    fn request(&self, method: Method, url: Url, caller: Option<&Caller>) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        match caller.and_then(|c| c.token.as_deref()) {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send_request(
        &self,
        request: RequestBuilder,
        not_found_message: String,
    ) -> Result<Response, Error> {
        let response = request.send().await.map_err(|e| {
            error!("error sending to backend: {}", e);
            Error::SendRetry(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = upstream_message(&body).unwrap_or_else(|| body.clone());
        match status {
            StatusCode::NOT_FOUND => Err(Error::NotFound(not_found_message)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Unauthorized(message)),
            StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::BAD_GATEWAY
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS => Err(Error::Transient(format!(
                "error response from backend with status {}: {:?}",
                status, body
            ))),
            status if status.is_client_error() => Err(Error::BadRequest(message)),
            status => Err(Error::Request(format!(
                "error response from backend with status {}: {:?}",
                status, body
            ))),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        not_found_message: String,
    ) -> Result<T, Error> {
        let response = self.send_request(request, not_found_message).await?;
        response.json::<T>().await.map_err(Error::Send)
    }
}

/// The backend answers errors as `{"message": ..}` or `{"error": ..}`
fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

#[async_trait]
impl GeekFightsApi for BackendClient {
    async fn get_post(&self, post_id: &str, caller: &Caller) -> Result<Post, Error> {
        let url = self.url(&format!("/api/posts/{}", post_id))?;
        debug!("fetching post {}", post_id);
        let request = self.request(Method::GET, url, Some(caller));
        self.send_json(request, format!("post {} not found", post_id))
            .await
    }

    async fn submit_fight_vote(
        &self,
        post_id: &str,
        choice: &VoteKey,
        caller: &Caller,
    ) -> Result<(), Error> {
        let url = self.url(&format!("/api/posts/{}/fight-vote", post_id))?;
        let request = self
            .request(Method::POST, url, Some(caller))
            .json(&json!({ "team": choice.to_string() }));
        self.send_request(request, format!("post {} not found", post_id))
            .await?;
        Ok(())
    }

    async fn place_bet(
        &self,
        post_id: &str,
        prediction: &VoteKey,
        amount: u64,
        caller: &Caller,
    ) -> Result<BetReceipt, Error> {
        let url = self.url(&format!("/api/betting/fight/{}", post_id))?;
        let request = self.request(Method::POST, url, Some(caller)).json(&json!({
            "predictedWinner": prediction.legacy_label(),
            "betAmount": amount,
        }));
        self.send_json(request, format!("fight {} not found", post_id))
            .await
    }

    async fn get_characters(&self) -> Result<Vec<Character>, Error> {
        let url = self.url("/api/characters")?;
        let request = self.request(Method::GET, url, None);
        self.send_json(request, String::from("character list not found"))
            .await
    }

    async fn unlock_achievement(&self, unlock: &AchievementUnlock) -> Result<(), Error> {
        let url = self.url("/api/achievements/unlock")?;
        let request = self.request(Method::POST, url, None).json(unlock);
        self.send_request(
            request,
            format!("user {} not found", unlock.user_id),
        )
        .await?;
        Ok(())
    }
}
