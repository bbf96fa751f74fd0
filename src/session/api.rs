//! External collaborators of the chat session and their HTTP implementation.

use super::message::{ChatMessage, SessionRecord, UsageReport, UserProfile};
use crate::error::{Result, WorkbenchError};
use crate::options::ClientConfig;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};

/// Incremental assistant text.
pub type TextStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Fetches the signed-in user and their plan.
    async fn me(&self, token: &str) -> Result<UserProfile>;
}

#[async_trait]
pub trait UsageMeter: Send + Sync {
    async fn report_usage(&self, token: &str, report: &UsageReport) -> Result<()>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, token: &str, record: &SessionRecord) -> Result<()>;

    /// `None` when no session is stored under `url_id`.
    async fn fetch_session(&self, token: &str, url_id: &str) -> Result<Option<SessionRecord>>;
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the conversation and streams the assistant's reply.
    async fn stream_chat(&self, token: &str, messages: &[ChatMessage]) -> Result<TextStream>;
}

/// REST client for the Websparks API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn with_client(http: Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

/// Maps non-success responses to errors; 401 becomes [`WorkbenchError::AuthRequired`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(WorkbenchError::AuthRequired);
    }
    let body = response.text().await.unwrap_or_default();
    let error: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    let message = error["message"]
        .as_str()
        .or_else(|| error["detail"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(WorkbenchError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AccountApi for ApiClient {
    async fn me(&self, token: &str) -> Result<UserProfile> {
        let response = self
            .http
            .get(self.url("/user/me"))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[async_trait]
impl UsageMeter for ApiClient {
    async fn report_usage(&self, token: &str, report: &UsageReport) -> Result<()> {
        let response = self
            .http
            .post(self.url("/chat/usage/"))
            .bearer_auth(token)
            .json(report)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for ApiClient {
    async fn create_session(&self, token: &str, record: &SessionRecord) -> Result<()> {
        let response = self
            .http
            .post(self.url("/content/"))
            .bearer_auth(token)
            .json(record)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn fetch_session(&self, token: &str, url_id: &str) -> Result<Option<SessionRecord>> {
        let response = self
            .http
            .get(self.url("/content-by-urlid"))
            .query(&[("urlId", url_id)])
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;
        let records: Vec<SessionRecord> = check(response).await?.json().await?;
        Ok(records.into_iter().next())
    }
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn stream_chat(&self, token: &str, messages: &[ChatMessage]) -> Result<TextStream> {
        let response = self
            .http
            .post(self.config.chat_url())
            .bearer_auth(token)
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await?;
        let response = check(response).await?;
        Ok(text_stream(response.bytes_stream()))
    }
}

/// Decodes a chunked byte body into text deltas.
///
/// A character split across chunks is held back until it completes; bytes
/// still pending when the body ends are flushed lossily. The stream ends
/// after the first error.
pub fn text_stream<S, B, E>(chunks: S) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<WorkbenchError> + Send + 'static,
{
    let state = (chunks.boxed(), Vec::<u8>::new(), false);
    futures::stream::unfold(state, |(mut chunks, mut pending, done)| async move {
        if done {
            return None;
        }
        loop {
            match chunks.next().await {
                Some(Ok(bytes)) => {
                    pending.extend_from_slice(bytes.as_ref());
                    let text = drain_utf8(&mut pending);
                    if !text.is_empty() {
                        return Some((Ok(text), (chunks, pending, false)));
                    }
                }
                Some(Err(e)) => {
                    let error: WorkbenchError = e.into();
                    return Some((Err(error), (chunks, pending, true)));
                }
                None if pending.is_empty() => return None,
                None => {
                    let tail = String::from_utf8_lossy(&pending).into_owned();
                    pending.clear();
                    return Some((Ok(tail), (chunks, pending, true)));
                }
            }
        }
    })
    .boxed()
}

/// Takes the complete UTF-8 prefix of `pending`, keeping a split trailing character.
fn drain_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending) {
        Ok(text) => {
            let out = text.to_string();
            pending.clear();
            out
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let out = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            out
        }
        Err(_) => {
            let out = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            out
        }
    }
}
