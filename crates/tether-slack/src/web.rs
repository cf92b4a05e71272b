// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack Web API client for `auth.test` and `chat.postMessage`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tether_core::{ReplySink, TetherError};
use tracing::{debug, warn};

use crate::envelope::{AuthTestResponse, PostMessageRequest, PostMessageResponse};

/// Identity of the bot user behind a bot token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub user_id: String,
    pub user: Option<String>,
    pub team: Option<String>,
}

/// Bot-token client for the Web API.
#[derive(Debug, Clone)]
pub struct SlackWebClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl SlackWebClient {
    pub fn new(base_url: impl Into<String>, bot_token: SecretString) -> Result<Self, TetherError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TetherError::Slack {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    /// Resolve the bot's own user id.
    pub async fn auth_test(&self) -> Result<AuthIdentity, TetherError> {
        let response = self
            .http
            .post(format!("{}/auth.test", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .send()
            .await
            .map_err(request_failed)?;
        let body: AuthTestResponse = decode(response).await?;

        match (body.ok, body.user_id) {
            (true, Some(user_id)) => {
                debug!(%user_id, "resolved bot identity");
                Ok(AuthIdentity {
                    user_id,
                    user: body.user,
                    team: body.team,
                })
            }
            (true, None) => Err(TetherError::slack("auth.test returned no user_id")),
            (false, _) => Err(TetherError::slack(format!(
                "auth.test failed: {}",
                body.error.as_deref().unwrap_or("unknown_error")
            ))),
        }
    }

    /// Post a message, optionally into a thread. Returns the new message's `ts`.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<String, TetherError> {
        let request = PostMessageRequest {
            channel,
            text,
            thread_ts,
        };
        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(request_failed)?;
        let body: PostMessageResponse = decode(response).await?;

        if !body.ok {
            let error = body.error.unwrap_or_else(|| "unknown_error".to_string());
            warn!(channel, %error, "chat.postMessage rejected");
            return Err(TetherError::slack(format!("chat.postMessage failed: {error}")));
        }
        Ok(body.ts.unwrap_or_default())
    }
}

#[async_trait]
impl ReplySink for SlackWebClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<String, TetherError> {
        SlackWebClient::post_message(self, channel, text, thread_ts).await
    }
}

fn request_failed(e: reqwest::Error) -> TetherError {
    TetherError::Slack {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TetherError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TetherError::slack(format!("HTTP {}", status.as_u16())));
    }
    response.json::<T>().await.map_err(|e| TetherError::Slack {
        message: format!("failed to parse response: {e}"),
        source: Some(Box::new(e)),
    })
}
