use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use common::{Config, ConfigLoader};
use log::{debug, info};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::social::{PollOption, Post, PostId, Social, SocialError, Visibility};

pub struct MastodonOptions {
    pub server: Option<String>,
    pub token_file: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for MastodonOptions {
    fn default() -> Self {
        Self {
            server: None,
            token_file: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config for MastodonOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            server: config.get("mastodon_server").and_then(|v| v.as_string()),
            token_file: config.get_relative_path("mastodon_token_file"),
            timeout: config
                .get("mastodon_timeout")
                .and_then(|v| v.as_u64())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        })
    }
}

impl MastodonOptions {
    pub fn has_credentials(&self) -> bool {
        self.server.is_some() && self.token_file.is_some()
    }
}

/// Mastodon REST client for statuses and polls.
pub struct MastodonClient {
    http: Client,
    server: String,
    token: String,
}

impl MastodonClient {
    pub fn new(server: &str, token: &str, timeout: Duration) -> Result<Self, SocialError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            server: server.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    pub fn from_options(options: &MastodonOptions) -> Result<Self> {
        let server = options
            .server
            .as_deref()
            .ok_or_else(|| anyhow!("mastodon_server is not configured"))?;
        let token_file = options
            .token_file
            .as_ref()
            .ok_or_else(|| anyhow!("mastodon_token_file is not configured"))?;

        let token = std::fs::read_to_string(token_file)
            .with_context(|| format!("Failed to read access token from {:?}", token_file))?;

        info!("Using Mastodon server {}", server);

        Ok(Self::new(server, &token, options.timeout)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.server, path)
    }
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
    visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    poll: Option<PollRequest<'a>>,
}

#[derive(Serialize)]
struct PollRequest<'a> {
    options: &'a [String],
    expires_in: u64,
}

#[derive(Deserialize)]
struct StatusResponse {
    id: String,
    poll: Option<PollResponse>,
}

#[derive(Deserialize)]
struct PollResponse {
    options: Vec<PollOptionResponse>,
}

#[derive(Deserialize)]
struct PollOptionResponse {
    title: String,
    votes_count: Option<u64>,
}

impl<'a> StatusRequest<'a> {
    fn from_post(post: &'a Post) -> Self {
        Self {
            status: &post.text,
            visibility: post.visibility,
            in_reply_to_id: post.in_reply_to.as_ref().map(|id| id.0.as_str()),
            poll: post.poll.as_ref().map(|poll| PollRequest {
                options: &poll.options,
                expires_in: poll.expires_in.as_secs(),
            }),
        }
    }
}

fn poll_options(id: &PostId, status: StatusResponse) -> Result<Vec<PollOption>, SocialError> {
    let poll = status.poll.ok_or_else(|| SocialError::NoPoll(id.clone()))?;

    poll.options
        .into_iter()
        .map(|option| match option.votes_count {
            Some(votes) => Ok(PollOption {
                title: option.title,
                votes,
            }),
            None => Err(SocialError::Malformed(format!(
                "votes for {:?} are hidden",
                option.title
            ))),
        })
        .collect()
}

async fn check_status(response: Response) -> Result<Response, SocialError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SocialError::Status {
        status: status.as_u16(),
        body,
    })
}

impl Social for MastodonClient {
    async fn publish(&mut self, post: &Post) -> Result<PostId, SocialError> {
        let response = self
            .http
            .post(self.url("statuses"))
            .bearer_auth(&self.token)
            .json(&StatusRequest::from_post(post))
            .send()
            .await?;

        let status: StatusResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SocialError::Malformed(e.to_string()))?;

        debug!("Published status {}", status.id);

        Ok(PostId(status.id))
    }

    async fn fetch_poll(&mut self, id: &PostId) -> Result<Vec<PollOption>, SocialError> {
        let response = self
            .http
            .get(self.url(&format!("statuses/{}", id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status: StatusResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| SocialError::Malformed(e.to_string()))?;

        poll_options(id, status)
    }
}
