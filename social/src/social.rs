use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            "direct" => Ok(Visibility::Direct),
            other => Err(format!("unknown visibility {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSpec {
    pub options: Vec<String>,
    pub expires_in: Duration,
}

/// A status to publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    pub text: String,
    pub in_reply_to: Option<PostId>,
    pub poll: Option<PollSpec>,
    pub visibility: Visibility,
}

impl Post {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            in_reply_to: None,
            poll: None,
            visibility: Visibility::default(),
        }
    }

    pub fn in_reply_to(mut self, id: PostId) -> Self {
        self.in_reply_to = Some(id);
        self
    }

    pub fn with_poll(mut self, poll: PollSpec) -> Self {
        self.poll = Some(poll);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollOption {
    pub title: String,
    pub votes: u64,
}

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Malformed(String),
    #[error("post {0} has no poll")]
    NoPoll(PostId),
}

/// Publishes statuses and reads poll results.
#[allow(async_fn_in_trait)]
pub trait Social {
    async fn publish(&mut self, post: &Post) -> Result<PostId, SocialError>;

    async fn fetch_poll(&mut self, id: &PostId) -> Result<Vec<PollOption>, SocialError>;
}

impl<S: Social + ?Sized> Social for &mut S {
    async fn publish(&mut self, post: &Post) -> Result<PostId, SocialError> {
        (**self).publish(post).await
    }

    async fn fetch_poll(&mut self, id: &PostId) -> Result<Vec<PollOption>, SocialError> {
        (**self).fetch_poll(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_builder() {
        let post = Post::new("Choose a move to play:")
            .in_reply_to(PostId("42".to_string()))
            .with_visibility(Visibility::Unlisted);

        assert_eq!(post.in_reply_to, Some(PostId("42".to_string())));
        assert_eq!(post.visibility, Visibility::Unlisted);
        assert!(post.poll.is_none());
    }

    #[test]
    fn test_visibility_from_str() {
        assert_eq!("Public".parse(), Ok(Visibility::Public));
        assert_eq!("direct".parse(), Ok(Visibility::Direct));
        assert!("everyone".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_post_id_serializes_as_string() {
        let json = serde_json::to_string(&PostId("109".to_string())).unwrap();

        assert_eq!(json, "\"109\"");
    }
}
