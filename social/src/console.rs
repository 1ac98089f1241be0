use log::warn;

use super::social::{PollOption, Post, PostId, Social, SocialError};

/// Prints posts to stdout instead of publishing them.
///
/// Poll results are still read through `reader` when one is available so a dry run resolves the same vote a
/// live run would.
pub struct Console<R> {
    reader: Option<R>,
    published: u64,
}

impl<R> Console<R> {
    pub fn new(reader: Option<R>) -> Self {
        Self {
            reader,
            published: 0,
        }
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn render(post: &Post, id: &PostId) -> String {
        let mut out = format!("--- post {}", id);
        if let Some(reply_to) = &post.in_reply_to {
            out.push_str(&format!(" (reply to {})", reply_to));
        }
        out.push('\n');
        out.push_str(&post.text);

        if let Some(poll) = &post.poll {
            out.push('\n');
            for option in &poll.options {
                out.push_str(&format!("\n  [ ] {}", option));
            }
            out.push_str(&format!("\n  closes in {}s", poll.expires_in.as_secs()));
        }

        out
    }
}

impl<R: Social> Social for Console<R> {
    async fn publish(&mut self, post: &Post) -> Result<PostId, SocialError> {
        self.published += 1;
        let id = PostId(format!("debug-{}", self.published));

        println!("{}\n", Self::render(post, &id));

        Ok(id)
    }

    async fn fetch_poll(&mut self, id: &PostId) -> Result<Vec<PollOption>, SocialError> {
        match &mut self.reader {
            Some(reader) => reader.fetch_poll(id).await,
            None => {
                warn!("No credentials configured, cannot read poll {}", id);
                Err(SocialError::NoPoll(id.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MastodonClient, PollSpec};
    use std::time::Duration;

    #[tokio::test]
    async fn test_publish_numbers_posts() {
        let mut console = Console::<MastodonClient>::new(None);

        let first = console.publish(&Post::new("New Game")).await.unwrap();
        let second = console.publish(&Post::new("Choose")).await.unwrap();

        assert_eq!(first, PostId("debug-1".to_string()));
        assert_eq!(second, PostId("debug-2".to_string()));
        assert_eq!(console.published(), 2);
    }

    #[tokio::test]
    async fn test_fetch_without_reader_has_no_poll() {
        let mut console = Console::<MastodonClient>::new(None);

        let result = console.fetch_poll(&PostId("1".to_string())).await;

        assert!(matches!(result, Err(SocialError::NoPoll(_))));
    }

    #[test]
    fn test_render_poll() {
        let post = Post::new("Choose a move to play:")
            .in_reply_to(PostId("debug-1".to_string()))
            .with_poll(PollSpec {
                options: vec!["e4".to_string(), "d4".to_string()],
                expires_in: Duration::from_secs(60),
            });

        let text = Console::<MastodonClient>::render(&post, &PostId("debug-2".to_string()));

        assert_eq!(
            text,
            "--- post debug-2 (reply to debug-1)\nChoose a move to play:\n\n  [ ] e4\n  [ ] d4\n  closes in 60s"
        );
    }
}
