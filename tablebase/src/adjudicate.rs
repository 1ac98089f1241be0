use engine::DrawPolicy;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use shakmaty::fen::Fen;
use shakmaty::{Chess, EnPassantMode};
use thiserror::Error;

use super::options::AdjudicationOptions;

#[derive(Debug, Error)]
pub enum TablebaseError {
    #[error("tablebase request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected tablebase response: {0}")]
    Malformed(String),
}

/// Tablebase classification of a position for the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Win,
    Loss,
    Draw,
    /// Won, but only beyond the 50-move rule.
    CursedWin,
    /// Lost, but saved by the 50-move rule.
    BlessedLoss,
    MaybeWin,
    MaybeLoss,
    #[serde(other)]
    Unknown,
}

impl Category {
    pub fn is_draw(self, policy: DrawPolicy) -> bool {
        match self {
            Category::Draw => true,
            Category::CursedWin | Category::BlessedLoss => policy == DrawPolicy::Claim,
            _ => false,
        }
    }
}

#[derive(Deserialize)]
struct TablebaseResponse {
    category: Category,
}

/// Declares drawn endgames so games stop early.
#[allow(async_fn_in_trait)]
pub trait Adjudicate {
    /// True only when the position is known to be a theoretical draw. Failures answer false.
    async fn check_draw(&mut self, position: &Chess) -> bool;
}

impl<A: Adjudicate + ?Sized> Adjudicate for &mut A {
    async fn check_draw(&mut self, position: &Chess) -> bool {
        (**self).check_draw(position).await
    }
}

/// Lichess compatible tablebase lookup over HTTP.
pub struct TablebaseClient {
    http: Client,
    url: String,
    policy: DrawPolicy,
}

impl TablebaseClient {
    pub fn new(options: &AdjudicationOptions, policy: DrawPolicy) -> Result<Self, TablebaseError> {
        let http = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            http,
            url: options.url.clone(),
            policy,
        })
    }

    pub async fn query(&self, position: &Chess) -> Result<Category, TablebaseError> {
        let fen = Fen::from_position(position.clone(), EnPassantMode::Legal).to_string();

        let response = self
            .http
            .get(&self.url)
            .query(&[("fen", fen.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: TablebaseResponse = response
            .json()
            .await
            .map_err(|e| TablebaseError::Malformed(e.to_string()))?;

        debug!("Tablebase classifies {} as {:?}", fen, body.category);

        Ok(body.category)
    }
}

impl Adjudicate for TablebaseClient {
    async fn check_draw(&mut self, position: &Chess) -> bool {
        match self.query(position).await {
            Ok(category) => category.is_draw(self.policy),
            Err(err) => {
                warn!("Skipping adjudication. {}", err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(json: &str) -> Category {
        serde_json::from_str::<TablebaseResponse>(json)
            .unwrap()
            .category
    }

    #[test]
    fn test_parse_categories() {
        assert_eq!(
            category(r#"{"checkmate": false, "category": "draw", "dtz": 0, "moves": []}"#),
            Category::Draw
        );
        assert_eq!(category(r#"{"category": "cursed-win"}"#), Category::CursedWin);
        assert_eq!(category(r#"{"category": "syzygy-win"}"#), Category::Unknown);
    }

    #[test]
    fn test_cursed_results_need_claim_policy() {
        assert!(Category::Draw.is_draw(DrawPolicy::Automatic));
        assert!(!Category::CursedWin.is_draw(DrawPolicy::Automatic));
        assert!(Category::CursedWin.is_draw(DrawPolicy::Claim));
        assert!(Category::BlessedLoss.is_draw(DrawPolicy::Claim));
        assert!(!Category::Win.is_draw(DrawPolicy::Claim));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_not_a_draw() {
        let options = AdjudicationOptions {
            url: "http://127.0.0.1:9/standard".to_string(),
            timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        };
        let mut client = TablebaseClient::new(&options, DrawPolicy::Automatic).unwrap();

        assert!(!client.check_draw(&Chess::default()).await);
    }
}
