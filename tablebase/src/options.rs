use std::time::Duration;

use anyhow::Result;
use common::{Config, ConfigLoader};
use shakmaty::{Chess, Position};

pub struct AdjudicationOptions {
    pub enabled: bool,
    pub url: String,
    pub timeout: Duration,
    pub max_pieces: usize,
    pub min_halfmoves: u32,
    pub max_fresh_halfmoves: u32,
}

impl Default for AdjudicationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://tablebase.lichess.ovh/standard".to_string(),
            timeout: Duration::from_secs(10),
            max_pieces: 8,
            min_halfmoves: 20,
            max_fresh_halfmoves: 0,
        }
    }
}

impl Config for AdjudicationOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            enabled: config
                .get("adjudicate")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.enabled),
            url: config
                .get("tablebase_url")
                .and_then(|v| v.as_string())
                .unwrap_or(defaults.url),
            timeout: config
                .get("tablebase_timeout")
                .and_then(|v| v.as_u64())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_pieces: config
                .get("adjudicate_max_pieces")
                .and_then(|v| v.as_usize())
                .unwrap_or(defaults.max_pieces),
            min_halfmoves: config
                .get("adjudicate_min_halfmoves")
                .and_then(|v| v.as_u32())
                .unwrap_or(defaults.min_halfmoves),
            max_fresh_halfmoves: config
                .get("adjudicate_max_fresh_halfmoves")
                .and_then(|v| v.as_u32())
                .unwrap_or(defaults.max_fresh_halfmoves),
        })
    }
}

impl AdjudicationOptions {
    /// Whether `position` is worth a tablebase query: few pieces left, and a clock that is either long
    /// running or freshly reset.
    pub fn is_eligible(&self, position: &Chess) -> bool {
        if !self.enabled {
            return false;
        }

        let pieces = position.board().occupied().count();
        let halfmoves = position.halfmoves();

        pieces <= self.max_pieces
            && (halfmoves >= self.min_halfmoves || halfmoves <= self.max_fresh_halfmoves)
    }
}
