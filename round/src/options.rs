use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use common::{Config, ConfigLoader};
use engine::{DrawPolicy, Side};
use social::Visibility;
use tablebase::AdjudicationOptions;

pub struct RoundOptions {
    pub human_name: String,
    pub engine_name: String,
    pub human_depth: u32,
    pub engine_depth: u32,
    pub first_human_side: Side,
    pub book_path: Option<PathBuf>,
    pub book_max_fullmove: u32,
    pub book_options: usize,
    pub poll_length: Duration,
    pub post_pause: Duration,
    pub poll_options: usize,
    pub resign_threshold: i32,
    pub engine_resign_threshold: Option<i32>,
    pub draw_policy: DrawPolicy,
    pub no_new_game: bool,
    pub event: String,
    pub site: String,
    pub visibility: Visibility,
    pub adjudication: AdjudicationOptions,
    pub display: DisplayOptions,
}

impl Default for RoundOptions {
    fn default() -> Self {
        Self {
            human_name: "Mastodon".to_string(),
            engine_name: "Computer".to_string(),
            human_depth: 10,
            engine_depth: 10,
            first_human_side: Side::White,
            book_path: None,
            book_max_fullmove: 10,
            book_options: 2,
            poll_length: Duration::from_secs(3540),
            post_pause: Duration::from_secs(50),
            poll_options: 4,
            resign_threshold: 500,
            engine_resign_threshold: None,
            draw_policy: DrawPolicy::Automatic,
            no_new_game: false,
            event: "Mastodon vote chess".to_string(),
            site: String::new(),
            visibility: Visibility::Public,
            adjudication: AdjudicationOptions::default(),
            display: DisplayOptions::default(),
        }
    }
}

impl Config for RoundOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let defaults = Self::default();

        let first_human_side = match config.get("first_human_side").and_then(|v| v.as_string()) {
            Some(side) => side.parse().map_err(|e: String| anyhow!(e))?,
            None => defaults.first_human_side,
        };

        let visibility = match config.get("visibility").and_then(|v| v.as_string()) {
            Some(visibility) => visibility.parse().map_err(|e: String| anyhow!(e))?,
            None => defaults.visibility,
        };

        let claim_draws = config
            .get("claim_draws")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(Self {
            human_name: config
                .get("human_name")
                .and_then(|v| v.as_string())
                .unwrap_or(defaults.human_name),
            engine_name: config
                .get("engine_name")
                .and_then(|v| v.as_string())
                .unwrap_or(defaults.engine_name),
            human_depth: config
                .get("human_depth")
                .and_then(|v| v.as_u32())
                .unwrap_or(defaults.human_depth),
            engine_depth: config
                .get("engine_depth")
                .and_then(|v| v.as_u32())
                .unwrap_or(defaults.engine_depth),
            first_human_side,
            book_path: config.get_relative_path("book_path"),
            book_max_fullmove: config
                .get("book_max_fullmove")
                .and_then(|v| v.as_u32())
                .unwrap_or(defaults.book_max_fullmove),
            book_options: config
                .get("book_options")
                .and_then(|v| v.as_usize())
                .unwrap_or(defaults.book_options),
            poll_length: config
                .get("poll_length")
                .and_then(|v| v.as_u64())
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_length),
            post_pause: config
                .get("post_pause")
                .and_then(|v| v.as_u64())
                .map(Duration::from_secs)
                .unwrap_or(defaults.post_pause),
            poll_options: config
                .get("poll_options")
                .and_then(|v| v.as_usize())
                .unwrap_or(defaults.poll_options),
            resign_threshold: config
                .get("resign_threshold")
                .and_then(|v| v.as_i32())
                .unwrap_or(defaults.resign_threshold),
            engine_resign_threshold: config
                .get("engine_resign_threshold")
                .and_then(|v| v.as_i32()),
            draw_policy: if claim_draws {
                DrawPolicy::Claim
            } else {
                DrawPolicy::Automatic
            },
            no_new_game: config
                .get("no_new_game")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.no_new_game),
            event: config
                .get("event")
                .and_then(|v| v.as_string())
                .unwrap_or(defaults.event),
            site: config
                .get("site")
                .and_then(|v| v.as_string())
                .unwrap_or(defaults.site),
            visibility,
            adjudication: AdjudicationOptions::load(config)?,
            display: DisplayOptions::load(config)?,
        })
    }
}

pub struct DisplayOptions {
    /// Draw the board from the human side's point of view.
    pub flip: bool,
    pub coordinates: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            flip: true,
            coordinates: true,
        }
    }
}

impl Config for DisplayOptions {
    fn load(config: &ConfigLoader) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            flip: config
                .get("board_flip")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.flip),
            coordinates: config
                .get("board_coordinates")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.coordinates),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(contents: &str) -> Result<RoundOptions> {
        ConfigLoader::from_str(contents, "votechess".to_string())?.load()
    }

    #[test]
    fn test_defaults() {
        let options = load("votechess {}").unwrap();

        assert_eq!(options.human_name, "Mastodon");
        assert_eq!(options.human_depth, 10);
        assert_eq!(options.first_human_side, Side::White);
        assert_eq!(options.poll_length, Duration::from_secs(3540));
        assert_eq!(options.post_pause, Duration::from_secs(50));
        assert_eq!(options.poll_options, 4);
        assert_eq!(options.resign_threshold, 500);
        assert_eq!(options.engine_resign_threshold, None);
        assert_eq!(options.draw_policy, DrawPolicy::Automatic);
        assert!(options.book_path.is_none());
        assert!(options.display.flip);
        assert_eq!(options.adjudication.max_pieces, 8);
    }

    #[test]
    fn test_scoped_values_win_over_root() {
        let options = load(
            r#"
            human_depth = 4
            votechess {
                human_depth = 12
                first_human_side = "black"
                claim_draws = true
                book_path = "books/gm2001.bin"
                engine_resign_threshold = 900
                board_coordinates = false
            }"#,
        )
        .unwrap();

        assert_eq!(options.human_depth, 12);
        assert_eq!(options.first_human_side, Side::Black);
        assert_eq!(options.draw_policy, DrawPolicy::Claim);
        assert_eq!(options.book_path, Some(PathBuf::from("./books/gm2001.bin")));
        assert_eq!(options.engine_resign_threshold, Some(900));
        assert!(!options.display.coordinates);
    }

    #[test]
    fn test_invalid_side_is_an_error() {
        assert!(load(r#"votechess { first_human_side = "green" }"#).is_err());
    }
}
