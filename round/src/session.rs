use engine::{Side, Termination};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use social::PostId;

use super::record::GameRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub human: f32,
    pub engine: f32,
}

/// The poll published for the human side's next move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    pub post_id: PostId,
    pub labels: Vec<String>,
}

/// Everything that survives between invocations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Side the humans play in the current game, or the next one when no game is in flight.
    pub human_side: Side,
    #[serde(default)]
    pub scores: Scores,
    pub round: u32,
    #[serde(default, deserialize_with = "discard_invalid")]
    pub poll: Option<PollState>,
    #[serde(default, deserialize_with = "discard_invalid")]
    pub game: Option<GameRecord>,
    /// Set once the closing announcement went out while new games are suspended.
    #[serde(default)]
    pub closed: bool,
}

impl Session {
    pub fn new(first_human_side: Side) -> Self {
        Self {
            human_side: first_human_side,
            scores: Scores::default(),
            round: 1,
            poll: None,
            game: None,
            closed: false,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.game.is_some()
    }

    /// Scores a finished game, clears it and hands the humans the other colour for the next one.
    pub fn finish_game(&mut self, termination: &Termination) {
        let human_side = self
            .game
            .as_ref()
            .map(|game| game.human_side)
            .unwrap_or(self.human_side);

        match termination.winner() {
            Some(winner) if winner == human_side => self.scores.human += 1.0,
            Some(_) => self.scores.engine += 1.0,
            None => {
                self.scores.human += 0.5;
                self.scores.engine += 0.5;
            }
        }

        self.game = None;
        self.poll = None;
        self.human_side = human_side.other();
        self.round += 1;
    }
}

/// A field that no longer parses is dropped so the scores and round survive it.
fn discard_invalid<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;

    match serde_json::from_value(value) {
        Ok(field) => Ok(field),
        Err(err) => {
            warn!("Discarding unreadable session field. {}", err);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in_game(human_side: Side) -> Session {
        Session {
            game: Some(GameRecord::new(human_side, 1, "2024.01.01")),
            poll: Some(PollState {
                post_id: PostId("5".to_string()),
                labels: vec!["e4".to_string()],
            }),
            ..Session::new(human_side)
        }
    }

    #[test]
    fn test_human_win() {
        let mut session = session_in_game(Side::Black);

        session.finish_game(&Termination::Checkmate {
            winner: Side::Black,
        });

        assert_eq!(
            session.scores,
            Scores {
                human: 1.0,
                engine: 0.0
            }
        );
        assert_eq!(session.human_side, Side::White);
        assert_eq!(session.round, 2);
        assert!(session.game.is_none());
        assert!(session.poll.is_none());
    }

    #[test]
    fn test_human_resignation_scores_engine() {
        let mut session = session_in_game(Side::White);

        session.finish_game(&Termination::Resignation { loser: Side::White });

        assert_eq!(session.scores.engine, 1.0);
        assert_eq!(session.scores.human, 0.0);
        assert_eq!(session.human_side, Side::Black);
    }

    #[test]
    fn test_draw_splits_point() {
        let mut session = session_in_game(Side::White);

        session.finish_game(&Termination::Adjudicated);

        assert_eq!(
            session.scores,
            Scores {
                human: 0.5,
                engine: 0.5
            }
        );
    }

    #[test]
    fn test_colour_alternates_every_game() {
        let mut session = Session::new(Side::White);
        let mut sides = vec![];

        for _ in 0..4 {
            session.game = Some(GameRecord::new(session.human_side, session.round, "2024.01.01"));
            sides.push(session.human_side);
            session.finish_game(&Termination::Stalemate);
        }

        assert_eq!(
            sides,
            vec![Side::White, Side::Black, Side::White, Side::Black]
        );
        assert_eq!(session.round, 5);
    }

    #[test]
    fn test_minimal_json_loads() {
        let session: Session =
            serde_json::from_str(r#"{"human_side": "black", "round": 7}"#).unwrap();

        assert_eq!(session.human_side, Side::Black);
        assert_eq!(session.round, 7);
        assert!(!session.in_flight());
        assert!(!session.closed);
    }

    #[test]
    fn test_unreadable_game_keeps_scores() {
        let session: Session = serde_json::from_str(
            r#"{
                "human_side": "white",
                "scores": { "human": 2.5, "engine": 1.5 },
                "round": 5,
                "poll": { "post_id": 12 },
                "game": { "moves": 3 }
            }"#,
        )
        .unwrap();

        assert_eq!(
            session.scores,
            Scores {
                human: 2.5,
                engine: 1.5
            }
        );
        assert_eq!(session.round, 5);
        assert!(session.poll.is_none());
        assert!(session.game.is_none());
    }

    #[test]
    fn test_null_game_is_none() {
        let session: Session =
            serde_json::from_str(r#"{"human_side": "white", "round": 2, "game": null}"#).unwrap();

        assert!(session.game.is_none());
    }
}
