use engine::{Choice, GameState, Side, Termination};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};
use thiserror::Error;

const PGN_LINE_WIDTH: usize = 79;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid start position {0:?}")]
    Fen(String),
    #[error("move {uci:?} at ply {ply} is not legal")]
    IllegalMove { ply: usize, uci: String },
}

/// The durable form of a game in flight: where it started and every move played since, in UCI notation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_fen: Option<String>,
    pub moves: Vec<String>,
    pub human_side: Side,
    pub round: u32,
    pub date: String,
}

/// Names written into the PGN seven tag roster.
pub struct PgnTags<'a> {
    pub event: &'a str,
    pub site: &'a str,
    pub human: &'a str,
    pub engine: &'a str,
}

impl GameRecord {
    pub fn new(human_side: Side, round: u32, date: impl Into<String>) -> Self {
        Self {
            start_fen: None,
            moves: vec![],
            human_side,
            round,
            date: date.into(),
        }
    }

    pub fn engine_side(&self) -> Side {
        self.human_side.other()
    }

    pub fn push(&mut self, m: &Move) {
        self.moves
            .push(m.to_uci(CastlingMode::Standard).to_string());
    }

    pub fn start_position(&self) -> Result<Chess, RecordError> {
        match &self.start_fen {
            None => Ok(Chess::default()),
            Some(fen) => fen
                .parse::<Fen>()
                .ok()
                .and_then(|fen| fen.into_position(CastlingMode::Standard).ok())
                .ok_or_else(|| RecordError::Fen(fen.clone())),
        }
    }

    /// Rebuilds the game by replaying every recorded move from the start position.
    pub fn replay(&self) -> Result<GameState, RecordError> {
        let mut state = GameState::new(self.start_position()?);

        for (ply, uci) in self.moves.iter().enumerate() {
            let illegal = || RecordError::IllegalMove {
                ply,
                uci: uci.clone(),
            };

            let choice = Choice::parse_uci(uci, state.position()).map_err(|_| illegal())?;
            let m = choice.as_move().ok_or_else(illegal)?.clone();
            state.play(&m);
        }

        Ok(state)
    }

    /// Renders the finished game as PGN.
    pub fn to_pgn(&self, tags: &PgnTags, termination: &Termination) -> Result<String, RecordError> {
        let (white, black) = match self.human_side {
            Side::White => (tags.human, tags.engine),
            Side::Black => (tags.engine, tags.human),
        };
        let result = termination.result();

        let mut pgn = String::new();
        let mut tag = |name: &str, value: &str| {
            pgn.push_str(&format!("[{} \"{}\"]\n", name, value.replace('"', "'")));
        };

        tag("Event", tags.event);
        tag("Site", tags.site);
        tag("Date", &self.date);
        tag("Round", &self.round.to_string());
        tag("White", white);
        tag("Black", black);
        tag("Result", result);
        if let Some(fen) = &self.start_fen {
            tag("SetUp", "1");
            tag("FEN", fen);
        }
        tag("Termination", &termination.to_string());

        let mut tokens = self.movetext()?;
        tokens.push(result.to_string());

        pgn.push('\n');
        pgn.push_str(&wrap(&tokens, PGN_LINE_WIDTH));
        pgn.push_str("\n\n");

        Ok(pgn)
    }

    fn movetext(&self) -> Result<Vec<String>, RecordError> {
        let mut position = self.start_position()?;
        let mut tokens = vec![];

        for (ply, uci) in self.moves.iter().enumerate() {
            let m = Choice::parse_uci(uci, &position)
                .ok()
                .and_then(|c| c.as_move().cloned())
                .ok_or_else(|| RecordError::IllegalMove {
                    ply,
                    uci: uci.clone(),
                })?;

            match position.turn() {
                Color::White => tokens.push(format!("{}.", position.fullmoves())),
                Color::Black if ply == 0 => tokens.push(format!("{}...", position.fullmoves())),
                Color::Black => {}
            }

            tokens.push(SanPlus::from_move_and_play_unchecked(&mut position, &m).to_string());
        }

        Ok(tokens)
    }

    pub fn current_fen(&self) -> Result<String, RecordError> {
        let state = self.replay()?;
        Ok(Fen::from_position(state.position().clone(), EnPassantMode::Legal).to_string())
    }
}

fn wrap(tokens: &[String], width: usize) -> String {
    let mut lines: Vec<String> = vec![];

    for token in tokens {
        match lines.last_mut() {
            Some(line) if line.len() + 1 + token.len() <= width => {
                line.push(' ');
                line.push_str(token);
            }
            _ => lines.push(token.clone()),
        }
    }

    lines.iter().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::DrawPolicy;

    fn record(moves: &[&str]) -> GameRecord {
        GameRecord {
            moves: moves.iter().map(|m| m.to_string()).collect(),
            ..GameRecord::new(Side::White, 3, "2024.05.01")
        }
    }

    fn tags() -> PgnTags<'static> {
        PgnTags {
            event: "Mastodon vote chess",
            site: "@votechess@botsin.space",
            human: "Mastodon",
            engine: "Computer",
        }
    }

    #[test]
    fn test_replay_reaches_recorded_position() {
        let state = record(&["e2e4", "e7e5", "g1f3"]).replay().unwrap();

        assert_eq!(state.position().turn(), Color::Black);
        assert_eq!(state.position().halfmoves(), 1);
        assert_eq!(
            record(&["e2e4", "e7e5", "g1f3"]).current_fen().unwrap(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
    }

    #[test]
    fn test_illegal_move_is_reported() {
        let result = record(&["e2e4", "e2e4"]).replay();

        assert_eq!(
            result.err(),
            Some(RecordError::IllegalMove {
                ply: 1,
                uci: "e2e4".to_string()
            })
        );
    }

    #[test]
    fn test_bad_start_fen() {
        let record = GameRecord {
            start_fen: Some("not a fen".to_string()),
            ..record(&[])
        };

        assert!(matches!(record.replay(), Err(RecordError::Fen(_))));
    }

    #[test]
    fn test_serde_round_trip_reproduces_position() {
        let original = record(&["d2d4", "g8f6", "c2c4", "e7e6", "b1c3", "f8b4"]);

        let json = serde_json::to_string(&original).unwrap();
        let restored: GameRecord = serde_json::from_str(&json).unwrap();

        let before = original.replay().unwrap();
        let after = restored.replay().unwrap();

        assert_eq!(restored, original);
        assert_eq!(before.position().turn(), after.position().turn());
        assert_eq!(before.position().halfmoves(), after.position().halfmoves());
        assert_eq!(
            before.position().legal_moves(),
            after.position().legal_moves()
        );
        assert!(!json.contains("start_fen"));
    }

    #[test]
    fn test_castling_is_recorded_in_standard_notation() {
        let mut record = record(&["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"]);
        let state = record.replay().unwrap();
        let castle = Choice::parse_uci("e1g1", state.position()).unwrap();

        record.push(castle.as_move().unwrap());

        assert_eq!(record.moves.last().unwrap(), "e1g1");
        assert!(record.replay().is_ok());
    }

    #[test]
    fn test_pgn_of_fools_mate() {
        let record = GameRecord {
            human_side: Side::Black,
            ..record(&["f2f3", "e7e5", "g2g4", "d8h4"])
        };
        let termination = record
            .replay()
            .unwrap()
            .termination(DrawPolicy::Automatic)
            .unwrap();

        let pgn = record.to_pgn(&tags(), &termination).unwrap();

        assert_eq!(
            pgn,
            "[Event \"Mastodon vote chess\"]\n\
             [Site \"@votechess@botsin.space\"]\n\
             [Date \"2024.05.01\"]\n\
             [Round \"3\"]\n\
             [White \"Computer\"]\n\
             [Black \"Mastodon\"]\n\
             [Result \"0-1\"]\n\
             [Termination \"checkmate\"]\n\
             \n\
             1. f3 e5 2. g4 Qh4# 0-1\n\n"
        );
    }

    #[test]
    fn test_pgn_from_black_to_move_setup() {
        let record = GameRecord {
            start_fen: Some("4k3/8/8/8/8/8/4P3/4K3 b - - 0 30".to_string()),
            ..record(&["e8d7", "e2e4"])
        };

        let pgn = record
            .to_pgn(&tags(), &Termination::Resignation { loser: Side::Black })
            .unwrap();

        assert!(pgn.contains("[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 30\"]\n"));
        assert!(pgn.ends_with("\n30... Kd7 31. e4 1-0\n\n"));
    }

    #[test]
    fn test_long_movetext_wraps() {
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        let moves: Vec<&str> = shuffle.iter().cycle().take(40).copied().collect();

        let pgn = record(&moves)
            .to_pgn(&tags(), &Termination::Repetition)
            .unwrap();

        assert!(pgn.lines().all(|line| line.len() <= PGN_LINE_WIDTH));
        assert!(pgn.trim_end().ends_with("1/2-1/2"));
    }
}
