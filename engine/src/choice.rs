use std::fmt::{self, Display};

use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Move, Position};
use thiserror::Error;

/// Poll label reserved for conceding the game.
pub const RESIGN_LABEL: &str = "Resign";

/// What a side does on its turn: play a move on the board or concede.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Choice {
    Move(Move),
    Resign,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("{0:?} is not valid move notation")]
    Notation(String),
    #[error("{0:?} is not a legal move in this position")]
    Illegal(String),
}

impl Choice {
    /// Human facing label: SAN (with check suffix) for moves, [`RESIGN_LABEL`] otherwise.
    pub fn label(&self, position: &Chess) -> String {
        match self {
            Choice::Move(m) => SanPlus::from_move(position.clone(), m).to_string(),
            Choice::Resign => RESIGN_LABEL.to_string(),
        }
    }

    /// Reverse of [`Choice::label`]: maps a poll label back onto the position.
    pub fn parse_label(label: &str, position: &Chess) -> Result<Self, ChoiceError> {
        let label = label.trim();
        if label.eq_ignore_ascii_case(RESIGN_LABEL) {
            return Ok(Choice::Resign);
        }

        let san: SanPlus = label
            .parse()
            .map_err(|_| ChoiceError::Notation(label.to_string()))?;

        san.san
            .to_move(position)
            .map(Choice::Move)
            .map_err(|_| ChoiceError::Illegal(label.to_string()))
    }

    /// Parses long algebraic (UCI) notation, e.g. `e2e4` or `e7e8q`.
    pub fn parse_uci(text: &str, position: &Chess) -> Result<Self, ChoiceError> {
        let uci: UciMove = text
            .trim()
            .parse()
            .map_err(|_| ChoiceError::Notation(text.to_string()))?;

        uci.to_move(position)
            .map(Choice::Move)
            .map_err(|_| ChoiceError::Illegal(text.to_string()))
    }

    pub fn as_move(&self) -> Option<&Move> {
        match self {
            Choice::Move(m) => Some(m),
            Choice::Resign => None,
        }
    }

    pub fn is_resign(&self) -> bool {
        matches!(self, Choice::Resign)
    }
}

impl From<Move> for Choice {
    fn from(m: Move) -> Self {
        Choice::Move(m)
    }
}

/// UCI text for moves, `resign` for the pseudo-move.
impl Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Move(m) => write!(f, "{}", UciMove::from_move(m, CastlingMode::Standard)),
            Choice::Resign => write!(f, "resign"),
        }
    }
}

/// Every legal move of `position` as a [`Choice`], in move generation order.
pub fn legal_choices(position: &Chess) -> Vec<Choice> {
    position.legal_moves().into_iter().map(Choice::Move).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trips_through_san() {
        let position = Chess::default();
        let e4 = Choice::parse_uci("e2e4", &position).unwrap();

        assert_eq!(e4.label(&position), "e4");
        assert_eq!(Choice::parse_label("e4", &position), Ok(e4));
    }

    #[test]
    fn test_resign_label() {
        let position = Chess::default();

        assert_eq!(Choice::Resign.label(&position), RESIGN_LABEL);
        assert_eq!(Choice::parse_label("resign", &position), Ok(Choice::Resign));
    }

    #[test]
    fn test_label_includes_check_suffix() {
        let position = Chess::default();
        let position = position.clone()
            .play(&Choice::parse_uci("e2e4", &position).unwrap().as_move().unwrap().clone())
            .unwrap();
        let position = position.clone()
            .play(&Choice::parse_uci("f7f6", &position).unwrap().as_move().unwrap().clone())
            .unwrap();
        let check = Choice::parse_uci("d1h5", &position).unwrap();

        assert_eq!(check.label(&position), "Qh5+");
        assert_eq!(Choice::parse_label("Qh5+", &position), Ok(check));
    }

    #[test]
    fn test_illegal_and_malformed_labels() {
        let position = Chess::default();

        assert_eq!(
            Choice::parse_label("e5", &position),
            Err(ChoiceError::Illegal("e5".to_string()))
        );
        assert_eq!(
            Choice::parse_label("??", &position),
            Err(ChoiceError::Notation("??".to_string()))
        );
    }

    #[test]
    fn test_display_is_uci() {
        let position = Chess::default();

        assert_eq!(Choice::parse_uci("g1f3", &position).unwrap().to_string(), "g1f3");
        assert_eq!(Choice::Resign.to_string(), "resign");
    }

    #[test]
    fn test_legal_choices_from_start() {
        assert_eq!(legal_choices(&Chess::default()).len(), 20);
    }
}
