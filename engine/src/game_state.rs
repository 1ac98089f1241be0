use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Chess, EnPassantMode, Move, Position};

use super::players::Side;

/// Which repetition and move-count thresholds end a game by themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawPolicy {
    /// Fivefold repetition and the 75-move rule.
    #[default]
    Automatic,
    /// Threefold repetition and the 50-move rule are claimed as soon as they occur.
    Claim,
}

impl DrawPolicy {
    pub fn repetitions(self) -> usize {
        match self {
            DrawPolicy::Automatic => 5,
            DrawPolicy::Claim => 3,
        }
    }

    pub fn halfmoves(self) -> u32 {
        match self {
            DrawPolicy::Automatic => 150,
            DrawPolicy::Claim => 100,
        }
    }
}

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Checkmate { winner: Side },
    Stalemate,
    InsufficientMaterial,
    Repetition,
    MoveRule,
    Adjudicated,
    Resignation { loser: Side },
}

impl Termination {
    pub fn winner(&self) -> Option<Side> {
        match *self {
            Termination::Checkmate { winner } => Some(winner),
            Termination::Resignation { loser } => Some(loser.other()),
            _ => None,
        }
    }

    /// PGN result token.
    pub fn result(&self) -> &'static str {
        match self.winner() {
            Some(Side::White) => "1-0",
            Some(Side::Black) => "0-1",
            None => "1/2-1/2",
        }
    }

    /// Draws that arise from rules a player could claim, as opposed to stalemate or adjudication.
    pub fn is_claimed_draw(&self) -> bool {
        matches!(
            self,
            Termination::InsufficientMaterial | Termination::Repetition | Termination::MoveRule
        )
    }
}

impl Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Checkmate { .. } => write!(f, "checkmate"),
            Termination::Stalemate => write!(f, "stalemate"),
            Termination::InsufficientMaterial => write!(f, "insufficient material"),
            Termination::Repetition => write!(f, "repetition"),
            Termination::MoveRule => write!(f, "move rule"),
            Termination::Adjudicated => write!(f, "tablebase adjudication"),
            Termination::Resignation { .. } => write!(f, "resignation"),
        }
    }
}

/// A position together with the hashes of every position that led to it.
#[derive(Clone, Debug)]
pub struct GameState {
    position: Chess,
    history: Vec<u64>,
}

impl GameState {
    pub fn new(position: Chess) -> Self {
        let history = vec![hash(&position)];
        Self { position, history }
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Applies `m`, which must be legal in the current position.
    pub fn play(&mut self, m: &Move) {
        self.position.play_unchecked(m);
        self.history.push(hash(&self.position));
    }

    /// How many times the current position has occurred, itself included.
    pub fn repetitions(&self) -> usize {
        let current = self.history.last().copied();
        self.history.iter().filter(|h| Some(**h) == current).count()
    }

    /// Rule based end of game: mate, stalemate, dead position, repetition or the move-count rule.
    pub fn termination(&self, policy: DrawPolicy) -> Option<Termination> {
        let position = &self.position;

        if position.is_checkmate() {
            return Some(Termination::Checkmate {
                winner: Side::from(position.turn().other()),
            });
        }

        if position.is_stalemate() {
            return Some(Termination::Stalemate);
        }

        if position.is_insufficient_material() {
            return Some(Termination::InsufficientMaterial);
        }

        if self.repetitions() >= policy.repetitions() {
            return Some(Termination::Repetition);
        }

        if position.halfmoves() >= policy.halfmoves() {
            return Some(Termination::MoveRule);
        }

        None
    }
}

fn hash(position: &Chess) -> u64 {
    let Zobrist64(hash) = position.zobrist_hash(EnPassantMode::Legal);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Choice;
    use shakmaty::fen::Fen;
    use shakmaty::CastlingMode;

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    fn play_uci(state: &mut GameState, moves: &[&str]) {
        for m in moves {
            let choice = Choice::parse_uci(m, state.position()).unwrap();
            state.play(choice.as_move().unwrap());
        }
    }

    #[test]
    fn test_fools_mate() {
        let mut state = GameState::new(Chess::default());
        play_uci(&mut state, &["f2f3", "e7e5", "g2g4", "d8h4"]);

        let termination = state.termination(DrawPolicy::Automatic);

        assert_eq!(
            termination,
            Some(Termination::Checkmate {
                winner: Side::Black
            })
        );
        assert_eq!(termination.unwrap().result(), "0-1");
    }

    #[test]
    fn test_stalemate() {
        let state = GameState::new(position("8/8/8/8/8/6q1/5k2/7K w - - 0 1"));

        assert_eq!(
            state.termination(DrawPolicy::Automatic),
            Some(Termination::Stalemate)
        );
    }

    #[test]
    fn test_insufficient_material() {
        let state = GameState::new(position("8/8/8/4k3/8/8/8/4K3 w - - 0 1"));

        let termination = state.termination(DrawPolicy::Automatic).unwrap();

        assert_eq!(termination, Termination::InsufficientMaterial);
        assert!(termination.is_claimed_draw());
        assert_eq!(termination.result(), "1/2-1/2");
    }

    #[test]
    fn test_threefold_only_ends_game_when_claiming() {
        let mut state = GameState::new(Chess::default());
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        play_uci(&mut state, &shuffle);
        play_uci(&mut state, &shuffle);

        assert_eq!(state.repetitions(), 3);
        assert_eq!(state.termination(DrawPolicy::Automatic), None);
        assert_eq!(
            state.termination(DrawPolicy::Claim),
            Some(Termination::Repetition)
        );

        play_uci(&mut state, &shuffle);
        play_uci(&mut state, &shuffle);

        assert_eq!(
            state.termination(DrawPolicy::Automatic),
            Some(Termination::Repetition)
        );
    }

    #[test]
    fn test_move_rule_thresholds() {
        let fifty = GameState::new(position("4k3/8/8/8/8/8/8/R3K3 w - - 100 80"));
        let seventy_five = GameState::new(position("4k3/8/8/8/8/8/8/R3K3 w - - 150 100"));

        assert_eq!(fifty.termination(DrawPolicy::Automatic), None);
        assert_eq!(
            fifty.termination(DrawPolicy::Claim),
            Some(Termination::MoveRule)
        );
        assert_eq!(
            seventy_five.termination(DrawPolicy::Automatic),
            Some(Termination::MoveRule)
        );
    }

    #[test]
    fn test_resignation_winner() {
        let termination = Termination::Resignation { loser: Side::White };

        assert_eq!(termination.winner(), Some(Side::Black));
        assert_eq!(termination.result(), "0-1");
        assert!(!termination.is_claimed_draw());
    }
}
