use log::warn;
use shakmaty::{Chess, Color, Position, Role};

use super::engine::{EngineError, Evaluate};
use super::value::Score;

const PIECE_VALUES: [(Role, i32); 5] = [
    (Role::Pawn, 100),
    (Role::Knight, 300),
    (Role::Bishop, 300),
    (Role::Rook, 500),
    (Role::Queen, 900),
];

/// Counts material. Deterministic and process free; answers when no engine is reachable.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterialEvaluator;

impl MaterialEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn material(position: &Chess, color: Color) -> i32 {
        let board = position.board();
        PIECE_VALUES
            .iter()
            .map(|(role, value)| (board.by_color(color) & board.by_role(*role)).count() as i32 * value)
            .sum()
    }
}

impl Evaluate for MaterialEvaluator {
    async fn evaluate(&mut self, position: &Chess, _depth: u32) -> Result<Score, EngineError> {
        if position.is_checkmate() {
            return Ok(Score::Mated(0));
        }

        if position.is_stalemate() || position.is_insufficient_material() {
            return Ok(Score::DRAW);
        }

        let us = position.turn();
        Ok(Score::Cp(
            Self::material(position, us) - Self::material(position, us.other()),
        ))
    }
}

/// Uses `primary`, answering from `secondary` whenever `primary` cannot be reached.
pub struct WithFallback<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> WithFallback<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn into_inner(self) -> (P, S) {
        (self.primary, self.secondary)
    }
}

impl<P: Evaluate, S: Evaluate> Evaluate for WithFallback<P, S> {
    async fn evaluate(&mut self, position: &Chess, depth: u32) -> Result<Score, EngineError> {
        match self.primary.evaluate(position, depth).await {
            Err(err @ (EngineError::Unavailable(_) | EngineError::Timeout(_))) => {
                warn!("Falling back to secondary evaluator. {}", err);
                self.secondary.evaluate(position, depth).await
            }
            res => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;
    use shakmaty::CastlingMode;

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    struct Down;

    impl Evaluate for Down {
        async fn evaluate(&mut self, _: &Chess, _: u32) -> Result<Score, EngineError> {
            Err(EngineError::Unavailable("no such file".to_string()))
        }
    }

    #[tokio::test]
    async fn test_start_position_is_balanced() {
        let score = MaterialEvaluator.evaluate(&Chess::default(), 1).await.unwrap();

        assert_eq!(score, Score::Cp(0));
    }

    #[tokio::test]
    async fn test_relative_to_side_to_move() {
        // White is up a queen, black to move.
        let pos = position("4k3/8/8/8/8/8/8/3QK3 b - - 0 1");

        let score = MaterialEvaluator.evaluate(&pos, 1).await.unwrap();

        assert_eq!(score, Score::Cp(-900));
    }

    #[tokio::test]
    async fn test_checkmated_side() {
        let pos = position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");

        let score = MaterialEvaluator.evaluate(&pos, 1).await.unwrap();

        assert_eq!(score, Score::Mated(0));
    }

    #[tokio::test]
    async fn test_fallback_answers_when_primary_is_down() {
        let mut evaluator = WithFallback::new(Down, MaterialEvaluator);

        let score = evaluator.evaluate(&Chess::default(), 1).await.unwrap();

        assert_eq!(score, Score::Cp(0));
    }
}
