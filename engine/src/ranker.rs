use log::debug;
use shakmaty::{Chess, Position};
use thiserror::Error;

use super::choice::Choice;
use super::engine::{EngineError, Evaluate};
use super::value::Score;

/// A candidate together with how it leaves the opponent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatedMove {
    pub choice: Choice,
    /// Evaluation relative to the opponent, i.e. the side to move once `choice` is played. Lower is better
    /// for the mover.
    pub score: Score,
    /// Half-move clock once `choice` is played.
    pub halfmoves: u32,
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("no candidate moves to rank")]
    NoLegalMoves,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Orders `choices` best first for the side to move in `position`.
///
/// Each move is played on a scratch copy; mates and stalemates are scored directly, every other resulting
/// position is sent to `evaluator`. Candidates are stably sorted by the opponent's score, then by the half-move
/// clock so that moves resetting the clock come first among equals. The resign pseudo-move is scored as an
/// immediate loss without consulting the evaluator.
pub async fn rank<E: Evaluate>(
    evaluator: &mut E,
    position: &Chess,
    choices: &[Choice],
    depth: u32,
) -> Result<Vec<RatedMove>, RankError> {
    if choices.is_empty() {
        return Err(RankError::NoLegalMoves);
    }

    let mut rated = Vec::with_capacity(choices.len());

    for choice in choices {
        let (score, halfmoves) = match choice {
            Choice::Resign => (Score::Mate(0), position.halfmoves()),
            Choice::Move(m) => {
                let mut after = position.clone();
                after.play_unchecked(m);

                let score = if after.is_checkmate() {
                    Score::Mated(0)
                } else if after.is_stalemate() {
                    Score::DRAW
                } else {
                    evaluator.evaluate(&after, depth).await?
                };

                (score, after.halfmoves())
            }
        };

        debug!("Rated {} at {} (clock {})", choice, score, halfmoves);

        rated.push(RatedMove {
            choice: choice.clone(),
            score,
            halfmoves,
        });
    }

    rated.sort_by(|a, b| (a.score, a.halfmoves).cmp(&(b.score, b.halfmoves)));

    Ok(rated)
}

/// Best candidate for the mover, see [`rank`].
pub async fn choose<E: Evaluate>(
    evaluator: &mut E,
    position: &Chess,
    choices: &[Choice],
    depth: u32,
) -> Result<RatedMove, RankError> {
    rank(evaluator, position, choices, depth)
        .await?
        .into_iter()
        .next()
        .ok_or(RankError::NoLegalMoves)
}

/// Whether the mover is lost badly enough to be offered resignation.
///
/// True when even the best ranked continuation leaves the opponent at least `threshold` centipawns ahead.
pub fn offers_resignation(ranked: &[RatedMove], threshold: i32) -> bool {
    ranked
        .iter()
        .find(|r| !r.choice.is_resign())
        .is_some_and(|best| best.score.centipawns() >= threshold)
}
