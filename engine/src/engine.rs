use shakmaty::Chess;
use thiserror::Error;

use super::value::Score;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("engine did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("engine protocol error: {0}")]
    Protocol(String),
}

/// Scores positions for the side to move.
///
/// `depth` is the search budget for one request. Implementations may hold an external process between calls
/// but must answer each call independently of earlier ones.
#[allow(async_fn_in_trait)]
pub trait Evaluate {
    async fn evaluate(&mut self, position: &Chess, depth: u32) -> Result<Score, EngineError>;
}

impl<E: Evaluate + ?Sized> Evaluate for &mut E {
    async fn evaluate(&mut self, position: &Chess, depth: u32) -> Result<Score, EngineError> {
        (**self).evaluate(position, depth).await
    }
}
