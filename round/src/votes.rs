use engine::{legal_choices, rank, Choice, ChoiceError, Evaluate, RankError};
use itertools::Itertools;
use log::{info, warn};
use shakmaty::Chess;
use social::{Social, SocialError};
use thiserror::Error;

use super::session::PollState;

/// How the human move of a round was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOrigin {
    /// A single option won the poll outright.
    Poll,
    /// Several options tied and the ranker picked among them.
    TieBreak,
    /// No usable poll; the ranker picked among all legal moves.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote {
    pub choice: Choice,
    pub origin: VoteOrigin,
}

#[derive(Debug, Error)]
enum TallyError {
    #[error("no poll pending")]
    NoPoll,
    #[error("poll has no options")]
    Empty,
    #[error(transparent)]
    Fetch(#[from] SocialError),
    #[error("poll options {found:?} do not match the published {expected:?}")]
    Stale {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error(transparent)]
    Label(#[from] ChoiceError),
}

/// Turns the pending poll into exactly one choice for the human side.
pub struct VoteCollector<'a, E, S> {
    evaluator: &'a mut E,
    social: &'a mut S,
    depth: u32,
}

impl<'a, E: Evaluate, S: Social> VoteCollector<'a, E, S> {
    pub fn new(evaluator: &'a mut E, social: &'a mut S, depth: u32) -> Self {
        Self {
            evaluator,
            social,
            depth,
        }
    }

    /// Reads the poll and returns the winning choice, breaking ties with the ranker.
    ///
    /// A missing, unreachable, stale or unparsable poll is not an error: the best ranked legal move is
    /// played instead. Only engine failures while ranking propagate.
    pub async fn resolve(
        &mut self,
        position: &Chess,
        poll: Option<&PollState>,
    ) -> Result<Vote, RankError> {
        let winners = match self.tally(position, poll).await {
            Ok(winners) => winners,
            Err(TallyError::NoPoll) => {
                info!("No poll pending, choosing the move automatically");
                return self.fallback(position).await;
            }
            Err(err) => {
                warn!("Ignoring poll. {}", err);
                return self.fallback(position).await;
            }
        };

        if let [winner] = winners.as_slice() {
            info!("Poll winner {}", winner);
            return Ok(Vote {
                choice: winner.clone(),
                origin: VoteOrigin::Poll,
            });
        }

        info!("Poll tied between {}", winners.iter().join(", "));

        let best = engine::choose(&mut *self.evaluator, position, &winners, self.depth).await?;

        Ok(Vote {
            choice: best.choice,
            origin: VoteOrigin::TieBreak,
        })
    }

    /// The ranker's top choice among every legal move.
    pub async fn fallback(&mut self, position: &Chess) -> Result<Vote, RankError> {
        let choices = legal_choices(position);
        let ranked = rank(&mut *self.evaluator, position, &choices, self.depth).await?;
        let best = ranked.into_iter().next().ok_or(RankError::NoLegalMoves)?;

        Ok(Vote {
            choice: best.choice,
            origin: VoteOrigin::Fallback,
        })
    }

    async fn tally(
        &mut self,
        position: &Chess,
        poll: Option<&PollState>,
    ) -> Result<Vec<Choice>, TallyError> {
        let poll = poll.ok_or(TallyError::NoPoll)?;
        let options = self.social.fetch_poll(&poll.post_id).await?;
        if options.is_empty() {
            return Err(TallyError::Empty);
        }

        let found: Vec<String> = options.iter().map(|o| o.title.clone()).collect();
        if found.iter().sorted().ne(poll.labels.iter().sorted()) {
            return Err(TallyError::Stale {
                expected: poll.labels.clone(),
                found,
            });
        }

        let max_votes = options.iter().map(|o| o.votes).max().unwrap_or(0);

        options
            .iter()
            .filter(|o| o.votes == max_votes)
            .map(|o| Choice::parse_label(&o.title, position).map_err(TallyError::from))
            .collect()
    }
}
