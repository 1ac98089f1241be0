use anyhow::{Context, Result};
use book::OpeningBook;
use engine::{
    legal_choices, offers_resignation, rank, Choice, Evaluate, GameState, RankError, Termination,
    RESIGN_LABEL,
};
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use shakmaty::{Chess, Move, Position};
use social::{PollSpec, Post, Social};
use tablebase::Adjudicate;

use super::announce::{
    closing_message, game_over_message, numbered_san, only_move_message, poll_prompt,
    round_message,
};
use super::options::RoundOptions;
use super::record::{GameRecord, PgnTags};
use super::session::{PollState, Session};
use super::votes::VoteCollector;

/// What a single invocation did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    NewGame,
    Continued { human: String, engine: String },
    GameOver(Termination),
    /// New games are suspended and the closing announcement was posted.
    Closed,
    /// Nothing to do.
    Idle,
}

/// The state to persist after a round, plus a finished game to archive.
#[derive(Debug)]
pub struct RoundReport {
    pub session: Session,
    pub archive: Option<String>,
    pub outcome: Outcome,
}

/// Advances the game by one round: resolves the human vote, answers with the engine, detects the end of the
/// game and publishes the next poll.
pub struct RoundController<'a, E, S, A, R> {
    options: &'a RoundOptions,
    evaluator: E,
    social: S,
    adjudicator: A,
    book: Option<OpeningBook>,
    rng: R,
    today: String,
}

impl<'a, E, S, A, R> RoundController<'a, E, S, A, R>
where
    E: Evaluate,
    S: Social,
    A: Adjudicate,
    R: Rng,
{
    pub fn new(
        options: &'a RoundOptions,
        evaluator: E,
        social: S,
        adjudicator: A,
        book: Option<OpeningBook>,
        rng: R,
    ) -> Self {
        Self {
            options,
            evaluator,
            social,
            adjudicator,
            book,
            rng,
            today: chrono::Local::now().format("%Y.%m.%d").to_string(),
        }
    }

    pub async fn run(&mut self, mut session: Session) -> Result<RoundReport> {
        if session.closed {
            if self.options.no_new_game {
                info!("New games are suspended, nothing to do");
                return Ok(report(session, None, Outcome::Idle));
            }

            info!("New games are enabled again");
            session.closed = false;
        }

        let mut archive = None;
        let mut in_flight = None;

        if let Some(record) = session.game.clone() {
            match record.replay() {
                Err(err) => {
                    warn!("Discarding unreadable game. {}", err);
                    session.game = None;
                    session.poll = None;
                }
                Ok(state) => match state.termination(self.options.draw_policy) {
                    Some(termination) => {
                        warn!("Persisted game already ended by {}, archiving it", termination);
                        archive = Some(record.to_pgn(&self.tags(), &termination)?);
                        session.finish_game(&termination);
                    }
                    None => in_flight = Some((record, state)),
                },
            }
        }

        match in_flight {
            Some((record, state)) => self.play_round(session, record, state).await,
            None if self.options.no_new_game => self.close(session, archive).await,
            None => self.start_game(session, archive).await,
        }
    }

    async fn start_game(&mut self, mut session: Session, archive: Option<String>) -> Result<RoundReport> {
        let mut record = GameRecord::new(session.human_side, session.round, self.today.clone());
        let mut state = GameState::new(Chess::default());

        info!(
            "Starting game {}, the humans play {}",
            record.round, record.human_side
        );

        let mut engine_label = None;

        if state.position().turn() == record.engine_side().color() {
            if let Choice::Move(m) = self.engine_choice(&state, false).await? {
                engine_label = Some(play(&mut record, &mut state, &m));
            }
        }

        let poll = self
            .publish_vote(&state, &record, None, engine_label.as_deref())
            .await?;

        session.game = Some(record);
        session.poll = poll;

        Ok(report(session, archive, Outcome::NewGame))
    }

    async fn play_round(
        &mut self,
        mut session: Session,
        mut record: GameRecord,
        mut state: GameState,
    ) -> Result<RoundReport> {
        let policy = self.options.draw_policy;
        let human_side = record.human_side;
        let legal = legal_choices(state.position());

        let choice = match legal.as_slice() {
            [only] => {
                info!("Only one legal move, playing {}", only);
                only.clone()
            }
            _ => {
                VoteCollector::new(&mut self.evaluator, &mut self.social, self.options.human_depth)
                    .resolve(state.position(), session.poll.as_ref())
                    .await?
                    .choice
            }
        };

        session.poll = None;

        let human_move = match choice {
            Choice::Move(m) => m,
            Choice::Resign => {
                info!("The humans resign");
                let termination = Termination::Resignation { loser: human_side };
                return self
                    .game_over(session, record, &state, termination, RESIGN_LABEL, None)
                    .await;
            }
        };

        let human_label = play(&mut record, &mut state, &human_move);
        info!("Humans play {}", human_label);

        if let Some(termination) = state.termination(policy) {
            return self
                .game_over(session, record, &state, termination, &human_label, None)
                .await;
        }

        let engine_move = match self.engine_choice(&state, true).await? {
            Choice::Move(m) => m,
            Choice::Resign => {
                info!("The computer resigns");
                let termination = Termination::Resignation {
                    loser: human_side.other(),
                };
                return self
                    .game_over(session, record, &state, termination, &human_label, None)
                    .await;
            }
        };

        let engine_label = play(&mut record, &mut state, &engine_move);
        info!("Computer plays {}", engine_label);

        if let Some(termination) = state.termination(policy) {
            return self
                .game_over(
                    session,
                    record,
                    &state,
                    termination,
                    &engine_label,
                    Some(&human_label),
                )
                .await;
        }

        if self.options.adjudication.is_eligible(state.position())
            && self.adjudicator.check_draw(state.position()).await
        {
            info!("Tablebase adjudicates a draw");
            return self
                .game_over(
                    session,
                    record,
                    &state,
                    Termination::Adjudicated,
                    &engine_label,
                    Some(&human_label),
                )
                .await;
        }

        let poll = self
            .publish_vote(&state, &record, Some(&human_label), Some(&engine_label))
            .await?;

        session.game = Some(record);
        session.poll = poll;

        Ok(report(
            session,
            None,
            Outcome::Continued {
                human: human_label,
                engine: engine_label,
            },
        ))
    }

    /// Book move while inside the opening window, otherwise the ranker's top pick. With `allow_resign` the
    /// computer concedes when its best continuation still leaves the humans far ahead.
    async fn engine_choice(&mut self, state: &GameState, allow_resign: bool) -> Result<Choice> {
        let position = state.position();

        if let Some(m) = self.book_moves(position, 1).into_iter().next() {
            info!("Computer plays from the book");
            return Ok(Choice::Move(m));
        }

        let choices = legal_choices(position);
        let ranked = rank(
            &mut self.evaluator,
            position,
            &choices,
            self.options.engine_depth,
        )
        .await?;

        if let Some(threshold) = self.options.engine_resign_threshold {
            if allow_resign && offers_resignation(&ranked, threshold) {
                return Ok(Choice::Resign);
            }
        }

        let best = ranked.into_iter().next().ok_or(RankError::NoLegalMoves)?;

        Ok(best.choice)
    }

    fn book_moves(&mut self, position: &Chess, count: usize) -> Vec<Move> {
        match &self.book {
            Some(book) if position.fullmoves().get() <= self.options.book_max_fullmove => {
                book.sample(position, count, &mut self.rng)
            }
            _ => vec![],
        }
    }

    /// Candidate replies for the humans: book moves first, then the ranker's best, shuffled. Everything is
    /// listed when there are only a few legal moves. Resignation leads the list when the humans are lost.
    async fn poll_choices(&mut self, position: &Chess, legal: &[Choice]) -> Result<Vec<Choice>> {
        let max_options = self.options.poll_options;
        let ranked = rank(
            &mut self.evaluator,
            position,
            legal,
            self.options.human_depth,
        )
        .await?;

        let mut options: Vec<Choice> = if legal.len() <= max_options {
            legal.to_vec()
        } else {
            let book = self
                .book_moves(position, self.options.book_options)
                .into_iter()
                .map(Choice::Move);
            let best = ranked.iter().map(|r| r.choice.clone());

            let mut options = vec![];
            for choice in book.chain(best) {
                if options.len() == max_options {
                    break;
                }
                if !options.contains(&choice) {
                    options.push(choice);
                }
            }
            options
        };

        options.shuffle(&mut self.rng);

        if offers_resignation(&ranked, self.options.resign_threshold) {
            info!("Offering resignation");
            options.insert(0, Choice::Resign);
        }

        Ok(options)
    }

    /// Posts the round summary followed by the poll, or by a notice when only one move is legal. Candidates are
    /// ranked before anything is posted so a failing engine leaves no partial announcement behind.
    async fn publish_vote(
        &mut self,
        state: &GameState,
        record: &GameRecord,
        human_label: Option<&str>,
        engine_label: Option<&str>,
    ) -> Result<Option<PollState>> {
        let position = state.position();
        let visibility = self.options.visibility;
        let legal = legal_choices(position);

        let only_move = match legal.as_slice() {
            [Choice::Move(only)] => Some(numbered_san(position, only)),
            _ => None,
        };

        let labels: Vec<String> = match only_move {
            Some(_) => vec![],
            None => self
                .poll_choices(position, &legal)
                .await?
                .iter()
                .map(|c| c.label(position))
                .collect(),
        };

        let summary = round_message(
            human_label,
            engine_label,
            position,
            record.human_side,
            &self.options.display,
        );
        let summary_id = self
            .social
            .publish(&Post::new(summary).with_visibility(visibility))
            .await
            .context("Failed to post the round summary")?;

        self.pause().await;

        if let Some(only_move) = only_move {
            self.social
                .publish(
                    &Post::new(only_move_message(&only_move))
                        .in_reply_to(summary_id)
                        .with_visibility(visibility),
                )
                .await
                .context("Failed to post the only move notice")?;

            return Ok(None);
        }

        let post = Post::new(poll_prompt(engine_label))
            .in_reply_to(summary_id)
            .with_poll(PollSpec {
                options: labels.clone(),
                expires_in: self.options.poll_length,
            })
            .with_visibility(visibility);

        let post_id = self
            .social
            .publish(&post)
            .await
            .context("Failed to post the poll")?;

        info!("Published poll {} with {}", post_id, labels.join(", "));

        Ok(Some(PollState { post_id, labels }))
    }

    async fn game_over(
        &mut self,
        mut session: Session,
        record: GameRecord,
        state: &GameState,
        termination: Termination,
        last_move: &str,
        reply_to: Option<&str>,
    ) -> Result<RoundReport> {
        info!("Game over by {}, {}", termination, termination.result());

        let text = game_over_message(
            &termination,
            last_move,
            reply_to,
            state.position(),
            record.human_side,
            &self.options.display,
        );
        self.social
            .publish(&Post::new(text).with_visibility(self.options.visibility))
            .await
            .context("Failed to post the result")?;

        let archive = record.to_pgn(&self.tags(), &termination)?;

        session.game = Some(record);
        session.finish_game(&termination);

        Ok(report(session, Some(archive), Outcome::GameOver(termination)))
    }

    async fn close(&mut self, mut session: Session, archive: Option<String>) -> Result<RoundReport> {
        info!("Not starting a new game");

        let text = closing_message(
            &session.scores,
            &self.options.human_name,
            &self.options.engine_name,
        );
        self.social
            .publish(&Post::new(text).with_visibility(self.options.visibility))
            .await
            .context("Failed to post the closing announcement")?;

        session.closed = true;

        Ok(report(session, archive, Outcome::Closed))
    }

    async fn pause(&self) {
        if !self.options.post_pause.is_zero() {
            tokio::time::sleep(self.options.post_pause).await;
        }
    }

    fn tags(&self) -> PgnTags<'a> {
        let options = self.options;
        PgnTags {
            event: &options.event,
            site: &options.site,
            human: &options.human_name,
            engine: &options.engine_name,
        }
    }
}

/// Plays `m` on both the record and the live state, returning it in numbered SAN.
fn play(record: &mut GameRecord, state: &mut GameState, m: &Move) -> String {
    let label = numbered_san(state.position(), m);
    record.push(m);
    state.play(m);
    label
}

fn report(session: Session, archive: Option<String>, outcome: Outcome) -> RoundReport {
    RoundReport {
        session,
        archive,
        outcome,
    }
}
