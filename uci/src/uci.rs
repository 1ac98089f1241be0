use std::process::Stdio;
use std::time::Duration;

use engine::{EngineError, Evaluate, Score};
use log::{debug, info, trace, warn};
use shakmaty::Chess;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::input_parser::{parse_line, EngineLine};
use super::options::UciOptions;
use super::output::*;

const QUIT_GRACE: Duration = Duration::from_secs(1);

/// Evaluates positions with an external UCI engine.
///
/// The process is started lazily on the first request. With `persistent` set it is kept for later requests,
/// otherwise it is shut down after every answer. Any failure discards the process so the next request starts a
/// fresh one.
pub struct UciEngine {
    options: UciOptions,
    session: Option<Session>,
}

impl UciEngine {
    pub fn new(options: UciOptions) -> Self {
        Self {
            options,
            session: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Asks a running engine to quit and waits briefly for it to exit.
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.quit().await;
        }
    }

    async fn search(&mut self, position: &Chess, depth: u32) -> Result<Score, EngineError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => Session::start(&self.options).await?,
        };

        self.session.insert(session).search(position, depth).await
    }
}

impl Evaluate for UciEngine {
    async fn evaluate(&mut self, position: &Chess, depth: u32) -> Result<Score, EngineError> {
        let timeout = self.options.timeout;
        let result = tokio::time::timeout(timeout, self.search(position, depth))
            .await
            .unwrap_or(Err(EngineError::Timeout(timeout)));

        match &result {
            Err(err) => {
                warn!("Discarding engine process. {}", err);
                self.session = None;
            }
            Ok(_) if !self.options.persistent => self.close().await,
            Ok(_) => {}
        }

        result
    }
}

struct Session {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl Session {
    async fn start(options: &UciOptions) -> Result<Self, EngineError> {
        info!("Starting engine {} {}", options.command, options.args.join(" "));

        let mut child = Command::new(&options.command)
            .args(&options.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| EngineError::Unavailable(format!("{}: {}", options.command, err)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdout not captured".to_string()))?;

        let mut session = Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        };

        session.send(UCI).await?;
        session.wait_for(EngineLine::UciOk).await?;

        if let Some(threads) = options.threads {
            session
                .send(&set_option_cmd("Threads", &threads.to_string()))
                .await?;
        }

        if let Some(hash) = options.hash_mb {
            session.send(&set_option_cmd("Hash", &hash.to_string())).await?;
        }

        session.send(NEW_GAME).await?;
        session.send(IS_READY).await?;
        session.wait_for(EngineLine::ReadyOk).await?;

        Ok(session)
    }

    /// Searches to `depth` and returns the last exact score reported before `bestmove`.
    async fn search(&mut self, position: &Chess, depth: u32) -> Result<Score, EngineError> {
        self.send(&position_cmd(position)).await?;
        self.send(&go_depth_cmd(depth)).await?;

        let mut last_score = None;

        loop {
            match self.read_line().await? {
                EngineLine::Info {
                    score: Some(score),
                    depth,
                } => {
                    trace!("depth {:?} score {}", depth, score);
                    last_score = Some(score);
                }
                EngineLine::BestMove(best) => {
                    debug!("bestmove {} score {:?}", best, last_score);
                    return last_score.ok_or_else(|| {
                        EngineError::Protocol("bestmove without a preceding score".to_string())
                    });
                }
                _ => {}
            }
        }
    }

    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        trace!("> {}", cmd);
        let line = format!("{}\n", cmd);
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|err| EngineError::Unavailable(err.to_string()))?;
        self.stdin
            .flush()
            .await
            .map_err(|err| EngineError::Unavailable(err.to_string()))
    }

    async fn read_line(&mut self) -> Result<EngineLine, EngineError> {
        match self.lines.next_line().await {
            Ok(Some(line)) => {
                trace!("< {}", line);
                Ok(parse_line(&line))
            }
            Ok(None) => Err(EngineError::Unavailable(
                "engine closed its output".to_string(),
            )),
            Err(err) => Err(EngineError::Unavailable(err.to_string())),
        }
    }

    async fn wait_for(&mut self, expected: EngineLine) -> Result<(), EngineError> {
        while self.read_line().await? != expected {}
        Ok(())
    }

    async fn quit(mut self) {
        if self.send(QUIT).await.is_ok() {
            let _ = tokio::time::timeout(QUIT_GRACE, self.child.wait()).await;
        }
    }
}
