mod cli;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use book::OpeningBook;
use clap::Parser;
use cli::Cli;
use common::{ConfigLoader, FsExt};
use dotenv::dotenv;
use engine::{DrawPolicy, EngineError, Evaluate, MaterialEvaluator, Score, WithFallback};
use env_logger::Env;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use round::{GamePersistance, RoundController, RoundOptions};
use shakmaty::Chess;
use social::{Console, MastodonClient, MastodonOptions, PollOption, Post, PostId, Social, SocialError};
use tablebase::TablebaseClient;
use uci::{UciEngine, UciOptions};

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())?;

    Ok(())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.relative_to_cwd()?;
    let config = ConfigLoader::new(config_path, "votechess".to_string())?;

    let mut round_options: RoundOptions = config.load()?;
    let uci_options: UciOptions = config.load()?;
    let mut mastodon_options: MastodonOptions = config.load()?;

    if let Some(depth) = cli.human_depth {
        round_options.human_depth = depth;
    }
    if let Some(depth) = cli.engine_depth {
        round_options.engine_depth = depth;
    }
    if let Some(book) = &cli.book {
        round_options.book_path = Some(book.relative_to_cwd()?);
    }
    if cli.claim_draws {
        round_options.draw_policy = DrawPolicy::Claim;
    }
    if cli.no_new_game {
        round_options.no_new_game = true;
    }
    if cli.debug {
        round_options.post_pause = Duration::ZERO;
    }
    if let Some(server) = &cli.server {
        mastodon_options.server = Some(server.clone());
    }
    if let Some(token_file) = &cli.token_file {
        mastodon_options.token_file = Some(token_file.relative_to_cwd()?);
    }

    let dir = match &cli.dir {
        Some(dir) => dir.relative_to_cwd()?,
        None => config.base_dir().to_path_buf(),
    };
    let state_file = config
        .get("state_file")
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| "state.json".to_string());
    let archive_file = config
        .get("archive_file")
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| "archive.pgn".to_string());

    let persistance = GamePersistance::new(&dir.join(state_file), &dir.join(archive_file));
    let session = persistance.load_session(round_options.first_human_side);

    info!(
        "Loaded session from {:?}, round {}",
        persistance.state_path(),
        session.round
    );

    let engine_fallback = config
        .get("engine_fallback")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let mut evaluator = Evaluator::new(uci_options, engine_fallback);

    let social = SocialClient::new(&mastodon_options, cli.debug)?;
    let tablebase = TablebaseClient::new(&round_options.adjudication, round_options.draw_policy)?;
    let book = round_options.book_path.as_deref().and_then(open_book);

    let result = RoundController::new(
        &round_options,
        &mut evaluator,
        social,
        tablebase,
        book,
        StdRng::from_entropy(),
    )
    .run(session)
    .await;

    evaluator.close().await;

    let report = result?;

    info!("Round finished: {:?}", report.outcome);

    if cli.debug {
        println!("{}", persistance.describe(&report)?);
    } else {
        persistance.commit(&report)?;
    }

    Ok(())
}

fn open_book(path: &Path) -> Option<OpeningBook> {
    match OpeningBook::open(path) {
        Ok(book) => {
            info!("Loaded {} book entries from {:?}", book.len(), path);
            Some(book)
        }
        Err(err) => {
            warn!("Playing without an opening book. {:?}: {}", path, err);
            None
        }
    }
}

enum Evaluator {
    Uci(UciEngine),
    Fallback(WithFallback<UciEngine, MaterialEvaluator>),
}

impl Evaluator {
    fn new(options: UciOptions, fallback: bool) -> Self {
        let engine = UciEngine::new(options);

        if fallback {
            Self::Fallback(WithFallback::new(engine, MaterialEvaluator::new()))
        } else {
            Self::Uci(engine)
        }
    }

    async fn close(self) {
        let mut engine = match self {
            Self::Uci(engine) => engine,
            Self::Fallback(evaluator) => evaluator.into_inner().0,
        };

        engine.close().await;
    }
}

impl Evaluate for Evaluator {
    async fn evaluate(&mut self, position: &Chess, depth: u32) -> Result<Score, EngineError> {
        match self {
            Self::Uci(engine) => engine.evaluate(position, depth).await,
            Self::Fallback(evaluator) => evaluator.evaluate(position, depth).await,
        }
    }
}

enum SocialClient {
    Live(MastodonClient),
    Debug(Console<MastodonClient>),
}

impl SocialClient {
    fn new(options: &MastodonOptions, debug: bool) -> Result<Self> {
        if !debug {
            return Ok(Self::Live(MastodonClient::from_options(options)?));
        }

        let reader = if options.has_credentials() {
            match MastodonClient::from_options(options) {
                Ok(client) => Some(client),
                Err(err) => {
                    warn!("Polls will not be read. {:#}", err);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::Debug(Console::new(reader)))
    }
}

impl Social for SocialClient {
    async fn publish(&mut self, post: &Post) -> Result<PostId, SocialError> {
        match self {
            Self::Live(client) => client.publish(post).await,
            Self::Debug(console) => console.publish(post).await,
        }
    }

    async fn fetch_poll(&mut self, id: &PostId) -> Result<Vec<PollOption>, SocialError> {
        match self {
            Self::Live(client) => client.fetch_poll(id).await,
            Self::Debug(console) => console.fetch_poll(id).await,
        }
    }
}
