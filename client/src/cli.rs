use clap::Parser;

#[derive(Parser)]
#[clap(author, version)]
#[clap(name = "votechess")]
#[clap(about = "Plays one round of a vote chess game between a social network audience and a chess engine.", long_about = None)]
pub struct Cli {
    #[clap(short, long)]
    pub config: String,

    /// Directory holding the state and archive files. Defaults to the directory of the config file.
    #[clap(short, long)]
    pub dir: Option<String>,

    #[clap(long)]
    pub human_depth: Option<u32>,

    #[clap(long)]
    pub engine_depth: Option<u32>,

    /// Polyglot opening book.
    #[clap(short, long)]
    pub book: Option<String>,

    /// End games on threefold repetition and the 50-move rule.
    #[clap(long)]
    pub claim_draws: bool,

    #[clap(long)]
    pub server: Option<String>,

    #[clap(long)]
    pub token_file: Option<String>,

    /// Finish the current game but do not start another one.
    #[clap(long)]
    pub no_new_game: bool,

    /// Print posts and state changes instead of publishing and saving them.
    #[clap(long)]
    pub debug: bool,
}
