use engine::Score;
use once_cell::sync::Lazy;
use regex::Regex;

/// A line written by the engine, reduced to what the evaluator needs.
#[derive(Debug, PartialEq, Eq)]
pub enum EngineLine {
    UciOk,
    ReadyOk,
    /// Search progress. `score` is `None` when the line carries no exact score (bounds are dropped).
    Info {
        depth: Option<u32>,
        score: Option<Score>,
    },
    BestMove(String),
    Other,
}

static SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bscore\s+(cp|mate)\s+(-?\d+)(?:\s+(lowerbound|upperbound))?").unwrap()
});
static DEPTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdepth\s+(\d+)").unwrap());
static BEST_MOVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^bestmove\s+(\S+)").unwrap());

pub fn parse_line(line: &str) -> EngineLine {
    let line = line.trim();

    match line {
        "uciok" => EngineLine::UciOk,
        "readyok" => EngineLine::ReadyOk,
        _ if BEST_MOVE_RE.is_match(line) => {
            let best = BEST_MOVE_RE
                .captures(line)
                .and_then(|cap| cap.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            EngineLine::BestMove(best)
        }
        _ if line.starts_with("info") => EngineLine::Info {
            depth: DEPTH_RE
                .captures(line)
                .and_then(|cap| cap[1].parse().ok()),
            score: parse_score(line),
        },
        _ => EngineLine::Other,
    }
}

fn parse_score(line: &str) -> Option<Score> {
    let cap = SCORE_RE.captures(line)?;

    if cap.get(3).is_some() {
        return None;
    }

    let value: i64 = cap[2].parse().ok()?;

    match &cap[1] {
        "cp" => i32::try_from(value).ok().map(Score::Cp),
        "mate" if value > 0 => u32::try_from(value).ok().map(Score::Mate),
        "mate" => u32::try_from(-value).ok().map(Score::Mated),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_lines() {
        assert_eq!(parse_line("uciok"), EngineLine::UciOk);
        assert_eq!(parse_line("readyok\r"), EngineLine::ReadyOk);
        assert_eq!(parse_line("id name Stockfish 16"), EngineLine::Other);
    }

    #[test]
    fn test_cp_score() {
        let line = "info depth 10 seldepth 14 multipv 1 score cp -23 nodes 20000 nps 1000 pv e7e5 g1f3";

        assert_eq!(
            parse_line(line),
            EngineLine::Info {
                depth: Some(10),
                score: Some(Score::Cp(-23))
            }
        );
    }

    #[test]
    fn test_mate_scores() {
        assert_eq!(
            parse_line("info depth 5 score mate 3 pv d1h5"),
            EngineLine::Info {
                depth: Some(5),
                score: Some(Score::Mate(3))
            }
        );
        assert_eq!(
            parse_line("info depth 5 score mate -2 pv g8f6"),
            EngineLine::Info {
                depth: Some(5),
                score: Some(Score::Mated(2))
            }
        );
        assert_eq!(
            parse_line("info depth 0 score mate 0"),
            EngineLine::Info {
                depth: Some(0),
                score: Some(Score::Mated(0))
            }
        );
    }

    #[test]
    fn test_bound_scores_are_dropped() {
        assert_eq!(
            parse_line("info depth 9 score cp 40 lowerbound nodes 5"),
            EngineLine::Info {
                depth: Some(9),
                score: None
            }
        );
    }

    #[test]
    fn test_info_without_score() {
        assert_eq!(
            parse_line("info string NNUE evaluation using nn.bin"),
            EngineLine::Info {
                depth: None,
                score: None
            }
        );
    }

    #[test]
    fn test_bestmove() {
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5"),
            EngineLine::BestMove("e2e4".to_string())
        );
        assert_eq!(
            parse_line("bestmove (none)"),
            EngineLine::BestMove("(none)".to_string())
        );
    }
}
