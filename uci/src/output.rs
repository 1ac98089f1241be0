use shakmaty::fen::Fen;
use shakmaty::{Chess, EnPassantMode};

pub const UCI: &str = "uci";
pub const IS_READY: &str = "isready";
pub const NEW_GAME: &str = "ucinewgame";
pub const QUIT: &str = "quit";

pub fn position_cmd(position: &Chess) -> String {
    let fen = Fen::from_position(position.clone(), EnPassantMode::Legal);
    format!("position fen {}", fen)
}

pub fn go_depth_cmd(depth: u32) -> String {
    format!("go depth {}", depth)
}

pub fn set_option_cmd(name: &str, value: &str) -> String {
    format!("setoption name {} value {}", name, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_cmd_uses_fen() {
        assert_eq!(
            position_cmd(&Chess::default()),
            "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_go_and_setoption() {
        assert_eq!(go_depth_cmd(12), "go depth 12");
        assert_eq!(set_option_cmd("Threads", "2"), "setoption name Threads value 2");
    }
}
