use engine::{Side, Termination};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Color, EnPassantMode, Move, Piece, Position, Role, Square};

use super::options::DisplayOptions;
use super::session::Scores;

/// Move in numbered SAN as it would appear in a game listing, e.g. `12. Nf3` or `12... Nf6`.
pub fn numbered_san(position: &Chess, m: &Move) -> String {
    let san = SanPlus::from_move(position.clone(), m);
    match position.turn() {
        Color::White => format!("{}. {}", position.fullmoves(), san),
        Color::Black => format!("{}... {}", position.fullmoves(), san),
    }
}

pub fn fen(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
}

fn piece_char(piece: Piece) -> char {
    match (piece.color, piece.role) {
        (Color::White, Role::King) => '♔',
        (Color::White, Role::Queen) => '♕',
        (Color::White, Role::Rook) => '♖',
        (Color::White, Role::Bishop) => '♗',
        (Color::White, Role::Knight) => '♘',
        (Color::White, Role::Pawn) => '♙',
        (Color::Black, Role::King) => '♚',
        (Color::Black, Role::Queen) => '♛',
        (Color::Black, Role::Rook) => '♜',
        (Color::Black, Role::Bishop) => '♝',
        (Color::Black, Role::Knight) => '♞',
        (Color::Black, Role::Pawn) => '♟',
    }
}

/// Text diagram of the board, seen from `viewer` when flipping is enabled.
pub fn board_diagram(position: &Chess, viewer: Side, display: &DisplayOptions) -> String {
    let from_black = display.flip && viewer == Side::Black;
    let board = position.board();

    let ranks: Vec<u32> = if from_black {
        (0..8).collect()
    } else {
        (0..8).rev().collect()
    };
    let files: Vec<u32> = if from_black {
        (0..8).rev().collect()
    } else {
        (0..8).collect()
    };

    let mut lines = vec![];

    for rank in &ranks {
        let squares: Vec<String> = files
            .iter()
            .map(|file| {
                board
                    .piece_at(Square::new(rank * 8 + file))
                    .map(piece_char)
                    .unwrap_or('·')
                    .to_string()
            })
            .collect();

        let row = squares.join(" ");
        if display.coordinates {
            lines.push(format!("{} {}", rank + 1, row));
        } else {
            lines.push(row);
        }
    }

    if display.coordinates {
        let letters: Vec<String> = files
            .iter()
            .map(|file| char::from(b'a' + *file as u8).to_string())
            .collect();
        lines.push(format!("  {}", letters.join(" ")));
    }

    lines.join("\n")
}

fn with_board(text: String, position: &Chess, viewer: Side, display: &DisplayOptions) -> String {
    format!(
        "{}\n\n{}\nFEN: {}",
        text.trim_end(),
        board_diagram(position, viewer, display),
        fen(position)
    )
}

/// First post of a vote round: what happened since the last poll.
pub fn round_message(
    human_move: Option<&str>,
    engine_move: Option<&str>,
    position: &Chess,
    viewer: Side,
    display: &DisplayOptions,
) -> String {
    let mut text = match human_move {
        None => "New Game\n".to_string(),
        Some(human_move) => format!("Poll result: {}\n", human_move),
    };

    if let Some(engine_move) = engine_move {
        text.push_str(&format!("Computer move: {}", engine_move));
    }

    with_board(text, position, viewer, display)
}

/// Reply carrying the poll.
pub fn poll_prompt(engine_move: Option<&str>) -> String {
    match engine_move {
        None => "Choose a move to play:".to_string(),
        Some(engine_move) => format!("Choose a move to reply to {}:", engine_move),
    }
}

pub fn only_move_message(only_move: &str) -> String {
    format!("Only one legal move: {}", only_move)
}

/// Result announcement. `last_move` ended the game; `reply_to` is the human move the computer answered, if
/// the computer moved last.
pub fn game_over_message(
    termination: &Termination,
    last_move: &str,
    reply_to: Option<&str>,
    position: &Chess,
    viewer: Side,
    display: &DisplayOptions,
) -> String {
    let mut text = match (termination, reply_to) {
        (Termination::Checkmate { .. }, None) => {
            format!("Checkmate!\nWith {} the humans win!\n", last_move)
        }
        (Termination::Checkmate { .. }, Some(human)) => {
            format!("Checkmate!\nThe computer replies to {} with {}\n", human, last_move)
        }
        (Termination::Stalemate, None) => {
            format!("With {} the humans stalemate the computer!\n", last_move)
        }
        (Termination::Stalemate, Some(human)) => {
            format!("The computer replies to {} with {}. Stalemate!\n", human, last_move)
        }
        (Termination::Adjudicated, None) => {
            format!("After {} the tablebase declares the position a draw.\n", last_move)
        }
        (Termination::Adjudicated, Some(human)) => format!(
            "The computer replies to {} with {}. The tablebase declares the position a draw.\n",
            human, last_move
        ),
        (Termination::Resignation { loser }, _) if *loser == viewer => {
            "The humans resign. The computer wins!\n".to_string()
        }
        (Termination::Resignation { .. }, _) => {
            format!("The computer resigns after {}. The humans win!\n", last_move)
        }
        (_, None) => format!("With {} the humans claim a draw.\n", last_move),
        (_, Some(human)) => format!(
            "The computer replies to {} with {}, and claims a draw.\n",
            human, last_move
        ),
    };

    text.push_str(termination.result());

    with_board(text, position, viewer, display)
}

/// Posted once when a game ends and no new one will follow.
pub fn closing_message(scores: &Scores, human_name: &str, engine_name: &str) -> String {
    format!(
        "Vote chess is taking a break, no new game will be started.\nFinal score: {} {} - {} {}",
        human_name, scores.human, scores.engine, engine_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::Choice;

    fn display() -> DisplayOptions {
        DisplayOptions::default()
    }

    #[test]
    fn test_numbered_san() {
        let start = Chess::default();
        let e4 = Choice::parse_uci("e2e4", &start).unwrap();
        let mut after = start.clone();
        after.play_unchecked(e4.as_move().unwrap());
        let c5 = Choice::parse_uci("c7c5", &after).unwrap();

        assert_eq!(numbered_san(&start, e4.as_move().unwrap()), "1. e4");
        assert_eq!(numbered_san(&after, c5.as_move().unwrap()), "1... c5");
    }

    #[test]
    fn test_diagram_from_white() {
        let diagram = board_diagram(&Chess::default(), Side::White, &display());
        let lines: Vec<&str> = diagram.lines().collect();

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8 ♜ ♞ ♝ ♛ ♚ ♝ ♞ ♜");
        assert_eq!(lines[4], "4 · · · · · · · ·");
        assert_eq!(lines[7], "1 ♖ ♘ ♗ ♕ ♔ ♗ ♘ ♖");
        assert_eq!(lines[8], "  a b c d e f g h");
    }

    #[test]
    fn test_diagram_from_black_without_coordinates() {
        let display = DisplayOptions {
            flip: true,
            coordinates: false,
        };

        let diagram = board_diagram(&Chess::default(), Side::Black, &display);
        let lines: Vec<&str> = diagram.lines().collect();

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "♖ ♘ ♗ ♔ ♕ ♗ ♘ ♖");
        assert_eq!(lines[7], "♜ ♞ ♝ ♚ ♛ ♝ ♞ ♜");
    }

    #[test]
    fn test_new_game_message() {
        let text = round_message(None, None, &Chess::default(), Side::White, &display());

        assert!(text.starts_with("New Game\n\n8 ♜"));
        assert!(text.ends_with("FEN: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
    }

    #[test]
    fn test_round_message_and_prompt() {
        let text = round_message(
            Some("1. e4"),
            Some("1... c5"),
            &Chess::default(),
            Side::White,
            &display(),
        );

        assert!(text.starts_with("Poll result: 1. e4\nComputer move: 1... c5\n\n"));
        assert_eq!(poll_prompt(None), "Choose a move to play:");
        assert_eq!(
            poll_prompt(Some("1... c5")),
            "Choose a move to reply to 1... c5:"
        );
    }

    #[test]
    fn test_game_over_wording() {
        let pos = Chess::default();
        let mate = |reply_to| {
            game_over_message(
                &Termination::Checkmate {
                    winner: Side::White,
                },
                "23. Qxf7#",
                reply_to,
                &pos,
                Side::White,
                &display(),
            )
        };

        assert!(mate(None).starts_with("Checkmate!\nWith 23. Qxf7# the humans win!\n1-0\n"));
        assert!(mate(Some("22... Kg8"))
            .starts_with("Checkmate!\nThe computer replies to 22... Kg8 with 23. Qxf7#\n1-0\n"));

        let claimed = game_over_message(
            &Termination::Repetition,
            "40... Kh8",
            Some("40. Qh6"),
            &pos,
            Side::White,
            &display(),
        );
        assert!(claimed.starts_with(
            "The computer replies to 40. Qh6 with 40... Kh8, and claims a draw.\n1/2-1/2"
        ));

        let resigned = game_over_message(
            &Termination::Resignation { loser: Side::Black },
            "Resign",
            None,
            &pos,
            Side::Black,
            &display(),
        );
        assert!(resigned.starts_with("The humans resign. The computer wins!\n1-0"));
    }

    #[test]
    fn test_closing_message() {
        let scores = Scores {
            human: 2.5,
            engine: 4.5,
        };

        assert!(closing_message(&scores, "Mastodon", "Computer")
            .ends_with("Final score: Mastodon 2.5 - 4.5 Computer"));
    }
}
