use std::cmp::Ordering;
use std::fmt::{self, Display};

/// Centipawn magnitude assigned to a forced mate, before subtracting the distance to mate.
pub const MATE_CP: i32 = 100_000;

/// Evaluation of a position relative to the side to move.
///
/// Ordered from worst to best for that side: being mated (sooner is worse), any centipawn value, mating
/// (sooner is better). `Mate(0)` means the side has already won, `Mated(0)` that it is checkmated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Score {
    Mated(u32),
    Cp(i32),
    Mate(u32),
}

impl Score {
    pub const DRAW: Score = Score::Cp(0);

    /// Saturating numeric view of the score, used for threshold comparisons.
    pub fn centipawns(&self) -> i32 {
        match *self {
            Score::Mated(n) => -(MATE_CP - n.min(MATE_CP as u32 - 1) as i32),
            Score::Cp(cp) => cp.clamp(-(MATE_CP - 1), MATE_CP - 1),
            Score::Mate(n) => MATE_CP - n.min(MATE_CP as u32 - 1) as i32,
        }
    }

    /// The same evaluation seen from the opponent.
    pub fn flip(&self) -> Score {
        match *self {
            Score::Mated(n) => Score::Mate(n),
            Score::Cp(cp) => Score::Cp(cp.saturating_neg()),
            Score::Mate(n) => Score::Mated(n),
        }
    }

    fn rank(&self) -> (u8, i64) {
        match *self {
            Score::Mated(n) => (0, n as i64),
            Score::Cp(cp) => (1, cp as i64),
            Score::Mate(n) => (2, -(n as i64)),
        }
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Mated(n) => write!(f, "#-{}", n),
            Score::Cp(cp) => write!(f, "{:+.2}", *cp as f32 / 100.0),
            Score::Mate(n) => write!(f, "#{}", n),
        }
    }
}
