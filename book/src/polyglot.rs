use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Chess, EnPassantMode, Move, Role};

pub const ENTRY_SIZE: usize = 16;

/// One 16 byte record of a Polyglot book, big-endian on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolyglotEntry {
    pub key: u64,
    pub mv: u16,
    pub weight: u16,
    pub learn: u32,
}

impl PolyglotEntry {
    pub fn from_bytes(bytes: &[u8; ENTRY_SIZE]) -> Self {
        let mut key = [0u8; 8];
        key.copy_from_slice(&bytes[0..8]);

        Self {
            key: u64::from_be_bytes(key),
            mv: u16::from_be_bytes([bytes[8], bytes[9]]),
            weight: u16::from_be_bytes([bytes[10], bytes[11]]),
            learn: u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0..8].copy_from_slice(&self.key.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.mv.to_be_bytes());
        bytes[10..12].copy_from_slice(&self.weight.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.learn.to_be_bytes());
        bytes
    }
}

/// Polyglot key of a position. The Zobrist constants coincide with the Polyglot random table.
pub fn polyglot_key(position: &Chess) -> u64 {
    let Zobrist64(key) = position.zobrist_hash(EnPassantMode::Legal);
    key
}

/// Polyglot move encoding: target square in bits 0-5, origin in bits 6-11, promotion piece in bits 12-14.
/// Castling is written as the king capturing its own rook.
pub fn encode_move(m: &Move) -> Option<u16> {
    let (from, to) = match *m {
        Move::Castle { king, rook } => (king, rook),
        Move::Normal { from, to, .. } | Move::EnPassant { from, to } => (from, to),
        Move::Put { .. } => return None,
    };

    let promotion: u16 = match m.promotion() {
        None => 0,
        Some(Role::Knight) => 1,
        Some(Role::Bishop) => 2,
        Some(Role::Rook) => 3,
        Some(Role::Queen) => 4,
        Some(_) => return None,
    };

    Some(to as u16 | (from as u16) << 6 | promotion << 12)
}
