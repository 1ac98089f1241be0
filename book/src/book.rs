use std::fs;
use std::path::Path;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use shakmaty::{Chess, Move, Position};
use thiserror::Error;

use super::polyglot::{encode_move, polyglot_key, PolyglotEntry, ENTRY_SIZE};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("failed to read opening book: {0}")]
    Io(#[from] std::io::Error),
    #[error("opening book length {len} is not a multiple of {ENTRY_SIZE} bytes")]
    Corrupt { len: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedMove {
    pub mv: Move,
    pub weight: u32,
}

/// An in-memory Polyglot opening book.
pub struct OpeningBook {
    entries: Vec<PolyglotEntry>,
}

impl OpeningBook {
    pub fn open(path: &Path) -> Result<Self, BookError> {
        let bytes = fs::read(path)?;
        let book = Self::from_bytes(&bytes)?;
        debug!("Loaded {} book entries from {:?}", book.len(), path);
        Ok(book)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BookError> {
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(BookError::Corrupt { len: bytes.len() });
        }

        let mut entries: Vec<_> = bytes
            .chunks_exact(ENTRY_SIZE)
            .map(|chunk| {
                let mut record = [0u8; ENTRY_SIZE];
                record.copy_from_slice(chunk);
                PolyglotEntry::from_bytes(&record)
            })
            .collect();

        entries.sort_by_key(|e| e.key);

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Legal book moves for `position` with a positive weight. Repeated entries for one move are merged.
    pub fn moves(&self, position: &Chess) -> Vec<WeightedMove> {
        let key = polyglot_key(position);
        let start = self.entries.partition_point(|e| e.key < key);
        let legal = position.legal_moves();

        let mut moves: Vec<WeightedMove> = vec![];

        for entry in self.entries[start..].iter().take_while(|e| e.key == key) {
            if entry.weight == 0 {
                continue;
            }

            let Some(mv) = legal.iter().find(|m| encode_move(m) == Some(entry.mv)) else {
                warn!("Book entry {:#06x} is not legal in this position", entry.mv);
                continue;
            };

            match moves.iter_mut().find(|w| &w.mv == mv) {
                Some(existing) => existing.weight += entry.weight as u32,
                None => moves.push(WeightedMove {
                    mv: mv.clone(),
                    weight: entry.weight as u32,
                }),
            }
        }

        moves
    }

    /// Draws up to `count` distinct book moves, each pick proportional to its weight.
    ///
    /// An unknown position yields an empty list.
    pub fn sample<R: Rng + ?Sized>(&self, position: &Chess, count: usize, rng: &mut R) -> Vec<Move> {
        let moves = self.moves(position);

        match moves.choose_multiple_weighted(rng, count, |w| w.weight as f64) {
            Ok(picked) => picked.map(|w| w.mv.clone()).collect(),
            Err(err) => {
                warn!("Could not sample book moves. {}", err);
                vec![]
            }
        }
    }
}
