use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use engine::Side;
use log::{info, warn};

use super::controller::RoundReport;
use super::session::Session;

/// Reads the session at start-up and commits a round's results at the end.
pub struct GamePersistance {
    state_path: PathBuf,
    archive_path: PathBuf,
}

impl GamePersistance {
    pub fn new(state_path: &Path, archive_path: &Path) -> Self {
        Self {
            state_path: state_path.to_path_buf(),
            archive_path: archive_path.to_path_buf(),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Loads the persisted session. A missing or unparsable file yields a fresh session; an unreadable game or
    /// poll is dropped while the scores and round are kept.
    pub fn load_session(&self, first_human_side: Side) -> Session {
        let contents = match fs::read_to_string(&self.state_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("No session at {:?}, starting fresh", self.state_path);
                return Session::new(first_human_side);
            }
            Err(err) => {
                warn!("Failed to read {:?}, starting fresh. {}", self.state_path, err);
                return Session::new(first_human_side);
            }
        };

        match serde_json::from_str(&contents) {
            Ok(session) => session,
            Err(err) => {
                warn!("Corrupt session in {:?}, starting fresh. {}", self.state_path, err);
                Session::new(first_human_side)
            }
        }
    }

    pub fn commit(&self, report: &RoundReport) -> Result<()> {
        if let Some(pgn) = &report.archive {
            common::append(&self.archive_path, pgn)
                .with_context(|| format!("Failed to archive game to {:?}", self.archive_path))?;
            info!("Archived game to {:?}", self.archive_path);
        }

        let serialized = serde_json::to_string_pretty(&report.session)?;

        common::write_atomically(&self.state_path, serialized.as_bytes())?;

        Ok(())
    }

    /// What [`GamePersistance::commit`] would write, for dry runs.
    pub fn describe(&self, report: &RoundReport) -> Result<String> {
        let mut out = format!(
            "{:?}:\n{}\n",
            self.state_path,
            serde_json::to_string_pretty(&report.session)?
        );

        if let Some(pgn) = &report.archive {
            out.push_str(&format!("\n{:?} (append):\n{}", self.archive_path, pgn));
        }

        Ok(out)
    }
}
