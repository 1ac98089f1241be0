use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub trait FsExt {
    // Converts the provided relative path to be based from the path of the currently working directory.
    // If the path is absolute, then it returns the absolute path.
    fn relative_to_cwd(&self) -> Result<PathBuf>
    where
        Self: AsRef<Path>,
    {
        let cwd_dir = std::env::current_dir()?;

        Ok(cwd_dir.join(self))
    }
}

impl FsExt for String {}

impl FsExt for &str {}

impl FsExt for PathBuf {}

/// Replaces the file at `path` so that readers observe either the old or the new contents, never a torn write.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("Failed to create {:?}", tmp_path))?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path).with_context(|| format!("Failed to replace {:?}", path))?;

    Ok(())
}

/// Appends `contents` to the file at `path`, creating it if needed.
pub fn append(path: &Path, contents: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?} for appending", path))?;

    file.write_all(contents.as_bytes())?;

    Ok(())
}
