use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// What to do when the file to generate is already there
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum OverwritePolicy {
    /// Leave the existing file alone and fail
    Refuse,
    Overwrite,
}

/// A rendered file, not yet written anywhere
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

impl Artifact {
    /// Write the artifact into `dir`, creating the directory if it doesn't exist
    pub fn write_to(&self, dir: &Path, policy: OverwritePolicy) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|err| Error::Io(dir.to_path_buf(), err))?;
        let path = dir.join(&self.file_name);

        let mut options = OpenOptions::new();
        options.write(true);
        match policy {
            OverwritePolicy::Refuse => options.create_new(true),
            OverwritePolicy::Overwrite => options.create(true).truncate(true),
        };

        let mut file = match options.open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::AlreadyExists(format!("file '{}'", path.display())));
            }
            Err(err) => return Err(Error::Io(path, err)),
        };

        if let Err(err) = file.write_all(self.contents.as_bytes()) {
            // Don't leave a truncated file behind
            drop(file);
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), "cannot remove partial file: {}", e);
            }
            return Err(Error::Io(path, err));
        }
        debug!(path = %path.display(), bytes = self.contents.len(), "wrote file");
        Ok(path)
    }
}
