//! Raw message spools on the filesystem.
//!
//! The transport client appends each received uplink, verbatim, as one line
//! of a `.log` file under the spool root. Files can be rotated freely; the
//! spool walks the whole tree in path order, so rotated files named by date
//! come back in the order they were written.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A directory tree of raw uplink message logs.
#[derive(Clone, Debug, PartialEq)]
pub struct Spool {
    root: PathBuf,
}

/// An error returned when opening a spool.
#[derive(Debug, Fail, PartialEq)]
pub enum Error {
    /// The spool root does not exist or is not a directory.
    #[fail(display = "not a spool directory: {}", _0)]
    NotADirectory(String),
}

impl Spool {
    /// Opens the spool rooted at the given directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker::Spool;
    /// let spool = Spool::open("fixtures/spool").unwrap();
    /// assert!(Spool::open("fixtures/spool/alpha.log").is_err());
    /// assert!(Spool::open("no/such/directory").is_err());
    /// ```
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Spool, Error> {
        if root.as_ref().is_dir() {
            Ok(Spool {
                root: root.as_ref().to_path_buf(),
            })
        } else {
            Err(Error::NotADirectory(
                root.as_ref().to_string_lossy().into_owned(),
            ))
        }
    }

    /// Returns the spool's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns every raw message line in the spool, in path order.
    ///
    /// Blank lines are skipped; everything else comes back verbatim, even
    /// lines that won't decode, since rejects are the registry's business.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracker::Spool;
    /// let spool = Spool::open("fixtures/spool").unwrap();
    /// let messages = spool.messages().unwrap();
    /// assert_eq!(6, messages.len());
    /// ```
    pub fn messages(&self) -> Result<Vec<String>, ::failure::Error> {
        let mut paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .map(|extension| extension == "log")
                    .unwrap_or(false)
            })
            .map(|entry| entry.path().to_path_buf())
            .collect();
        paths.sort();

        let mut messages = Vec::new();
        for path in paths {
            let file = File::open(&path)?;
            for line in BufReader::new(file).lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    messages.push(line);
                }
            }
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open() {
        assert!(Spool::open("fixtures/spool").is_ok());
        assert_eq!(
            Error::NotADirectory("fixtures/nope".to_string()),
            Spool::open("fixtures/nope").unwrap_err()
        );
    }

    #[test]
    fn messages_in_path_order() {
        let spool = Spool::open("fixtures/spool").unwrap();
        let messages = spool.messages().unwrap();
        assert_eq!(6, messages.len());
        // alpha.log sorts before bravo.log.
        assert!(messages[0].contains("484557474850"));
        assert!(messages[4].contains("54524b425831"));
    }
}
