//! On-disk persistence of driver records for the host binary.
//!
//! Each machine owns `<root>/machines/<name>/spotinst.json`. All file access
//! goes through `cap-std` directory handles rooted at the store path.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

use crate::driver::DriverRecord;

const MACHINES_DIR: &str = "machines";
const RECORD_FILE_NAME: &str = "spotinst.json";

/// Errors raised while reading or writing driver records.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum StoreError {
    /// Raised when file system operations fail.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Path that could not be accessed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when a record cannot be encoded or decoded.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path of the offending record.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when no record exists for a machine.
    #[error("machine {name} does not exist")]
    NotFound {
        /// Machine name.
        name: String,
    },
    /// Raised when a machine name cannot be used as a directory name.
    #[error("invalid machine name {name:?}: use letters, digits, '.', '-' or '_'")]
    InvalidName {
        /// Rejected machine name.
        name: String,
    },
}

/// Driver record store rooted at the host's store path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordStore {
    root: Utf8PathBuf,
}

impl RecordStore {
    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the directory holding `name`'s record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidName`] for unusable machine names.
    pub fn machine_dir(&self, name: &str) -> Result<Utf8PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(MACHINES_DIR).join(name))
    }

    /// Reports whether a record exists for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the name is invalid or the directory
    /// cannot be inspected.
    pub fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let dir_path = self.machine_dir(name)?;
        match open_dir(&dir_path)? {
            Some(dir) => dir.try_exists(RECORD_FILE_NAME).map_err(|err| io_error(&dir_path, &err)),
            None => Ok(false),
        }
    }

    /// Loads the record for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record exists, or another
    /// [`StoreError`] when it cannot be read or decoded.
    pub fn load(&self, name: &str) -> Result<DriverRecord, StoreError> {
        let dir_path = self.machine_dir(name)?;
        let not_found = || StoreError::NotFound {
            name: name.to_owned(),
        };
        let dir = open_dir(&dir_path)?.ok_or_else(not_found)?;
        let path = dir_path.join(RECORD_FILE_NAME);

        let contents = match dir.read_to_string(RECORD_FILE_NAME) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(err) => return Err(io_error(&path, &err)),
        };

        serde_json::from_str(&contents).map_err(|err| StoreError::Parse {
            path,
            message: err.to_string(),
        })
    }

    /// Writes `record` under its machine name, creating directories as
    /// needed, and returns the record path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be encoded or written.
    pub fn save(&self, record: &DriverRecord) -> Result<Utf8PathBuf, StoreError> {
        let dir_path = self.machine_dir(&record.machine_name)?;
        let path = dir_path.join(RECORD_FILE_NAME);
        let rendered = serde_json::to_string_pretty(record).map_err(|err| StoreError::Parse {
            path: path.clone(),
            message: err.to_string(),
        })?;

        Dir::create_ambient_dir_all(&dir_path, ambient_authority())
            .map_err(|err| io_error(&dir_path, &err))?;
        let dir = Dir::open_ambient_dir(&dir_path, ambient_authority())
            .map_err(|err| io_error(&dir_path, &err))?;
        dir.write(RECORD_FILE_NAME, rendered)
            .map_err(|err| io_error(&path, &err))?;
        Ok(path)
    }

    /// Deletes the record for `name` and its directory. Missing records are
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record exists but cannot be removed.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let dir_path = self.machine_dir(name)?;
        let Some(dir) = open_dir(&dir_path)? else {
            return Ok(());
        };

        match dir.remove_file(RECORD_FILE_NAME) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(io_error(&dir_path.join(RECORD_FILE_NAME), &err)),
        }
        drop(dir);

        let machines = self.root.join(MACHINES_DIR);
        let parent = Dir::open_ambient_dir(&machines, ambient_authority())
            .map_err(|err| io_error(&machines, &err))?;
        match parent.remove_dir(name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&dir_path, &err)),
        }
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName {
            name: name.to_owned(),
        })
    }
}

fn open_dir(path: &Utf8Path) -> Result<Option<Dir>, StoreError> {
    match Dir::open_ambient_dir(path, ambient_authority()) {
        Ok(dir) => Ok(Some(dir)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(path, &err)),
    }
}

fn io_error(path: &Utf8Path, err: &io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
