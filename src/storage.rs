use std::{
    env,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::{
    constants::{APP_DIRS, FILE_PATHS, JSON_INDENT},
    domain::{MalformedRecordError, Project, ProjectRecord},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: io::Error,
    },
    #[error("{} is not a valid notes file: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} contains a malformed note: {source}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        source: MalformedRecordError,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The notes file. Every save rewrites it in full; every load reads it in
/// full.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteStore {
    path: PathBuf,
}

impl NoteStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        Self::at(default_notes_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the project, or an empty one when the file does not exist yet.
    pub fn load(&self) -> Result<Project, StoreError> {
        let exists = self
            .path
            .try_exists()
            .map_err(|e| StoreError::io(&self.path, e))?;
        if !exists {
            debug!(
                "event=notes_load status=missing path={}",
                self.path.display()
            );
            return Ok(Project::new());
        }

        let record: ProjectRecord = read_json(&self.path)?;
        let project =
            Project::from_record(record).map_err(|source| StoreError::MalformedRecord {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "event=notes_load status=ok count={} path={}",
            project.len(),
            self.path.display()
        );
        Ok(project)
    }

    pub fn save(&self, project: &Project) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &project.to_record())?;
        info!(
            "event=notes_save status=ok count={} path={}",
            project.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// `notes.json` next to the executable, or in the working directory when the
/// executable location is unknown.
pub fn default_notes_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(FILE_PATHS.notes)
}

pub fn get_state_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from(
        APP_DIRS.qualifier,
        APP_DIRS.organization,
        APP_DIRS.application,
    ) {
        let dir = proj_dirs
            .state_dir()
            .unwrap_or_else(|| proj_dirs.data_local_dir())
            .to_path_buf();
        fs::create_dir_all(&dir).ok();
        return dir;
    }
    PathBuf::from(".")
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StoreError::json(path, e))
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut json = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut json, PrettyFormatter::with_indent(JSON_INDENT));
    value
        .serialize(&mut serializer)
        .map_err(|e| StoreError::json(path, e))?;
    json.push(b'\n');
    atomic_write(path, &json)
}

pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    let mut tmp_file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;

    let written = tmp_file
        .write_all(content)
        .and_then(|()| tmp_file.sync_all())
        .map_err(|e| StoreError::io(&tmp_path, e))
        .and_then(|()| fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e)));
    if written.is_err() {
        drop(tmp_file);
        fs::remove_file(&tmp_path).ok();
    }
    written
}
