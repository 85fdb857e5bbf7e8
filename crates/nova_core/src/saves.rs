//! Disk-backed save/load of registered attribute paths.
//!
//! ```ignore
//! let mut saves = SaveManager::new("MyGame", SaveLocation::app_data(), "data")?;
//! saves.set_vars(["player.hp", "player.money"]);
//! saves.save(&registry, &game)?;   // {"player.hp": 100, "player.money": 250}
//! saves.load(&registry, &mut game)?;
//! ```

use crate::attributes::{AttributeRegistry, AttributeStore, PersistedRecord};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SAVE_EXTENSION: &str = "novasave";
const FALLBACK_FILE_NAME: &str = "data.json";

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("save file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("save file {0} must contain a JSON object at the top level")]
    NotAnObject(PathBuf),
    #[error("no per-user data directory is available on this system")]
    NoDataDir,
}

/// Where the save directory lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveLocation {
    /// Per-user application data: `%APPDATA%\<dir>` on Windows, `~/.<dir>`
    /// elsewhere. `dir` defaults to the application name.
    AppData { dir: Option<String> },
    /// An explicit directory, relative paths resolved against the working
    /// directory.
    Directory(PathBuf),
}

impl SaveLocation {
    pub fn app_data() -> Self {
        SaveLocation::AppData { dir: None }
    }

    pub fn resolve(&self, app_name: &str) -> Result<PathBuf, SaveError> {
        match self {
            SaveLocation::AppData { dir } => {
                let dir = dir.as_deref().unwrap_or(app_name);
                if cfg!(windows) {
                    dirs::data_dir()
                        .map(|base| base.join(dir))
                        .ok_or(SaveError::NoDataDir)
                } else {
                    dirs::home_dir()
                        .map(|home| home.join(format!(".{dir}")))
                        .ok_or(SaveError::NoDataDir)
                }
            }
            SaveLocation::Directory(path) => Ok(path.clone()),
        }
    }
}

impl Default for SaveLocation {
    fn default() -> Self {
        Self::app_data()
    }
}

pub struct SaveManager {
    dir: PathBuf,
    file: PathBuf,
    vars: Vec<String>,
}

impl SaveManager {
    /// Resolve and create the save directory. The file is
    /// `<file_stem>.novasave`, or `data.json` when the stem is empty.
    pub fn new(app_name: &str, location: SaveLocation, file_stem: &str) -> Result<Self, SaveError> {
        let dir = location.resolve(app_name)?;
        fs::create_dir_all(&dir).map_err(|source| SaveError::Io {
            path: dir.clone(),
            source,
        })?;
        let file = if file_stem.is_empty() {
            dir.join(FALLBACK_FILE_NAME)
        } else {
            dir.join(format!("{file_stem}.{SAVE_EXTENSION}"))
        };
        log::info!(target: "SaveManager", "Save file: {}", file.display());
        Ok(Self {
            dir,
            file,
            vars: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self) -> &Path {
        &self.file
    }

    /// Replace the save set. Order is kept for the written file.
    pub fn set_vars<I, P>(&mut self, vars: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.vars = vars.into_iter().map(Into::into).collect();
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Read the save set from `state` and overwrite the save file.
    pub fn save<S>(
        &self,
        registry: &AttributeRegistry<S>,
        state: &S,
    ) -> Result<PersistedRecord, SaveError> {
        let record = AttributeStore::save(&self.vars, registry, state);
        let text = to_pretty_json(&record).map_err(|source| SaveError::Parse {
            path: self.file.clone(),
            source,
        })?;
        fs::write(&self.file, text).map_err(|source| SaveError::Io {
            path: self.file.clone(),
            source,
        })?;
        log::info!(
            target: "SaveManager",
            "Saved {} value(s) to {}",
            record.len(),
            self.file.display()
        );
        Ok(record)
    }

    /// Apply the save file to `state` and return everything the file held.
    /// A missing file is an empty record.
    pub fn load<S>(
        &self,
        registry: &AttributeRegistry<S>,
        state: &mut S,
    ) -> Result<PersistedRecord, SaveError> {
        let Some(record) = self.read_record()? else {
            log::info!(target: "SaveManager", "No save file at {}", self.file.display());
            return Ok(PersistedRecord::new());
        };
        let applied = AttributeStore::apply(&self.vars, &record, registry, state);
        log::info!(
            target: "SaveManager",
            "Loaded {} of {} value(s) from {}",
            applied,
            record.len(),
            self.file.display()
        );
        Ok(record)
    }

    /// The file contents without applying them. `None` when no file exists.
    pub fn read_record(&self) -> Result<Option<PersistedRecord>, SaveError> {
        let raw = match fs::read_to_string(&self.file) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SaveError::Io {
                    path: self.file.clone(),
                    source,
                })
            }
        };
        let value: Value = serde_json::from_str(&raw).map_err(|source| SaveError::Parse {
            path: self.file.clone(),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(Some(PersistedRecord::from(map))),
            _ => Err(SaveError::NotAnObject(self.file.clone())),
        }
    }
}

fn to_pretty_json(record: &PersistedRecord) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    record.serialize(&mut ser)?;
    Ok(out)
}
