// store.rs
// Persistence boundary: named JSON documents (maps, settings, recorded runs) under one data root.

use flate2::read::GzDecoder;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::{HISTORY_DIR, MAPS_DIR};
use crate::error::StoreError;

/// Which family of documents a name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Conveyor layouts under `maps/`, listed with their `.json` extension.
    Map,
    /// Parameter sets at the root plus recorded runs under `history/<name>/`.
    Settings,
}

impl Kind {
    fn indent(self) -> &'static [u8] {
        match self {
            Kind::Map => b"  ",
            Kind::Settings => b"    ",
        }
    }
}

/// The interface the loader and the parameter editor consume.
pub trait Store {
    /// Reads one document. Settings names may be relative paths such as
    /// `history/<run>/params.json`; every component is sanitized.
    fn load_named(&self, name: &str, kind: Kind) -> Result<Value, StoreError>;

    /// Map file names, or the names of recorded runs for settings.
    fn list_names(&self, kind: Kind) -> Result<Vec<String>, StoreError>;

    fn save_named(&self, name: &str, kind: Kind, data: &Value) -> Result<(), StoreError>;

    fn delete_named(&self, name: &str, kind: Kind) -> Result<(), StoreError>;
}

/// Keeps ASCII letters, digits, `-` and `_`. A trailing `.json` is dropped first.
pub fn sanitize_name(name: &str) -> Result<String, StoreError> {
    let stem = name.trim().strip_suffix(".json").unwrap_or(name.trim());
    let clean: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if clean.is_empty() {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(clean)
}

/// Relative location of a recorded run's file, e.g. `history/run-3/history.json`.
pub fn run_document(run: &str, file: &str) -> String {
    format!("{HISTORY_DIR}/{run}/{file}")
}

/// [`Store`] over a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str, kind: Kind) -> Result<PathBuf, StoreError> {
        match kind {
            Kind::Map => Ok(self
                .root
                .join(MAPS_DIR)
                .join(format!("{}.json", sanitize_name(name)?))),
            Kind::Settings => {
                let mut path = self.root.clone();
                let parts: Vec<&str> = name.split('/').filter(|p| !p.is_empty()).collect();
                let Some((last, dirs)) = parts.split_last() else {
                    return Err(StoreError::InvalidName(name.to_string()));
                };
                for dir in dirs {
                    path.push(sanitize_name(dir)?);
                }
                path.push(format!("{}.json", sanitize_name(last)?));
                Ok(path)
            }
        }
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

impl Store for FsStore {
    fn load_named(&self, name: &str, kind: Kind) -> Result<Value, StoreError> {
        let path = self.path_for(name, kind)?;
        let data = std::fs::read(&path).map_err(|e| Self::io_error(&path, e))?;
        let bytes = match maybe_decompress_gzip(&data).map_err(|e| Self::io_error(&path, e))? {
            Some(decoded) => decoded,
            None => data,
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json { path, source })
    }

    fn list_names(&self, kind: Kind) -> Result<Vec<String>, StoreError> {
        let dir = match kind {
            Kind::Map => self.root.join(MAPS_DIR),
            Kind::Settings => self.root.join(HISTORY_DIR),
        };
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error(&dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Self::io_error(&dir, e))?;
            let file_type = entry.file_type().map_err(|e| Self::io_error(&entry.path(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let wanted = match kind {
                Kind::Map => file_type.is_file() && name.ends_with(".json"),
                Kind::Settings => file_type.is_dir(),
            };
            if wanted {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn save_named(&self, name: &str, kind: Kind, data: &Value) -> Result<(), StoreError> {
        let path = match kind {
            Kind::Map => self.path_for(name, kind)?,
            Kind::Settings => self.root.join(format!("{}.json", sanitize_name(name)?)),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Self::io_error(parent, e))?;
        }

        // write to a sibling temp file, then swap it in
        let tmp_path = path.with_extension("json.tmp");
        {
            let file = std::fs::File::create(&tmp_path).map_err(|e| Self::io_error(&tmp_path, e))?;
            let mut writer = BufWriter::new(file);
            let mut ser =
                serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(kind.indent()));
            data.serialize(&mut ser).map_err(|source| StoreError::Json {
                path: tmp_path.clone(),
                source,
            })?;
            writer.flush().map_err(|e| Self::io_error(&tmp_path, e))?;
        }
        std::fs::rename(&tmp_path, &path).map_err(|e| Self::io_error(&path, e))?;
        log::info!("Saved {}", path.display());
        Ok(())
    }

    fn delete_named(&self, name: &str, kind: Kind) -> Result<(), StoreError> {
        let path = match kind {
            Kind::Map => self.path_for(name, kind)?,
            Kind::Settings => self.root.join(format!("{}.json", sanitize_name(name)?)),
        };
        std::fs::remove_file(&path).map_err(|e| Self::io_error(&path, e))?;
        log::info!("Deleted {}", path.display());
        Ok(())
    }
}

fn maybe_decompress_gzip(data: &[u8]) -> std::io::Result<Option<Vec<u8>>> {
    if data.len() < 2 || data[0] != 0x1f || data[1] != 0x8b {
        return Ok(None);
    }

    let mut decoder = GzDecoder::new(Cursor::new(data));
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded)?;
    Ok(Some(decoded))
}
