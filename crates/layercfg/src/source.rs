//! where a [crate::Config] gets its data from
//!
//! - an in-memory [Map], used as is
//! - a single file, loaded when the config is created
//! - a directory, where each file provides one top level key (the "base") and is loaded on first access
//!
//! A file `<base>.<ext>` provides `base`. Everything after the first `.` of the file name is
//! ignored except the extension which selects the [Parser]. A trailing `.dist` is skipped so
//! `app.json.dist` is read as json. Characters other than alphanumerics and spaces in `base` are
//! replaced with `_`.
use crate::error::{Error, Result};
use crate::parser::Parsers;
use crate::value::{Map, Value};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum Source {
    Map(Map),
    Path(PathBuf),
}

impl From<Map> for Source {
    fn from(value: Map) -> Self {
        Source::Map(value)
    }
}

impl From<PathBuf> for Source {
    fn from(value: PathBuf) -> Self {
        Source::Path(value)
    }
}

impl From<&Path> for Source {
    fn from(value: &Path) -> Self {
        Source::Path(value.to_path_buf())
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Source::Path(value.into())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::Path(value.into())
    }
}

/// A file that can provide a base
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BaseFile {
    pub base: String,
    pub extension: String,
    pub path: PathBuf,
}

impl BaseFile {
    /// `None` when the file name carries no extension
    pub fn new(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let mut parts: Vec<&str> = file_name.split('.').collect();
        if parts.len() < 2 {
            return None;
        }

        let mut extension = parts.pop()?;
        if extension == "dist" && parts.len() >= 2 {
            extension = parts.pop()?;
        }

        let base = parts[0]
            .chars()
            .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { '_' })
            .collect();

        Some(Self {
            base,
            extension: extension.to_string(),
            path,
        })
    }

    /// Read and parse, the result must be a container
    pub fn load(&self, parsers: &Parsers) -> Result<Value> {
        let value = load_file(&self.path, &self.extension, parsers)?;
        if !matches!(value, Value::Object(_) | Value::Array(_)) {
            return Err(Error::malformed(&self.path, "file does not contain a map or list"));
        }

        Ok(value)
    }
}

/// Read and parse a single file as the root map of a config
pub(crate) fn load_root_file(path: &Path, parsers: &Parsers) -> Result<Map> {
    let extension = BaseFile::new(path.to_path_buf())
        .map(|file| file.extension)
        .unwrap_or_default();

    match load_file(path, &extension, parsers)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::malformed(path, "file does not contain a map")),
    }
}

fn load_file(path: &Path, extension: &str, parsers: &Parsers) -> Result<Value> {
    tracing::info!(path=%path.display(), "loading file");

    let Some(parser) = parsers.get(extension) else {
        return Err(Error::malformed(
            path,
            format!("no parser for extension {extension:?}"),
        ));
    };

    let contents = std::fs::read_to_string(path).map_err(|e| Error::malformed(path, e))?;
    parser
        .parse(&contents)
        .map_err(|e| Error::malformed(path, format!("{e:#}")))
}

/// All loadable files in `dir`, sorted by path
///
/// Files without a parser for their extension are skipped.
pub(crate) fn scan_directory(dir: &Path, parsers: &Parsers) -> Result<Vec<BaseFile>> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| Error::malformed(dir, e))?;

    let mut files = vec![];
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| Error::malformed(dir, e))?;
        let is_file = dir_entry
            .file_type()
            .map_err(|e| Error::malformed(dir_entry.path(), e))?
            .is_file();
        if !is_file {
            continue;
        }

        let Some(file) = BaseFile::new(dir_entry.path()) else {
            tracing::debug!(path=%dir_entry.path().display(), "skipping file without extension");
            continue;
        };

        if parsers.get(&file.extension).is_none() {
            tracing::debug!(path=%file.path.display(), "skipping file without parser");
            continue;
        }

        files.push(file);
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
