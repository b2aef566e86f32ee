//! Where extracted instance files come from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Data directory not found: {0}")]
    Missing(PathBuf),
    #[error("Data path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Contents of one template's instance file.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceFile {
    /// A JSON array of instances.
    Instances(Vec<Value>),
    /// Valid JSON whose top level is not an array.
    NotAList,
    /// Unreadable or malformed file, with the reason.
    Unreadable(String),
}

impl InstanceFile {
    /// Classify a file body.
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(items)) => InstanceFile::Instances(items),
            Ok(_) => InstanceFile::NotAList,
            Err(e) => InstanceFile::Unreadable(e.to_string()),
        }
    }

    pub fn instances(&self) -> Option<&[Value]> {
        match self {
            InstanceFile::Instances(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// Lookup of instance files by template name.
pub trait InstanceSource {
    /// `None` when no file exists for `template`.
    fn load(&self, template: &str) -> Option<InstanceFile>;
}

/// A directory holding one `<Template>.json` file per template.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, SourceError> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(SourceError::Missing(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(SourceError::NotADirectory(root.to_path_buf()));
        }
        Ok(Self { root: root.to_path_buf() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_for(&self, template: &str) -> PathBuf {
        self.root.join(format!("{template}.json"))
    }
}

impl InstanceSource for DataDir {
    fn load(&self, template: &str) -> Option<InstanceFile> {
        let path = self.file_for(template);
        if !path.is_file() {
            return None;
        }
        let file = match std::fs::read_to_string(&path) {
            Ok(body) => InstanceFile::parse(&body),
            Err(e) => InstanceFile::Unreadable(e.to_string()),
        };
        if let InstanceFile::Unreadable(reason) = &file {
            tracing::warn!(path = %path.display(), %reason, "unreadable instance file");
        }
        Some(file)
    }
}

/// In-memory source keyed by template name.
impl InstanceSource for BTreeMap<String, InstanceFile> {
    fn load(&self, template: &str) -> Option<InstanceFile> {
        self.get(template).cloned()
    }
}
