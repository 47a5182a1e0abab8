//! # Layered Config Store
//!
//! Reads `KEY=VALUE` fragments from one hierarchy level directory.
//!
//! ## Format
//! - Blank lines and lines starting with `#` are ignored
//! - An optional leading `export ` is accepted
//! - The first `=` splits key from value
//! - A value wrapped in matching single or double quotes is unwrapped
//!
//! No escaping beyond quote stripping is supported: `KEY="a\"b"` keeps the
//! backslash and the inner quote verbatim.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use errors::ResolutionError;
use tracing::{debug, trace};

use crate::merge::ConfigMap;

/// File extension of a fragment inside a level directory.
pub const FRAGMENT_EXTENSION: &str = "env";

/// Parse fragment text into a map. Later lines override earlier ones.
pub fn parse_fragment(contents: &str) -> ConfigMap {
    let mut map = ConfigMap::new();

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            trace!(line = index + 1, "Skipping fragment line without '='");
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            trace!(line = index + 1, "Skipping fragment line with empty key");
            continue;
        }

        map.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    map
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Reject relative paths that could leave the configuration root.
fn ensure_contained(relative: &Path) -> Result<(), ResolutionError> {
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if contained {
        Ok(())
    } else {
        Err(ResolutionError::PathTraversal {
            path: relative.to_path_buf(),
        })
    }
}

/// Fragment files under a configuration root.
#[derive(Debug, Clone)]
pub struct FragmentStore {
    root: PathBuf,
}

impl FragmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load one fragment file, relative to the root.
    ///
    /// A missing file is an empty fragment; a present but unreadable one is
    /// an I/O error.
    pub async fn load_fragment(&self, relative: &Path) -> Result<ConfigMap, ResolutionError> {
        ensure_contained(relative)?;
        let path = self.root.join(relative);

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let fragment = parse_fragment(&contents);
                debug!(path = %path.display(), keys = fragment.len(), "Loaded fragment");
                Ok(fragment)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(path = %path.display(), "Fragment not found");
                Ok(ConfigMap::new())
            }
            Err(source) => Err(ResolutionError::Io { path, source }),
        }
    }

    /// Load every `*.env` fragment directly inside a level directory, in
    /// lexicographic file-name order. A missing directory has no fragments.
    pub async fn load_level(&self, relative_dir: &Path) -> Result<Vec<ConfigMap>, ResolutionError> {
        ensure_contained(relative_dir)?;
        let dir = self.root.join(relative_dir);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(dir = %dir.display(), "Level directory not found");
                return Ok(Vec::new());
            }
            Err(source) => return Err(ResolutionError::Io { path: dir, source }),
        };

        let mut names = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(ResolutionError::Io {
                        path: dir.clone(),
                        source,
                    });
                }
            };

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
                continue;
            }
            let is_file = entry
                .file_type()
                .await
                .map_err(|source| ResolutionError::Io {
                    path: path.clone(),
                    source,
                })?
                .is_file();
            if is_file {
                names.push(entry.file_name());
            }
        }
        names.sort();

        let mut fragments = Vec::with_capacity(names.len());
        for name in names {
            fragments.push(self.load_fragment(&relative_dir.join(name)).await?);
        }
        Ok(fragments)
    }
}
