//! Bounded search history and its persistence
//!
//! History is ordered most-recent-first, holds at most `limit` entries and
//! never contains duplicates. Recording a query that is already present is a
//! no-op: the existing entry keeps its position.

use crate::error::{HistoryError, HistoryResult};
use crate::types::Query;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Name of the key holding the list inside the persisted document
pub const DEFAULT_HISTORY_KEY: &str = "PreviousSearches";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryList {
    entries: Vec<String>,
    limit: usize,
}

impl Default for HistoryList {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryList {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Build from persisted entries, dropping blanks and duplicates and
    /// truncating to `limit`.
    pub fn from_entries<I, S>(entries: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new(limit);
        for entry in entries {
            if list.entries.len() >= limit {
                break;
            }
            if let Some(query) = Query::parse(entry.as_ref()) {
                if !list.contains(query.as_str()) {
                    list.entries.push(query.into());
                }
            }
        }
        list
    }

    /// Insert `query` at the front unless already present. Returns whether the list changed.
    pub fn record(&mut self, query: &Query) -> bool {
        if self.limit == 0 || self.contains(query.as_str()) {
            return false;
        }
        self.entries.insert(0, query.as_str().to_string());
        self.entries.truncate(self.limit);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries.iter().any(|entry| entry == query)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Durable storage for the history list.
#[cfg_attr(test, mockall::automock)]
pub trait HistoryStore: Send {
    /// Persisted entries, most recent first.
    fn load(&self) -> HistoryResult<Vec<String>>;

    /// Insert `query` at the front if absent, dropping the oldest entry past the limit.
    fn record(&mut self, query: &Query) -> HistoryResult<()>;

    /// Erase all persisted history.
    fn clear(&mut self) -> HistoryResult<()>;
}

/// History persisted as one named key inside a JSON document.
///
/// Other keys in the document are preserved. A missing file reads as empty
/// history; an unreadable or corrupt file is reported as an error by
/// [`HistoryStore::load`] and overwritten by the next successful write.
#[derive(Debug, Clone)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
    key: String,
    limit: usize,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>, limit: usize) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            limit,
        }
    }

    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DEFAULT_HISTORY_KEY, DEFAULT_HISTORY_LIMIT)
    }

    fn read_document(&self) -> HistoryResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Read the document, tolerating corruption so that writes can recover it.
    fn read_document_lenient(&self) -> Map<String, Value> {
        match self.read_document() {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Discarding unreadable history file {}: {}", self.path.display(), e);
                Map::new()
            }
        }
    }

    fn list_from(&self, document: &Map<String, Value>) -> HistoryList {
        let entries = document
            .get(&self.key)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        HistoryList::from_entries(entries, self.limit)
    }

    fn write_document(&self, document: &Map<String, Value>) -> HistoryResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| HistoryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content).map_err(|source| HistoryError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| HistoryError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn load(&self) -> HistoryResult<Vec<String>> {
        let document = self.read_document()?;
        Ok(self.list_from(&document).entries().to_vec())
    }

    fn record(&mut self, query: &Query) -> HistoryResult<()> {
        let mut document = self.read_document_lenient();
        let mut list = self.list_from(&document);
        if !list.record(query) {
            log::trace!("History already contains '{}'", query);
            return Ok(());
        }

        document.insert(
            self.key.clone(),
            Value::Array(list.entries().iter().cloned().map(Value::String).collect()),
        );
        self.write_document(&document)?;
        log::debug!("Recorded '{}' into {}", query, self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> HistoryResult<()> {
        let mut document = self.read_document_lenient();
        document.remove(&self.key);
        self.write_document(&document)?;
        log::debug!("Cleared history in {}", self.path.display());
        Ok(())
    }
}

/// In-process store. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    list: Arc<Mutex<HistoryList>>,
}

impl MemoryHistoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            list: Arc::new(Mutex::new(HistoryList::new(limit))),
        }
    }

    pub fn with_entries<I, S>(entries: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            list: Arc::new(Mutex::new(HistoryList::from_entries(entries, limit))),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries()
            .to_vec()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> HistoryResult<Vec<String>> {
        Ok(self.entries())
    }

    fn record(&mut self, query: &Query) -> HistoryResult<()> {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(query);
        Ok(())
    }

    fn clear(&mut self) -> HistoryResult<()> {
        self.list
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
