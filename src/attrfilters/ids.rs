//! # Identifier Registry
//!
//! The source tables key everything by opaque 36-character UUID strings.
//! Everything downstream of the import works on dense integers instead, so
//! the registry hands out `1, 2, 3, ...` in order of first sight and remembers
//! the mapping in both directions.
//!
//! IDs are never reused or renumbered. Attributes and options share a single
//! ID space, which is what lets a precondition UUID be resolved first and
//! classified (attribute or option) afterwards.
//!
//! ## Suffixes
//!
//! For load testing the same export can be imported several times with a
//! different suffix appended to every UUID, producing disjoint copies of the
//! data. The suffix is part of the registry key, so it must only be switched
//! between whole import passes.

use crate::error::{AttrError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    ids: HashMap<String, u32>,
    // reverse[id - 1] is the key that minted `id`
    reverse: Vec<String>,
    suffix: Option<String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the suffix appended to every UUID before lookup.
    pub fn set_suffix(&mut self, suffix: Option<String>) {
        self.suffix = suffix.filter(|s| !s.is_empty());
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Returns the ID for `uuid`, assigning the next one on first sight.
    pub fn resolve(&mut self, uuid: &str) -> Result<u32> {
        if uuid.is_empty() {
            return Err(AttrError::EmptyUuid);
        }
        let key = self.key(uuid);
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }
        let id = self.reverse.len() as u32 + 1;
        self.ids.insert(key.clone(), id);
        self.reverse.push(key);
        Ok(id)
    }

    /// Read-only lookup with the current suffix; never assigns a new ID.
    pub fn lookup(&self, uuid: &str) -> Option<u32> {
        self.lookup_suffixed(uuid, self.suffix.as_deref())
    }

    /// Read-only lookup with an explicit suffix, for rows staged during an
    /// earlier import pass.
    pub fn lookup_suffixed(&self, uuid: &str, suffix: Option<&str>) -> Option<u32> {
        if uuid.is_empty() {
            return None;
        }
        match suffix {
            Some(suffix) => self.ids.get(&format!("{}{}", uuid, suffix)).copied(),
            None => self.ids.get(uuid).copied(),
        }
    }

    /// The (suffixed) UUID that minted `id`.
    pub fn uuid_of(&self, id: u32) -> Option<&str> {
        let idx = (id as usize).checked_sub(1)?;
        self.reverse.get(idx).map(String::as_str)
    }

    /// Like [`uuid_of`](Self::uuid_of) but never fails, for log and error text.
    pub fn describe(&self, id: u32) -> String {
        self.uuid_of(id).unwrap_or("?").to_string()
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.reverse
            .iter()
            .enumerate()
            .map(|(idx, uuid)| (uuid.as_str(), idx as u32 + 1))
    }

    fn key(&self, uuid: &str) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}{}", uuid, suffix),
            None => uuid.to_string(),
        }
    }
}
