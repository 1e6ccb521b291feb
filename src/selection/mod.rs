//! Per-actor selection of a pose or action for interactive preview
//!
//! The store is owned by whoever builds the studio and shared as an
//! `Arc<SelectionStore>`; every reader and writer goes through that handle.
//! Nothing is persisted.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Error, Result};

/// Stable identity of whoever is making a selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ActorId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| Error::format(format!("'{}' is not an actor id: {}", s, e)))
    }
}

/// Last-writer-wins map from actor to selected pose or action name
#[derive(Default)]
pub struct SelectionStore {
    selections: RwLock<HashMap<ActorId, String>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `name` for `actor`, returning the previous selection
    pub fn set(&self, actor: ActorId, name: impl Into<String>) -> Option<String> {
        let name = name.into();
        log::debug!("Actor {} selected '{}'", actor, name);
        self.selections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(actor, name)
    }

    pub fn get(&self, actor: &ActorId) -> Option<String> {
        self.selections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(actor)
            .cloned()
    }

    /// Remove the actor's selection, returning it
    pub fn clear(&self, actor: &ActorId) -> Option<String> {
        self.selections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(actor)
    }

    /// Set or clear in one call
    pub fn update(&self, actor: ActorId, name: Option<String>) -> Option<String> {
        match name {
            Some(name) => self.set(actor, name),
            None => self.clear(&actor),
        }
    }

    pub fn len(&self) -> usize {
        self.selections.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_last_write_wins_and_clear() {
        let store = SelectionStore::new();
        let actor = ActorId::new();

        assert_eq!(store.set(actor, "dance"), None);
        assert_eq!(store.set(actor, "sit"), Some("dance".to_string()));
        assert_eq!(store.get(&actor).as_deref(), Some("sit"));

        assert_eq!(store.clear(&actor).as_deref(), Some("sit"));
        assert_eq!(store.get(&actor), None);
        assert_eq!(store.clear(&actor), None);
    }

    #[test]
    fn test_actors_are_independent() {
        let store = SelectionStore::new();
        let a = ActorId::new();
        let b = ActorId::new();
        store.set(a, "wave");
        store.update(b, Some("walk".into()));
        store.update(a, None);

        assert_eq!(store.get(&a), None);
        assert_eq!(store.get(&b).as_deref(), Some("walk"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_writers_leave_one_selection() {
        let store = Arc::new(SelectionStore::new());
        let actor = ActorId::new();
        let names = ["dance", "sit", "wave", "walk"];

        let handles: Vec<_> = names
            .into_iter()
            .map(|name| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        store.set(actor, name);
                        let seen = store.get(&actor).expect("selection present");
                        assert!(names.contains(&seen.as_str()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        assert_eq!(store.len(), 1);
        assert!(names.contains(&store.get(&actor).unwrap().as_str()));
    }

    #[test]
    fn test_actor_id_parse() {
        let actor = ActorId::new();
        let parsed: ActorId = actor.to_string().parse().unwrap();
        assert_eq!(parsed, actor);
        assert!("not-a-uuid".parse::<ActorId>().is_err());
    }
}
