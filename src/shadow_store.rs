use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::constants::READY_SENTINEL;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("update is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("update must be an object with a \"state\" object")]
    MissingState,
    #[error("section {0:?} must be an object")]
    SectionNotObject(String),
    #[error("value for {key:?} in {section:?} must be a string or null")]
    NonStringValue { section: String, key: String },
}

#[derive(Clone, Debug, Default)]
pub struct ShadowStore {
    desired: BTreeMap<String, String>,
    reported: BTreeMap<String, String>,
    version: u64,
}

enum Change {
    Set(String),
    Delete,
}

impl ShadowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `{"state": {"desired": {..}, "reported": {..}}}` into the store.
    /// The whole update is validated before anything is applied.
    pub fn apply_update(&mut self, body: &str) -> Result<u64, StoreError> {
        let root: Value = serde_json::from_str(body)?;
        let state = root
            .get("state")
            .and_then(Value::as_object)
            .ok_or(StoreError::MissingState)?;

        let desired = collect_changes(state, "desired")?;
        let reported = collect_changes(state, "reported")?;

        for (key, change) in reported {
            apply_change(&mut self.reported, key, change);
        }
        for (key, change) in desired {
            if matches!(&change, Change::Set(value) if value == READY_SENTINEL) {
                self.reported.remove(&key);
            }
            apply_change(&mut self.desired, key, change);
        }
        self.version += 1;
        Ok(self.version)
    }

    pub fn set_reported(&mut self, key: &str, value: &str) -> u64 {
        self.reported.insert(key.to_owned(), value.to_owned());
        self.version += 1;
        self.version
    }

    pub fn desired(&self, key: &str) -> Option<&str> {
        self.desired.get(key).map(String::as_str)
    }

    pub fn reported(&self, key: &str) -> Option<&str> {
        self.reported.get(key).map(String::as_str)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn to_value(&self) -> Value {
        json!({
            "state": {
                "desired": self.desired,
                "reported": self.reported,
            },
            "version": self.version,
        })
    }

    pub fn render(&self) -> String {
        self.to_value().to_string()
    }
}

fn collect_changes(
    state: &Map<String, Value>,
    section: &str,
) -> Result<Vec<(String, Change)>, StoreError> {
    let Some(raw) = state.get(section) else {
        return Ok(Vec::new());
    };
    let entries = raw
        .as_object()
        .ok_or_else(|| StoreError::SectionNotObject(section.to_owned()))?;
    entries
        .iter()
        .map(|(key, value)| match value {
            Value::String(text) => Ok((key.clone(), Change::Set(text.clone()))),
            Value::Null => Ok((key.clone(), Change::Delete)),
            _ => Err(StoreError::NonStringValue {
                section: section.to_owned(),
                key: key.clone(),
            }),
        })
        .collect()
}

fn apply_change(map: &mut BTreeMap<String, String>, key: String, change: Change) {
    match change {
        Change::Set(value) => {
            map.insert(key, value);
        }
        Change::Delete => {
            map.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::{encode, ShadowDocument};

    #[test]
    fn device_publish_merges_into_desired() {
        let mut store = ShadowStore::new();
        let version = store
            .apply_update(&encode([("pac_loc", "60 100"), ("score", "0")]))
            .expect("device envelope should apply");
        assert_eq!(version, 1);
        assert_eq!(store.desired("pac_loc"), Some("60 100"));
        assert_eq!(store.reported("pac_loc"), None);
    }

    #[test]
    fn ready_sentinel_clears_consumed_queue() {
        let mut store = ShadowStore::new();
        store.set_reported("b1_q", "0123");
        store
            .apply_update(&encode([("b1_q", "ready")]))
            .expect("update should apply");
        assert_eq!(store.reported("b1_q"), None);
        assert_eq!(store.desired("b1_q"), Some("ready"));
    }

    #[test]
    fn null_deletes_keys() {
        let mut store = ShadowStore::new();
        store.set_reported("b2_q", "33");
        store
            .apply_update(r#"{"state":{"reported":{"b2_q":null}}}"#)
            .expect("delete should apply");
        assert_eq!(store.reported("b2_q"), None);
    }

    #[test]
    fn invalid_updates_change_nothing() {
        let mut store = ShadowStore::new();
        store.set_reported("b1_q", "1");
        let before = store.version();

        assert!(matches!(
            store.apply_update("not json"),
            Err(StoreError::InvalidJson(_))
        ));
        assert!(matches!(
            store.apply_update(r#"{"desired":{}}"#),
            Err(StoreError::MissingState)
        ));
        assert!(matches!(
            store.apply_update(r#"{"state":{"reported":[]}}"#),
            Err(StoreError::SectionNotObject(_))
        ));
        assert!(matches!(
            store.apply_update(r#"{"state":{"desired":{"b1_q":"ready"},"reported":{"x":3}}}"#),
            Err(StoreError::NonStringValue { .. })
        ));
        assert_eq!(store.reported("b1_q"), Some("1"));
        assert_eq!(store.version(), before);
    }

    #[test]
    fn render_is_readable_by_device_decoder() {
        let mut store = ShadowStore::new();
        store
            .apply_update(&encode([("b1_q", "ready"), ("pac_loc", "4 8")]))
            .expect("update should apply");
        store.set_reported("b1_q", "2211");
        let text = store.render();
        assert_eq!(
            text,
            r#"{"state":{"desired":{"b1_q":"ready","pac_loc":"4 8"},"reported":{"b1_q":"2211"}},"version":2}"#
        );
        assert_eq!(ShadowDocument::decode(&text).lookup("b1_q"), Some("2211"));
    }
}
