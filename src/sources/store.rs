//! Storage seam for real sensor readings

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// One reading as delivered by storage. `None` marks a reading that was
/// unavailable or non-numeric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Storage collaborator: all readings for one entity, ordered by time.
pub trait TimeseriesStore {
    fn fetch(&self, entity_id: &str) -> Result<Vec<RawSample>>;
}

/// Map-backed store for tests and offline tools.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entities: HashMap<String, Vec<RawSample>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_id: impl Into<String>, mut samples: Vec<RawSample>) {
        samples.sort_by_key(|s| s.timestamp);
        self.entities.insert(entity_id.into(), samples);
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }
}

impl TimeseriesStore for InMemoryStore {
    fn fetch(&self, entity_id: &str) -> Result<Vec<RawSample>> {
        self.entities
            .get(entity_id)
            .cloned()
            .ok_or_else(|| AnalysisError::UnknownEntity(entity_id.to_string()))
    }
}
