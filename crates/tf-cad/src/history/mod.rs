//! Operation History
//!
//! The ordered list of features applied to a document. A feature's index in
//! the list is its position; positions are always dense (0..len) and later
//! features are evaluated against the result of earlier ones.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::{FeatureId, FeatureKind, FeatureOp, FeatureRecord};
use crate::kernel::EdgeId;

/// History-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error("Feature not found: {0}")]
    FeatureNotFound(FeatureId),

    #[error("Position {position} out of range for history of {len} features")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Moving {feature} to position {position} would place it out of order with {dependency}")]
    DependencyViolation {
        feature: String,
        dependency: String,
        position: usize,
    },
}

/// An entry in the operation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Stable handle
    pub id: FeatureId,
    /// Display name
    pub name: String,
    /// The operation
    pub op: FeatureOp,
    /// Features whose output this feature consumes
    pub depends_on: Vec<FeatureId>,
    /// Edges created by this feature
    pub produced_edges: Vec<EdgeId>,
}

impl HistoryEntry {
    /// Create a new history entry with no dependencies
    pub fn new(name: impl Into<String>, op: FeatureOp) -> Self {
        Self {
            id: FeatureId::new(),
            name: name.into(),
            op,
            depends_on: Vec::new(),
            produced_edges: Vec::new(),
        }
    }

    /// Record that this feature consumes the output of `features`
    pub fn with_dependencies(mut self, features: impl IntoIterator<Item = FeatureId>) -> Self {
        for id in features {
            if !self.depends_on.contains(&id) {
                self.depends_on.push(id);
            }
        }
        self
    }

    pub fn kind(&self) -> FeatureKind {
        self.op.kind()
    }
}

/// Position-indexed feature history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationHistory {
    entries: Vec<HistoryEntry>,
}

impl OperationHistory {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of features
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the entry at a position
    pub fn get(&self, position: usize) -> Option<&HistoryEntry> {
        self.entries.get(position)
    }

    /// Get an entry by ID
    pub fn get_by_id(&self, id: FeatureId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Get the current position of a feature
    pub fn position_of(&self, id: FeatureId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Append an entry and return its record
    pub fn push(&mut self, entry: HistoryEntry) -> FeatureRecord {
        let position = self.entries.len();
        let record = FeatureRecord {
            id: entry.id,
            kind: entry.kind(),
            name: entry.name.clone(),
            position,
        };
        self.entries.push(entry);
        record
    }

    /// Move a feature to a new position
    ///
    /// Entries between the old and new positions shift by one slot. The move
    /// is rejected if it would evaluate the feature before something it
    /// depends on, or evaluate a dependent before the feature.
    pub fn move_to_position(&mut self, id: FeatureId, position: usize) -> Result<(), HistoryError> {
        let old = self.position_of(id).ok_or(HistoryError::FeatureNotFound(id))?;

        if position >= self.entries.len() {
            return Err(HistoryError::PositionOutOfRange {
                position,
                len: self.entries.len(),
            });
        }

        if position == old {
            return Ok(());
        }

        let moved = &self.entries[old];
        if position < old {
            // Entries in [position, old) will be evaluated after the moved one
            if let Some(dep) = self.entries[position..old]
                .iter()
                .find(|e| moved.depends_on.contains(&e.id))
            {
                return Err(HistoryError::DependencyViolation {
                    feature: moved.name.clone(),
                    dependency: dep.name.clone(),
                    position,
                });
            }
        } else if let Some(dependent) = self.entries[old + 1..=position]
            .iter()
            .find(|e| e.depends_on.contains(&moved.id))
        {
            return Err(HistoryError::DependencyViolation {
                feature: moved.name.clone(),
                dependency: dependent.name.clone(),
                position,
            });
        }

        let entry = self.entries.remove(old);
        self.entries.insert(position, entry);

        tracing::debug!("Moved feature {} from {} to {}", id, old, position);
        Ok(())
    }

    /// Get all history entries in evaluation order
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Current records for every entry, in evaluation order
    pub fn records(&self) -> impl Iterator<Item = FeatureRecord> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, e)| FeatureRecord {
                id: e.id,
                kind: e.kind(),
                name: e.name.clone(),
                position,
            })
    }

    /// Kinds in evaluation order
    pub fn kinds(&self) -> Vec<FeatureKind> {
        self.entries.iter().map(|e| e.kind()).collect()
    }

    /// Find the feature that produced an edge
    pub fn producer_of(&self, edge: EdgeId) -> Option<FeatureId> {
        self.entries
            .iter()
            .find(|e| e.produced_edges.contains(&edge))
            .map(|e| e.id)
    }
}
