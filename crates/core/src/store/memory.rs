//! In-process record store.

use super::{RecordStore, Row};
use crate::error::{ClinicalError, ClinicalResult, ConstraintViolation};
use clinrec_uuid::RecordId;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

#[derive(Debug)]
struct StoredRow {
    id: RecordId,
    data: Value,
    unique_key: Option<String>,
}

#[derive(Debug, Default)]
struct Table {
    next_position: u64,
    rows: BTreeMap<u64, StoredRow>,
    positions: HashMap<RecordId, u64>,
    unique: HashMap<String, RecordId>,
}

impl Table {
    /// Unique-key holder other than `id`, if any.
    fn key_holder(&self, key: &str, id: Option<&RecordId>) -> Option<&RecordId> {
        self.unique.get(key).filter(|holder| Some(*holder) != id)
    }
}

/// A [`RecordStore`] held entirely in memory.
///
/// Writers are serialised by a single lock, so each batch is atomic: either every row of a
/// batch is applied or none is.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> ClinicalError {
    ClinicalError::Storage("record store lock poisoned".into())
}

fn duplicate(model: &'static str, key: &str) -> ClinicalError {
    ConstraintViolation::DuplicateKey {
        model,
        key: key.to_string(),
    }
    .into()
}

impl RecordStore for MemoryStore {
    fn insert(&self, model: &'static str, rows: Vec<Row>) -> ClinicalResult<Vec<RecordId>> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let table = tables.entry(model).or_default();

        let mut batch_keys = HashSet::new();
        for row in &rows {
            if let Some(key) = row.unique_key.as_deref() {
                if table.key_holder(key, None).is_some() || !batch_keys.insert(key) {
                    return Err(duplicate(model, key));
                }
            }
        }

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = RecordId::new();
            let position = table.next_position;
            table.next_position += 1;

            if let Some(key) = &row.unique_key {
                table.unique.insert(key.clone(), id.clone());
            }
            table.positions.insert(id.clone(), position);
            table.rows.insert(
                position,
                StoredRow {
                    id: id.clone(),
                    data: row.data,
                    unique_key: row.unique_key,
                },
            );
            ids.push(id);
        }

        tracing::debug!("{}: inserted {} row(s)", model, ids.len());
        Ok(ids)
    }

    fn update(&self, model: &'static str, rows: Vec<(RecordId, Row)>) -> ClinicalResult<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let table = tables.entry(model).or_default();

        let mut batch_keys = HashSet::new();
        for (id, row) in &rows {
            if !table.positions.contains_key(id) {
                return Err(ClinicalError::RecordNotFound {
                    model,
                    id: id.clone(),
                });
            }
            if let Some(key) = row.unique_key.as_deref() {
                if table.key_holder(key, Some(id)).is_some() || !batch_keys.insert(key) {
                    return Err(duplicate(model, key));
                }
            }
        }

        for (id, row) in rows {
            let Some(position) = table.positions.get(&id).copied() else {
                continue;
            };
            let Some(stored) = table.rows.get_mut(&position) else {
                continue;
            };
            if let Some(old_key) = stored.unique_key.take() {
                table.unique.remove(&old_key);
            }
            if let Some(key) = &row.unique_key {
                table.unique.insert(key.clone(), id.clone());
            }
            stored.data = row.data;
            stored.unique_key = row.unique_key;
        }

        Ok(())
    }

    fn fetch(&self, model: &'static str, id: &RecordId) -> ClinicalResult<Option<Value>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.get(model).and_then(|table| {
            table
                .positions
                .get(id)
                .and_then(|position| table.rows.get(position))
                .map(|row| row.data.clone())
        }))
    }

    fn scan(&self, model: &'static str) -> ClinicalResult<Vec<(RecordId, Value)>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .get(model)
            .map(|table| {
                table
                    .rows
                    .values()
                    .map(|row| (row.id.clone(), row.data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
