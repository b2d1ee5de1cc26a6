//! Record persistence.
//!
//! The core never talks to a database directly. Every module goes through the object-safe
//! [`RecordStore`] trait, which deals in JSON rows grouped by model name, and the typed
//! [`Records`] facade, which maps rows to and from the concrete record structs.
//!
//! A store is responsible for:
//! - assigning identities on create,
//! - applying a batch of creates (or updates) atomically,
//! - rejecting any write that would give two rows of the same model the same unique key.
//!
//! [`MemoryStore`] is the bundled implementation.

mod memory;

pub use memory::MemoryStore;

use crate::error::{ClinicalError, ClinicalResult, ConstraintViolation};
use clinrec_uuid::RecordId;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// A persisted record type.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Model name, used as the table name by stores.
    const MODEL: &'static str;

    /// Declared unique key, if this model has one.
    ///
    /// The store rejects a write whose key is already held by another row of the same model.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// One row handed to a store.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub data: Value,
    pub unique_key: Option<String>,
}

/// Storage collaborator.
pub trait RecordStore: Send + Sync {
    /// Create all `rows` atomically and return their new identities, in order.
    fn insert(&self, model: &'static str, rows: Vec<Row>) -> ClinicalResult<Vec<RecordId>>;

    /// Replace the given rows atomically. Every identity must already exist.
    fn update(&self, model: &'static str, rows: Vec<(RecordId, Row)>) -> ClinicalResult<()>;

    fn fetch(&self, model: &'static str, id: &RecordId) -> ClinicalResult<Option<Value>>;

    /// All rows of `model`, in creation order.
    fn scan(&self, model: &'static str) -> ClinicalResult<Vec<(RecordId, Value)>>;
}

/// A record together with its store-assigned identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stored<M> {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: M,
}

/// Typed facade over a [`RecordStore`].
#[derive(Clone, Copy)]
pub struct Records<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> Records<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    pub fn create<M: Model>(&self, record: &M) -> ClinicalResult<Stored<M>> {
        self.create_batch(std::slice::from_ref(record))?
            .into_iter()
            .next()
            .ok_or_else(|| ClinicalError::Storage(format!("{}: store created no row", M::MODEL)))
    }

    /// Create several records of one model in a single atomic batch.
    pub fn create_batch<M: Model>(&self, records: &[M]) -> ClinicalResult<Vec<Stored<M>>> {
        let rows = records.iter().map(to_row).collect::<ClinicalResult<Vec<_>>>()?;
        let ids = self.store.insert(M::MODEL, rows)?;
        if ids.len() != records.len() {
            return Err(ClinicalError::Storage(format!(
                "{}: store returned {} ids for {} rows",
                M::MODEL,
                ids.len(),
                records.len()
            )));
        }
        Ok(ids
            .into_iter()
            .zip(records.iter().cloned())
            .map(|(id, record)| Stored { id, record })
            .collect())
    }

    pub fn find<M: Model>(&self, id: &RecordId) -> ClinicalResult<Option<M>> {
        self.store
            .fetch(M::MODEL, id)?
            .map(from_value::<M>)
            .transpose()
    }

    /// Look up a record the caller asked for by identity.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::RecordNotFound` if no such record exists.
    pub fn get<M: Model>(&self, id: &RecordId) -> ClinicalResult<M> {
        self.find(id)?.ok_or_else(|| ClinicalError::RecordNotFound {
            model: M::MODEL,
            id: id.clone(),
        })
    }

    /// Look up a record referenced from another record.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation::MissingReference` if no such record exists.
    pub fn reference<M: Model>(&self, id: &RecordId) -> ClinicalResult<M> {
        self.find(id)?.ok_or_else(|| {
            ConstraintViolation::MissingReference {
                model: M::MODEL,
                id: id.clone(),
            }
            .into()
        })
    }

    pub fn write<M: Model>(&self, id: &RecordId, record: &M) -> ClinicalResult<()> {
        self.store.update(M::MODEL, vec![(id.clone(), to_row(record)?)])
    }

    /// Replace several records of one model in a single atomic batch.
    pub fn write_batch<M: Model>(&self, records: &[Stored<M>]) -> ClinicalResult<()> {
        let rows = records
            .iter()
            .map(|stored| Ok((stored.id.clone(), to_row(&stored.record)?)))
            .collect::<ClinicalResult<Vec<_>>>()?;
        self.store.update(M::MODEL, rows)
    }

    /// All records of `M` matching `filter`, in creation order.
    pub fn search<M: Model>(&self, filter: impl Fn(&M) -> bool) -> ClinicalResult<Vec<Stored<M>>> {
        let mut found = Vec::new();
        for (id, value) in self.store.scan(M::MODEL)? {
            let record: M = from_value(value)?;
            if filter(&record) {
                found.push(Stored { id, record });
            }
        }
        Ok(found)
    }
}

fn to_row<M: Model>(record: &M) -> ClinicalResult<Row> {
    Ok(Row {
        data: serde_json::to_value(record).map_err(ClinicalError::Serialization)?,
        unique_key: record.unique_key(),
    })
}

fn from_value<M: Model>(value: Value) -> ClinicalResult<M> {
    serde_json::from_value(value).map_err(ClinicalError::Deserialization)
}
