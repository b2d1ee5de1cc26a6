//! Explicit execution context for core operations.
//!
//! Every operation that touches persistence, sequences, time or the acting user receives a
//! [`CoreContext`] instead of reaching for process-wide state.

use crate::config::{CoreConfig, SequenceKind};
use crate::error::{ClinicalError, ClinicalResult};
use crate::sequence::{MemorySequences, SequenceGenerator};
use crate::store::{MemoryStore, RecordStore, Records};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clinrec_uuid::RecordId;
use std::sync::{Arc, Mutex, MutexGuard};

/// Source of the current timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Local wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Collaborators shared by all core services.
#[derive(Clone)]
pub struct CoreContext {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn RecordStore>,
    sequences: Arc<dyn SequenceGenerator>,
    clock: Arc<dyn Clock>,
    professional: Option<RecordId>,
    /// Shared by every clone, so check-then-write flows on one store run one at a time.
    writes: Arc<Mutex<()>>,
}

impl CoreContext {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: Arc<dyn RecordStore>,
        sequences: Arc<dyn SequenceGenerator>,
    ) -> Self {
        Self {
            cfg,
            store,
            sequences,
            clock: Arc::new(SystemClock),
            professional: None,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// A context backed by a fresh [`MemoryStore`] and [`MemorySequences`].
    pub fn in_memory(cfg: Arc<CoreConfig>) -> Self {
        Self::new(
            cfg,
            Arc::new(MemoryStore::new()),
            Arc::new(MemorySequences::new()),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Same collaborators, acting on behalf of `professional`.
    pub fn acting_as(&self, professional: Option<RecordId>) -> Self {
        Self {
            professional,
            ..self.clone()
        }
    }

    pub fn cfg(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn records(&self) -> Records<'_> {
        Records::new(self.store.as_ref())
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn acting_professional(&self) -> Option<&RecordId> {
        self.professional.as_ref()
    }

    /// # Errors
    ///
    /// Returns `ClinicalError::NoHealthProfessional` when no professional is acting.
    pub fn require_professional(&self) -> ClinicalResult<RecordId> {
        self.professional
            .clone()
            .ok_or(ClinicalError::NoHealthProfessional)
    }

    /// Hold this while reading state that decides a write, until the write is done.
    ///
    /// Not reentrant: a flow holding the guard must not call another guarded flow.
    pub fn write_guard(&self) -> ClinicalResult<MutexGuard<'_, ()>> {
        self.writes
            .lock()
            .map_err(|_| ClinicalError::Storage("write guard poisoned".into()))
    }

    /// Draw the next value of `kind` and render it with the configured policy.
    pub fn next_identifier(&self, kind: SequenceKind) -> ClinicalResult<String> {
        let value = self.sequences.next_value(kind.name())?;
        Ok(self.cfg.sequence_policy(kind).format(value))
    }
}
