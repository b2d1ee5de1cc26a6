//! Shared fixtures for unit tests.

use crate::context::{CoreContext, FixedClock};
use crate::patient::{Patient, PatientService};
use crate::error::ClinicalResult;
use crate::sequence::MemorySequences;
use crate::store::{MemoryStore, RecordStore, Row, Stored};
use crate::{CoreConfig, NonEmptyText};
use chrono::{NaiveDate, NaiveDateTime};
use clinrec_uuid::RecordId;
use serde_json::Value;
use std::sync::{Arc, Barrier};
use std::time::Duration;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub(crate) fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(10, 0, 0).expect("valid test time")
}

/// In-memory context frozen at 2024-06-01 10:00.
pub(crate) fn test_ctx() -> CoreContext {
    CoreContext::in_memory(Arc::new(CoreConfig::default()))
        .with_clock(Arc::new(FixedClock(at(2024, 6, 1))))
}

pub(crate) fn test_patient(ctx: &CoreContext, name: &str) -> Stored<Patient> {
    PatientService::new(ctx.clone())
        .register(NonEmptyText::new(name).expect("non-empty name"), Some(date(1992, 4, 20)))
        .expect("register should succeed")
}

/// Memory store whose inserts stall, widening the window between a flow's reads and writes.
pub(crate) struct SlowInsertStore {
    inner: MemoryStore,
    delay: Duration,
}

impl RecordStore for SlowInsertStore {
    fn insert(&self, model: &'static str, rows: Vec<Row>) -> ClinicalResult<Vec<RecordId>> {
        std::thread::sleep(self.delay);
        self.inner.insert(model, rows)
    }

    fn update(&self, model: &'static str, rows: Vec<(RecordId, Row)>) -> ClinicalResult<()> {
        self.inner.update(model, rows)
    }

    fn fetch(&self, model: &'static str, id: &RecordId) -> ClinicalResult<Option<Value>> {
        self.inner.fetch(model, id)
    }

    fn scan(&self, model: &'static str) -> ClinicalResult<Vec<(RecordId, Value)>> {
        self.inner.scan(model)
    }
}

/// Like [`test_ctx`], backed by a [`SlowInsertStore`].
pub(crate) fn slow_ctx() -> CoreContext {
    let store = SlowInsertStore {
        inner: MemoryStore::new(),
        delay: Duration::from_millis(50),
    };
    CoreContext::new(
        Arc::new(CoreConfig::default()),
        Arc::new(store),
        Arc::new(MemorySequences::new()),
    )
    .with_clock(Arc::new(FixedClock(at(2024, 6, 1))))
}

/// Run `f` on two threads released together and collect both outcomes.
pub(crate) fn race<T: Send>(f: impl Fn() -> T + Sync) -> [T; 2] {
    let barrier = Barrier::new(2);
    std::thread::scope(|scope| {
        let run = || {
            barrier.wait();
            f()
        };
        let first = scope.spawn(run);
        let second = scope.spawn(run);
        [
            first.join().expect("first thread panicked"),
            second.join().expect("second thread panicked"),
        ]
    })
}
