//! Imaging test requests and results.

use crate::config::SequenceKind;
use crate::context::CoreContext;
use crate::error::{ClinicalError, ClinicalResult};
use crate::orders::OrderState;
use crate::patient::Patient;
use crate::store::{Model, Stored};
use crate::NonEmptyText;
use chrono::NaiveDateTime;
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagingTestType {
    pub code: NonEmptyText,
    pub name: NonEmptyText,
}

impl Model for ImagingTestType {
    const MODEL: &'static str = "imaging.test_type";

    fn unique_key(&self) -> Option<String> {
        Some(self.code.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagingTestRequest {
    /// Request number shared by every test requested together.
    pub request: String,
    pub requested_test: RecordId,
    pub patient: RecordId,
    pub doctor: RecordId,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub state: OrderState,
}

impl Model for ImagingTestRequest {
    const MODEL: &'static str = "imaging.test_request";
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagingTestResult {
    pub patient: RecordId,
    /// When the result was generated.
    pub date: NaiveDateTime,
    pub request_date: NaiveDateTime,
    pub requested_test: RecordId,
    /// Originating request.
    pub request: RecordId,
    pub doctor: RecordId,
}

impl Model for ImagingTestResult {
    const MODEL: &'static str = "imaging.test_result";
}

/// Imaging tests requested together for one patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagingOrder {
    pub patient: RecordId,
    /// Defaults to the acting professional.
    #[serde(default)]
    pub doctor: Option<RecordId>,
    /// Defaults to now.
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub urgent: bool,
    pub tests: Vec<RecordId>,
}

#[derive(Clone)]
pub struct ImagingService {
    ctx: CoreContext,
}

impl ImagingService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    pub fn add_test_type(
        &self,
        test_type: ImagingTestType,
    ) -> ClinicalResult<Stored<ImagingTestType>> {
        let stored = self.ctx.records().create(&test_type)?;
        tracing::info!("added imaging test type {}", stored.record.code);
        Ok(stored)
    }

    pub fn test_types(&self) -> ClinicalResult<Vec<Stored<ImagingTestType>>> {
        self.ctx.records().search::<ImagingTestType>(|_| true)
    }

    /// Create one draft request per test under a single `imaging_request` number.
    pub fn request_tests(
        &self,
        order: ImagingOrder,
    ) -> ClinicalResult<Vec<Stored<ImagingTestRequest>>> {
        if order.tests.is_empty() {
            return Err(ClinicalError::InvalidInput(
                "an imaging request needs at least one test".into(),
            ));
        }
        let doctor = match order.doctor {
            Some(doctor) => doctor,
            None => self.ctx.require_professional()?,
        };

        let records = self.ctx.records();
        records.reference::<Patient>(&order.patient)?;
        for test in &order.tests {
            records.reference::<ImagingTestType>(test)?;
        }

        let request_number = self.ctx.next_identifier(SequenceKind::ImagingRequest)?;
        let date = order.date.unwrap_or_else(|| self.ctx.now());
        let requests: Vec<ImagingTestRequest> = order
            .tests
            .iter()
            .map(|test| ImagingTestRequest {
                request: request_number.clone(),
                requested_test: test.clone(),
                patient: order.patient.clone(),
                doctor: doctor.clone(),
                date,
                urgent: order.urgent,
                state: OrderState::Draft,
            })
            .collect();

        let stored = records.create_batch(&requests)?;
        tracing::info!(
            "imaging request {}: {} test(s) for patient {}",
            request_number,
            stored.len(),
            order.patient
        );
        Ok(stored)
    }

    /// Generate one result per request and close the requests.
    ///
    /// Each request passes through `ordered` to `done`; only `done` is written, in a single
    /// batch after the results are created. Nothing is written if any request is already
    /// ordered or done.
    pub fn create_results(&self, ids: &[RecordId]) -> ClinicalResult<Vec<Stored<ImagingTestResult>>> {
        let _guard = self.ctx.write_guard()?;
        let records = self.ctx.records();

        let mut seen = HashSet::new();
        let mut requests = Vec::new();
        for id in ids.iter().filter(|id| seen.insert(*id)) {
            let mut request = records.get::<ImagingTestRequest>(id)?;
            let closed = request
                .state
                .transition(OrderState::Ordered, ImagingTestRequest::MODEL, id)
                .and_then(|ordered| ordered.transition(OrderState::Done, ImagingTestRequest::MODEL, id));
            match closed {
                Ok(done) => request.state = done,
                Err(err) => {
                    tracing::warn!("imaging request {} already has results", id);
                    return Err(err);
                }
            }
            requests.push(Stored {
                id: id.clone(),
                record: request,
            });
        }

        let now = self.ctx.now();
        let results: Vec<ImagingTestResult> = requests
            .iter()
            .map(|request| ImagingTestResult {
                patient: request.record.patient.clone(),
                date: now,
                request_date: request.record.date,
                requested_test: request.record.requested_test.clone(),
                request: request.id.clone(),
                doctor: request.record.doctor.clone(),
            })
            .collect();

        let created = records.create_batch(&results)?;
        records.write_batch(&requests)?;
        tracing::info!("generated {} imaging result(s)", created.len());
        Ok(created)
    }

    pub fn request(&self, id: &RecordId) -> ClinicalResult<ImagingTestRequest> {
        self.ctx.records().get(id)
    }

    pub fn results_for_request(
        &self,
        request: &RecordId,
    ) -> ClinicalResult<Vec<Stored<ImagingTestResult>>> {
        self.ctx
            .records()
            .search::<ImagingTestResult>(|r| &r.request == request)
    }
}
