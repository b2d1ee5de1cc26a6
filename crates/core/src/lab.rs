//! Laboratory test requests and lab test orders.
//!
//! A request moves through [`OrderState`]: it is created as `draft`, may be submitted
//! (`requested`), becomes `ordered` once its [`LabTest`] has been created, and `done` once
//! results are recorded against that test.

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

// ============================================================================
// Catalogue
// ============================================================================

/// One analyte measured by a lab test type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabCriterion {
    pub name: NonEmptyText,
    #[serde(default)]
    pub sequence: u32,
    #[serde(default)]
    pub lower_limit: Option<f64>,
    #[serde(default)]
    pub upper_limit: Option<f64>,
    #[serde(default)]
    pub normal_range: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabTestType {
    pub code: NonEmptyText,
    pub name: NonEmptyText,
    #[serde(default)]
    pub criteria: Vec<LabCriterion>,
}

impl Model for LabTestType {
    const MODEL: &'static str = "lab.test_type";

    fn unique_key(&self) -> Option<String> {
        Some(self.code.to_string())
    }
}

// ============================================================================
// Requests and tests
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabTestRequest {
    /// Request number shared by every test requested together.
    pub request: String,
    pub test_type: RecordId,
    pub patient: RecordId,
    #[serde(default)]
    pub doctor: Option<RecordId>,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub state: OrderState,
}

impl Model for LabTestRequest {
    const MODEL: &'static str = "lab.test_request";
}

/// Criterion as copied onto a lab test, with its measured value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabTestCriterion {
    pub name: NonEmptyText,
    pub sequence: u32,
    #[serde(default)]
    pub lower_limit: Option<f64>,
    #[serde(default)]
    pub upper_limit: Option<f64>,
    #[serde(default)]
    pub normal_range: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub result: Option<f64>,
    #[serde(default)]
    pub result_text: Option<String>,
}

impl From<&LabCriterion> for LabTestCriterion {
    fn from(criterion: &LabCriterion) -> Self {
        Self {
            name: criterion.name.clone(),
            sequence: criterion.sequence,
            lower_limit: criterion.lower_limit,
            upper_limit: criterion.upper_limit,
            normal_range: criterion.normal_range.clone(),
            units: criterion.units.clone(),
            result: None,
            result_text: None,
        }
    }
}

impl LabTestCriterion {
    /// Whether a numeric result falls outside the configured limits.
    pub fn is_out_of_range(&self) -> bool {
        match self.result {
            Some(value) => {
                self.lower_limit.is_some_and(|low| value < low)
                    || self.upper_limit.is_some_and(|high| value > high)
            }
            None => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabTest {
    /// Identifier issued from the `lab_test` sequence.
    pub name: String,
    pub test: RecordId,
    pub patient: RecordId,
    #[serde(default)]
    pub requestor: Option<RecordId>,
    pub date_requested: NaiveDateTime,
    /// Originating request.
    pub request: RecordId,
    #[serde(default)]
    pub date_analysis: Option<NaiveDateTime>,
    #[serde(default)]
    pub criteria: Vec<LabTestCriterion>,
    #[serde(default)]
    pub results: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
}

impl Model for LabTest {
    const MODEL: &'static str = "lab.test";

    fn unique_key(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

// ============================================================================
// Flow inputs
// ============================================================================

/// Tests requested together for one patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabOrder {
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

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriterionValue {
    pub name: String,
    #[serde(default)]
    pub result: Option<f64>,
    #[serde(default)]
    pub result_text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabResults {
    /// Defaults to now.
    pub date_analysis: Option<NaiveDateTime>,
    pub values: Vec<CriterionValue>,
    pub results: Option<String>,
    pub diagnosis: Option<String>,
}

// ============================================================================
// Service
// ============================================================================

#[derive(Clone)]
pub struct LabService {
    ctx: CoreContext,
}

impl LabService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    pub fn add_test_type(&self, test_type: LabTestType) -> ClinicalResult<Stored<LabTestType>> {
        let stored = self.ctx.records().create(&test_type)?;
        tracing::info!("added lab test type {}", stored.record.code);
        Ok(stored)
    }

    pub fn test_types(&self) -> ClinicalResult<Vec<Stored<LabTestType>>> {
        self.ctx.records().search::<LabTestType>(|_| true)
    }

    /// Create one draft request per test, all under a single `lab_request` number.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::InvalidInput` if no test is given,
    /// `ClinicalError::NoHealthProfessional` if no doctor is given and none is acting, or a
    /// `ConstraintViolation` if the patient or a test type does not exist.
    pub fn request_tests(&self, order: LabOrder) -> ClinicalResult<Vec<Stored<LabTestRequest>>> {
        if order.tests.is_empty() {
            return Err(ClinicalError::InvalidInput(
                "a lab request needs at least one test".into(),
            ));
        }
        let doctor = match order.doctor {
            Some(doctor) => doctor,
            None => self.ctx.require_professional()?,
        };

        let records = self.ctx.records();
        records.reference::<Patient>(&order.patient)?;
        for test in &order.tests {
            records.reference::<LabTestType>(test)?;
        }

        let request_number = self.ctx.next_identifier(SequenceKind::LabRequest)?;
        let date = order.date.unwrap_or_else(|| self.ctx.now());
        let requests: Vec<LabTestRequest> = order
            .tests
            .iter()
            .map(|test| LabTestRequest {
                request: request_number.clone(),
                test_type: test.clone(),
                patient: order.patient.clone(),
                doctor: Some(doctor.clone()),
                date,
                urgent: order.urgent,
                state: OrderState::Draft,
            })
            .collect();

        let stored = records.create_batch(&requests)?;
        tracing::info!(
            "lab request {}: {} test(s) for patient {}",
            request_number,
            stored.len(),
            order.patient
        );
        Ok(stored)
    }

    /// Move a draft request to `requested`.
    pub fn submit_request(&self, id: &RecordId) -> ClinicalResult<Stored<LabTestRequest>> {
        let _guard = self.ctx.write_guard()?;
        let records = self.ctx.records();
        let mut request = records.get::<LabTestRequest>(id)?;
        request.state = request
            .state
            .transition(OrderState::Requested, LabTestRequest::MODEL, id)?;
        records.write(id, &request)?;
        tracing::info!("lab request {} submitted", id);
        Ok(Stored {
            id: id.clone(),
            record: request,
        })
    }

    /// Create one lab test per request and mark the requests `ordered`.
    ///
    /// Every request is checked before anything is written: if any of them is already
    /// ordered or done, the whole call fails and no lab test is created.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::RecordNotFound` for an unknown request,
    /// `ClinicalError::IllegalStateTransition` for a request that cannot be ordered, or a
    /// `ConstraintViolation` if a request's test type no longer exists.
    pub fn create_orders(&self, ids: &[RecordId]) -> ClinicalResult<Vec<Stored<LabTest>>> {
        let _guard = self.ctx.write_guard()?;
        let records = self.ctx.records();

        let mut seen = HashSet::new();
        let mut requests = Vec::new();
        for id in ids.iter().filter(|id| seen.insert(*id)) {
            let mut request = records.get::<LabTestRequest>(id)?;
            if let Err(err) = request
                .state
                .transition(OrderState::Ordered, LabTestRequest::MODEL, id)
            {
                tracing::warn!("lab test order already created for request {}", id);
                return Err(err);
            }
            request.state = OrderState::Ordered;
            requests.push(Stored {
                id: id.clone(),
                record: request,
            });
        }

        let mut tests = Vec::with_capacity(requests.len());
        for request in &requests {
            let test_type = records.reference::<LabTestType>(&request.record.test_type)?;
            let mut criteria: Vec<LabTestCriterion> =
                test_type.criteria.iter().map(LabTestCriterion::from).collect();
            criteria.sort_by_key(|c| c.sequence);

            tests.push(LabTest {
                name: self.ctx.next_identifier(SequenceKind::LabTest)?,
                test: request.record.test_type.clone(),
                patient: request.record.patient.clone(),
                requestor: request.record.doctor.clone(),
                date_requested: request.record.date,
                request: request.id.clone(),
                date_analysis: None,
                criteria,
                results: None,
                diagnosis: None,
            });
        }

        let created = records.create_batch(&tests)?;
        records.write_batch(&requests)?;
        for test in &created {
            tracing::info!(
                "created lab test {} from request {}",
                test.record.name,
                test.record.request
            );
        }
        Ok(created)
    }

    /// Fill in a lab test's results and close its originating request.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::InvalidInput` for a value naming no criterion of the test, and
    /// `ClinicalError::IllegalStateTransition` if the originating request is not `ordered`.
    pub fn record_results(
        &self,
        lab_test: &RecordId,
        results: LabResults,
    ) -> ClinicalResult<Stored<LabTest>> {
        let _guard = self.ctx.write_guard()?;
        let records = self.ctx.records();
        let mut test = records.get::<LabTest>(lab_test)?;
        let mut request = records.reference::<LabTestRequest>(&test.request)?;
        request.state = request
            .state
            .transition(OrderState::Done, LabTestRequest::MODEL, &test.request)?;

        for value in results.values {
            let criterion = test
                .criteria
                .iter_mut()
                .find(|c| c.name.as_str() == value.name.trim())
                .ok_or_else(|| {
                    ClinicalError::InvalidInput(format!(
                        "lab test {} has no criterion named '{}'",
                        test.name, value.name
                    ))
                })?;
            criterion.result = value.result;
            criterion.result_text = value.result_text;
        }
        test.date_analysis = Some(results.date_analysis.unwrap_or_else(|| self.ctx.now()));
        test.results = results.results;
        test.diagnosis = results.diagnosis;

        records.write(lab_test, &test)?;
        records.write(&test.request, &request)?;
        tracing::info!("recorded results for lab test {}", test.name);
        Ok(Stored {
            id: lab_test.clone(),
            record: test,
        })
    }

    pub fn request(&self, id: &RecordId) -> ClinicalResult<LabTestRequest> {
        self.ctx.records().get(id)
    }

    pub fn lab_test(&self, id: &RecordId) -> ClinicalResult<LabTest> {
        self.ctx.records().get(id)
    }

    pub fn lab_tests_for_request(&self, request: &RecordId) -> ClinicalResult<Vec<Stored<LabTest>>> {
        self.ctx
            .records()
            .search::<LabTest>(|t| &t.request == request)
    }
}
