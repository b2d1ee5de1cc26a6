//! # API REST
//!
//! REST API for the clinical records core.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! The acting health professional is taken from the `x-professional-id` header. Requests
//! without it run with no professional, and operations that need one answer `400`.

#![warn(rust_2018_idioms)]

pub mod dto;

use axum::{
    extract::{Path as AxumPath, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use clinrec_core::{
    gestation::{due_date, GestationalAge},
    gyneco::{ObstetricsService, Perinatal, Pregnancy, PregnancyService, PrenatalEvaluation},
    imaging::{ImagingOrder, ImagingService},
    lab::{LabOrder, LabResults, LabService},
    nursing::{AmbulatorySessionDraft, NursingService, RoundingDraft},
    patient::PatientService,
    socioeconomics::{FamilyApgar, SocioeconomicProfile, SocioeconomicService},
    store::Stored,
    surgery::{CardiacRiskFactors, Surgery, SurgeryService},
    ClinicalError, ConstraintViolation, CoreContext, NonEmptyText,
};
use clinrec_uuid::RecordId;
use dto::*;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Header naming the health professional a request acts for.
pub const PROFESSIONAL_HEADER: &str = "x-professional-id";

type ApiError = (StatusCode, String);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Application state for the REST API server
///
/// Every handler derives its per-request context from the shared [`CoreContext`].
#[derive(Clone)]
pub struct AppState {
    ctx: CoreContext,
}

impl AppState {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_patient,
        get_patient,
        open_evaluation,
        list_pregnancies,
        record_rcri,
        create_pregnancy,
        get_pregnancy,
        update_pregnancy,
        record_prenatal,
        prenatal_gestational_age,
        admit_perinatal,
        perinatal_gestational_age,
        calculate_due_date,
        calculate_rcri,
        calculate_family_apgar,
        save_socioeconomics,
        register_surgery,
        age_at_surgery,
        list_lab_test_types,
        request_lab_tests,
        submit_lab_request,
        create_lab_orders,
        record_lab_results,
        request_imaging_tests,
        create_imaging_results,
        start_ambulatory_session,
        record_rounding,
    ),
    components(schemas(
        HealthRes,
        RecordRes,
        RecordListRes,
        CreatePatientReq,
        OpenEvaluationReq,
        PregnancyRes,
        GestationalAgeRes,
        DueDateReq,
        DueDateRes,
        RcriReq,
        RcriRes,
        FamilyApgarReq,
        FamilyApgarRes,
        AgeAtSurgeryRes,
        RequestIdsReq,
    ))
)]
pub struct ApiDoc;

/// Build the REST router, Swagger UI included.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", post(create_patient))
        .route("/patients/:id", get(get_patient))
        .route("/patients/:id/evaluations", post(open_evaluation))
        .route("/patients/:id/pregnancies", get(list_pregnancies))
        .route("/patients/:id/rcri", post(record_rcri))
        .route("/pregnancies", post(create_pregnancy))
        .route("/pregnancies/:id", get(get_pregnancy).put(update_pregnancy))
        .route("/prenatal-evaluations", post(record_prenatal))
        .route(
            "/prenatal-evaluations/:id/gestational-age",
            get(prenatal_gestational_age),
        )
        .route("/perinatal", post(admit_perinatal))
        .route("/perinatal/:id/gestational-age", get(perinatal_gestational_age))
        .route("/calculators/due-date", post(calculate_due_date))
        .route("/calculators/rcri", post(calculate_rcri))
        .route("/calculators/family-apgar", post(calculate_family_apgar))
        .route("/socioeconomics", post(save_socioeconomics))
        .route("/surgeries", post(register_surgery))
        .route("/surgeries/:id/age", get(age_at_surgery))
        .route("/lab/test-types", get(list_lab_test_types))
        .route("/lab/requests", post(request_lab_tests))
        .route("/lab/requests/:id/submit", post(submit_lab_request))
        .route("/lab/orders", post(create_lab_orders))
        .route("/lab/tests/:id/results", post(record_lab_results))
        .route("/imaging/requests", post(request_imaging_tests))
        .route("/imaging/results", post(create_imaging_results))
        .route("/ambulatory-sessions", post(start_ambulatory_session))
        .route("/roundings", post(record_rounding))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Helpers
// ============================================================================

fn status_for(err: &ClinicalError) -> StatusCode {
    match err {
        ClinicalError::InvalidInput(_)
        | ClinicalError::NoHealthProfessional
        | ClinicalError::Text(_)
        | ClinicalError::Uuid(_) => StatusCode::BAD_REQUEST,
        ClinicalError::Constraint(
            ConstraintViolation::MissingField { .. } | ConstraintViolation::MissingReference { .. },
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        ClinicalError::Constraint(_) | ClinicalError::IllegalStateTransition { .. } => {
            StatusCode::CONFLICT
        }
        ClinicalError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a core error to a response, logging it on the way out.
fn api_error(action: &str, err: ClinicalError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("{} error: {:?}", action, err);
        (status, "Internal error".into())
    } else {
        tracing::warn!("{} rejected: {}", action, err);
        (status, err.to_string())
    }
}

fn parse_id(kind: &str, raw: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).map_err(|e| {
        tracing::error!("Invalid {} id: {:?}", kind, e);
        (StatusCode::BAD_REQUEST, format!("Invalid {kind} id"))
    })
}

fn parse_ids(kind: &str, raw: &[String]) -> Result<Vec<RecordId>, ApiError> {
    raw.iter().map(|id| parse_id(kind, id)).collect()
}

/// The request context, acting for the professional named in the header (if any).
fn acting(state: &AppState, headers: &HeaderMap) -> Result<CoreContext, ApiError> {
    let Some(value) = headers.get(PROFESSIONAL_HEADER) else {
        return Ok(state.ctx.acting_as(None));
    };
    let raw = value.to_str().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid {PROFESSIONAL_HEADER} header"),
        )
    })?;
    let professional = parse_id("health professional", raw)?;
    Ok(state.ctx.acting_as(Some(professional)))
}

fn record_res<M: Serialize>(stored: &Stored<M>) -> Result<RecordRes, ApiError> {
    RecordRes::from_stored(stored)
        .map_err(|e| api_error("Serialise record", ClinicalError::Serialization(e)))
}

fn record_list<M: Serialize>(stored: &[Stored<M>]) -> ApiResult<RecordListRes> {
    let records = stored.iter().map(record_res).collect::<Result<_, _>>()?;
    Ok(Json(RecordListRes { records }))
}

fn pregnancy_res(stored: &Stored<Pregnancy>) -> ApiResult<PregnancyRes> {
    let res = record_res(stored)?;
    Ok(Json(PregnancyRes {
        id: res.id,
        record: res.record,
        pdd: stored.record.pdd(),
        end_age_weeks: stored.record.end_age_weeks(),
    }))
}

fn gestational_age_res(age: GestationalAge) -> GestationalAgeRes {
    GestationalAgeRes {
        days: Some(age.days()),
        weeks: age.weeks(),
    }
}

fn rcri_res(id: Option<String>, factors: &CardiacRiskFactors) -> RcriRes {
    RcriRes {
        id,
        total: factors.total(),
        class: factors.class().to_string(),
    }
}

fn risk_factors(req: &RcriReq) -> CardiacRiskFactors {
    CardiacRiskFactors {
        rcri_high_risk_surgery: req.rcri_high_risk_surgery,
        rcri_ischemic_history: req.rcri_ischemic_history,
        rcri_congestive_history: req.rcri_congestive_history,
        rcri_diabetes_history: req.rcri_diabetes_history,
        rcri_cerebrovascular_history: req.rcri_cerebrovascular_history,
        rcri_kidney_history: req.rcri_kidney_history,
    }
}

fn family_apgar(req: &FamilyApgarReq) -> FamilyApgar {
    FamilyApgar {
        fam_apgar_help: req.fam_apgar_help,
        fam_apgar_discussion: req.fam_apgar_discussion,
        fam_apgar_decisions: req.fam_apgar_decisions,
        fam_apgar_timesharing: req.fam_apgar_timesharing,
        fam_apgar_affection: req.fam_apgar_affection,
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Clinical records REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 200, description = "Patient registered", body = RecordRes),
        (status = 400, description = "Bad request")
    )
)]
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> ApiResult<RecordRes> {
    let name = NonEmptyText::new(&req.name)
        .map_err(|e| api_error("Register patient", e.into()))?;
    let stored = PatientService::new(state.ctx.clone())
        .register(name, req.date_of_birth)
        .map_err(|e| api_error("Register patient", e))?;
    Ok(Json(record_res(&stored)?))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    responses(
        (status = 200, description = "Patient", body = RecordRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<RecordRes> {
    let id = parse_id("patient", &id)?;
    let record = PatientService::new(state.ctx.clone())
        .get(&id)
        .map_err(|e| api_error("Read patient", e))?;
    Ok(Json(record_res(&Stored { id, record })?))
}

#[utoipa::path(
    post,
    path = "/patients/{id}/evaluations",
    request_body = OpenEvaluationReq,
    responses(
        (status = 200, description = "Evaluation opened", body = RecordRes),
        (status = 422, description = "Unknown patient")
    )
)]
/// Open an evaluation, attributed to the acting professional when one is given.
#[axum::debug_handler]
async fn open_evaluation(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<OpenEvaluationReq>,
) -> ApiResult<RecordRes> {
    let ctx = acting(&state, &headers)?;
    let patient = parse_id("patient", &id)?;
    let stored = PatientService::new(ctx)
        .record_evaluation(&patient, req.evaluation_start)
        .map_err(|e| api_error("Open evaluation", e))?;
    Ok(Json(record_res(&stored)?))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/pregnancies",
    responses(
        (status = 200, description = "The patient's pregnancies", body = RecordListRes)
    )
)]
#[axum::debug_handler]
async fn list_pregnancies(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<RecordListRes> {
    let patient = parse_id("patient", &id)?;
    let stored = PregnancyService::new(state.ctx.clone())
        .list_for_patient(&patient)
        .map_err(|e| api_error("List pregnancies", e))?;
    record_list(&stored)
}

#[utoipa::path(
    post,
    path = "/patients/{id}/rcri",
    request_body = RcriReq,
    responses(
        (status = 200, description = "Assessment recorded", body = RcriRes),
        (status = 422, description = "Unknown patient")
    )
)]
#[axum::debug_handler]
async fn record_rcri(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<RcriReq>,
) -> ApiResult<RcriRes> {
    let ctx = acting(&state, &headers)?;
    let patient = parse_id("patient", &id)?;
    let stored = SurgeryService::new(ctx)
        .assess_cardiac_risk(&patient, req.rcri_date, risk_factors(&req))
        .map_err(|e| api_error("Record RCRI", e))?;
    Ok(Json(rcri_res(
        Some(stored.id.to_string()),
        &stored.record.factors,
    )))
}

#[utoipa::path(
    post,
    path = "/pregnancies",
    responses(
        (status = 200, description = "Pregnancy created", body = PregnancyRes),
        (status = 409, description = "Patient already pregnant or gravida taken"),
        (status = 422, description = "Missing end data or unknown patient")
    )
)]
/// Create a pregnancy. The body is a pregnancy record.
#[axum::debug_handler]
async fn create_pregnancy(
    State(state): State<AppState>,
    Json(pregnancy): Json<Pregnancy>,
) -> ApiResult<PregnancyRes> {
    let stored = PregnancyService::new(state.ctx.clone())
        .create(pregnancy)
        .map_err(|e| api_error("Create pregnancy", e))?;
    pregnancy_res(&stored)
}

#[utoipa::path(
    get,
    path = "/pregnancies/{id}",
    responses(
        (status = 200, description = "Pregnancy with derived dates", body = PregnancyRes),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
async fn get_pregnancy(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<PregnancyRes> {
    let id = parse_id("pregnancy", &id)?;
    let record = PregnancyService::new(state.ctx.clone())
        .get(&id)
        .map_err(|e| api_error("Read pregnancy", e))?;
    pregnancy_res(&Stored { id, record })
}

#[utoipa::path(
    put,
    path = "/pregnancies/{id}",
    responses(
        (status = 200, description = "Pregnancy updated", body = PregnancyRes),
        (status = 404, description = "Not found"),
        (status = 409, description = "Patient already pregnant or gravida taken")
    )
)]
#[axum::debug_handler]
async fn update_pregnancy(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(pregnancy): Json<Pregnancy>,
) -> ApiResult<PregnancyRes> {
    let id = parse_id("pregnancy", &id)?;
    let stored = PregnancyService::new(state.ctx.clone())
        .update(&id, pregnancy)
        .map_err(|e| api_error("Update pregnancy", e))?;
    pregnancy_res(&stored)
}

#[utoipa::path(
    post,
    path = "/prenatal-evaluations",
    responses(
        (status = 200, description = "Prenatal evaluation recorded", body = RecordRes)
    )
)]
#[axum::debug_handler]
async fn record_prenatal(
    State(state): State<AppState>,
    Json(evaluation): Json<PrenatalEvaluation>,
) -> ApiResult<RecordRes> {
    let stored = ObstetricsService::new(state.ctx.clone())
        .record_prenatal(evaluation)
        .map_err(|e| api_error("Record prenatal evaluation", e))?;
    Ok(Json(record_res(&stored)?))
}

#[utoipa::path(
    get,
    path = "/prenatal-evaluations/{id}/gestational-age",
    responses(
        (status = 200, description = "Gestational age at the evaluation", body = GestationalAgeRes)
    )
)]
#[axum::debug_handler]
async fn prenatal_gestational_age(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<GestationalAgeRes> {
    let id = parse_id("prenatal evaluation", &id)?;
    let age = ObstetricsService::new(state.ctx.clone())
        .prenatal_gestational_age(&id)
        .map_err(|e| api_error("Prenatal gestational age", e))?;
    Ok(Json(gestational_age_res(age)))
}

#[utoipa::path(
    post,
    path = "/perinatal",
    responses(
        (status = 200, description = "Admission recorded", body = RecordRes)
    )
)]
#[axum::debug_handler]
async fn admit_perinatal(
    State(state): State<AppState>,
    Json(perinatal): Json<Perinatal>,
) -> ApiResult<RecordRes> {
    let stored = ObstetricsService::new(state.ctx.clone())
        .admit_perinatal(perinatal)
        .map_err(|e| api_error("Admit perinatal", e))?;
    Ok(Json(record_res(&stored)?))
}

#[utoipa::path(
    get,
    path = "/perinatal/{id}/gestational-age",
    responses(
        (status = 200, description = "Gestational weeks at admission", body = GestationalAgeRes)
    )
)]
#[axum::debug_handler]
async fn perinatal_gestational_age(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<GestationalAgeRes> {
    let id = parse_id("perinatal", &id)?;
    let weeks = ObstetricsService::new(state.ctx.clone())
        .perinatal_gestational_weeks(&id)
        .map_err(|e| api_error("Perinatal gestational age", e))?;
    Ok(Json(GestationalAgeRes { days: None, weeks }))
}

#[utoipa::path(
    post,
    path = "/calculators/due-date",
    request_body = DueDateReq,
    responses(
        (status = 200, description = "Presumed delivery date", body = DueDateRes),
        (status = 400, description = "Date out of range")
    )
)]
#[axum::debug_handler]
async fn calculate_due_date(
    State(_state): State<AppState>,
    Json(req): Json<DueDateReq>,
) -> ApiResult<DueDateRes> {
    let pdd = due_date(req.lmp).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("no due date can be computed from {}", req.lmp),
        )
    })?;
    Ok(Json(DueDateRes {
        pdd,
        gestational_age: req
            .on
            .map(|on| gestational_age_res(GestationalAge::between(req.lmp, on))),
    }))
}

#[utoipa::path(
    post,
    path = "/calculators/rcri",
    request_body = RcriReq,
    responses(
        (status = 200, description = "RCRI total and class", body = RcriRes)
    )
)]
#[axum::debug_handler]
async fn calculate_rcri(
    State(_state): State<AppState>,
    Json(req): Json<RcriReq>,
) -> Json<RcriRes> {
    Json(rcri_res(None, &risk_factors(&req)))
}

#[utoipa::path(
    post,
    path = "/calculators/family-apgar",
    request_body = FamilyApgarReq,
    responses(
        (status = 200, description = "Family APGAR score", body = FamilyApgarRes)
    )
)]
#[axum::debug_handler]
async fn calculate_family_apgar(
    State(_state): State<AppState>,
    Json(req): Json<FamilyApgarReq>,
) -> Json<FamilyApgarRes> {
    Json(FamilyApgarRes {
        id: None,
        score: family_apgar(&req).score(),
    })
}

#[utoipa::path(
    post,
    path = "/socioeconomics",
    responses(
        (status = 200, description = "Profile saved", body = FamilyApgarRes),
        (status = 422, description = "Unknown patient")
    )
)]
/// Create or replace a patient's socioeconomic profile and return its family APGAR score.
#[axum::debug_handler]
async fn save_socioeconomics(
    State(state): State<AppState>,
    Json(profile): Json<SocioeconomicProfile>,
) -> ApiResult<FamilyApgarRes> {
    let stored = SocioeconomicService::new(state.ctx.clone())
        .save_profile(profile)
        .map_err(|e| api_error("Save socioeconomic profile", e))?;
    Ok(Json(FamilyApgarRes {
        id: Some(stored.id.to_string()),
        score: stored.record.family_apgar.score(),
    }))
}

#[utoipa::path(
    post,
    path = "/surgeries",
    responses(
        (status = 200, description = "Surgery registered", body = RecordRes),
        (status = 409, description = "Code taken or RCRI of another patient")
    )
)]
#[axum::debug_handler]
async fn register_surgery(
    State(state): State<AppState>,
    Json(surgery): Json<Surgery>,
) -> ApiResult<RecordRes> {
    let stored = SurgeryService::new(state.ctx.clone())
        .register_surgery(surgery)
        .map_err(|e| api_error("Register surgery", e))?;
    Ok(Json(record_res(&stored)?))
}

#[utoipa::path(
    get,
    path = "/surgeries/{id}/age",
    responses(
        (status = 200, description = "Patient age on the surgery date", body = AgeAtSurgeryRes),
        (status = 404, description = "Not found")
    )
)]
#[axum::debug_handler]
async fn age_at_surgery(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<AgeAtSurgeryRes> {
    let id = parse_id("surgery", &id)?;
    let age = SurgeryService::new(state.ctx.clone())
        .age_at_surgery(&id)
        .map_err(|e| api_error("Age at surgery", e))?;
    Ok(Json(AgeAtSurgeryRes {
        age: age.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/lab/test-types",
    responses(
        (status = 200, description = "Lab test catalogue", body = RecordListRes)
    )
)]
#[axum::debug_handler]
async fn list_lab_test_types(State(state): State<AppState>) -> ApiResult<RecordListRes> {
    let stored = LabService::new(state.ctx.clone())
        .test_types()
        .map_err(|e| api_error("List lab test types", e))?;
    record_list(&stored)
}

#[utoipa::path(
    post,
    path = "/lab/requests",
    responses(
        (status = 200, description = "Draft requests, one per test", body = RecordListRes),
        (status = 400, description = "No tests, or no doctor and no acting professional")
    )
)]
/// Request lab tests. The body is a lab order; the doctor defaults to the acting professional.
#[axum::debug_handler]
async fn request_lab_tests(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(order): Json<LabOrder>,
) -> ApiResult<RecordListRes> {
    let ctx = acting(&state, &headers)?;
    let stored = LabService::new(ctx)
        .request_tests(order)
        .map_err(|e| api_error("Request lab tests", e))?;
    record_list(&stored)
}

#[utoipa::path(
    post,
    path = "/lab/requests/{id}/submit",
    responses(
        (status = 200, description = "Request submitted", body = RecordRes),
        (status = 409, description = "Request is not a draft")
    )
)]
#[axum::debug_handler]
async fn submit_lab_request(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<RecordRes> {
    let id = parse_id("lab request", &id)?;
    let stored = LabService::new(state.ctx.clone())
        .submit_request(&id)
        .map_err(|e| api_error("Submit lab request", e))?;
    Ok(Json(record_res(&stored)?))
}

#[utoipa::path(
    post,
    path = "/lab/orders",
    request_body = RequestIdsReq,
    responses(
        (status = 200, description = "Lab tests created", body = RecordListRes),
        (status = 409, description = "A request was already ordered")
    )
)]
#[axum::debug_handler]
async fn create_lab_orders(
    State(state): State<AppState>,
    Json(req): Json<RequestIdsReq>,
) -> ApiResult<RecordListRes> {
    let ids = parse_ids("lab request", &req.requests)?;
    let stored = LabService::new(state.ctx.clone())
        .create_orders(&ids)
        .map_err(|e| api_error("Create lab orders", e))?;
    record_list(&stored)
}

#[utoipa::path(
    post,
    path = "/lab/tests/{id}/results",
    responses(
        (status = 200, description = "Results recorded", body = RecordRes),
        (status = 409, description = "Request is not ordered")
    )
)]
#[axum::debug_handler]
async fn record_lab_results(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(results): Json<LabResults>,
) -> ApiResult<RecordRes> {
    let id = parse_id("lab test", &id)?;
    let stored = LabService::new(state.ctx.clone())
        .record_results(&id, results)
        .map_err(|e| api_error("Record lab results", e))?;
    Ok(Json(record_res(&stored)?))
}

#[utoipa::path(
    post,
    path = "/imaging/requests",
    responses(
        (status = 200, description = "Draft requests, one per test", body = RecordListRes),
        (status = 400, description = "No tests, or no doctor and no acting professional")
    )
)]
#[axum::debug_handler]
async fn request_imaging_tests(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(order): Json<ImagingOrder>,
) -> ApiResult<RecordListRes> {
    let ctx = acting(&state, &headers)?;
    let stored = ImagingService::new(ctx)
        .request_tests(order)
        .map_err(|e| api_error("Request imaging tests", e))?;
    record_list(&stored)
}

#[utoipa::path(
    post,
    path = "/imaging/results",
    request_body = RequestIdsReq,
    responses(
        (status = 200, description = "Imaging results created", body = RecordListRes),
        (status = 409, description = "A request already has results")
    )
)]
#[axum::debug_handler]
async fn create_imaging_results(
    State(state): State<AppState>,
    Json(req): Json<RequestIdsReq>,
) -> ApiResult<RecordListRes> {
    let ids = parse_ids("imaging request", &req.requests)?;
    let stored = ImagingService::new(state.ctx.clone())
        .create_results(&ids)
        .map_err(|e| api_error("Create imaging results", e))?;
    record_list(&stored)
}

#[utoipa::path(
    post,
    path = "/ambulatory-sessions",
    responses(
        (status = 200, description = "Session started", body = RecordRes),
        (status = 400, description = "No acting professional")
    )
)]
#[axum::debug_handler]
async fn start_ambulatory_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<AmbulatorySessionDraft>,
) -> ApiResult<RecordRes> {
    let ctx = acting(&state, &headers)?;
    let stored = NursingService::new(ctx)
        .start_ambulatory_session(draft)
        .map_err(|e| api_error("Start ambulatory session", e))?;
    Ok(Json(record_res(&stored)?))
}

#[utoipa::path(
    post,
    path = "/roundings",
    responses(
        (status = 200, description = "Rounding recorded", body = RecordRes),
        (status = 400, description = "No acting professional or pain level out of range")
    )
)]
#[axum::debug_handler]
async fn record_rounding(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<RoundingDraft>,
) -> ApiResult<RecordRes> {
    let ctx = acting(&state, &headers)?;
    let stored = NursingService::new(ctx)
        .record_rounding(draft)
        .map_err(|e| api_error("Record rounding", e))?;
    Ok(Json(record_res(&stored)?))
}
