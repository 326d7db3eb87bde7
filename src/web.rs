use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::{header, StatusCode};
use actix_web::{
    middleware, web, App, FromRequest, HttpRequest, HttpResponse, HttpServer, ResponseError,
};
use chrono::Local;
use serde::Deserialize;

use crate::auth::SessionStore;
use crate::directory::{RegisterAlumni, RegisterStudent, UserDirectory};
use crate::error::ServiceError;
use crate::export;
use crate::ledger::{clock, Caller, Role, SlotLedger, Transition};
use crate::view::{alumni_view, history_view, slot_view, student_view};

/// Shared application state: the ledger, the identity directory and the
/// session store behind the access gate.
pub struct AppState {
    pub ledger: SlotLedger,
    pub directory: UserDirectory,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(ledger: SlotLedger) -> Self {
        AppState {
            ledger,
            directory: UserDirectory::new(),
            sessions: SessionStore::new(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Authorization(_) => StatusCode::FORBIDDEN,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServiceError::Storage(detail) = self {
            log::error!("storage failure: {}", detail);
        }
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "message": self.to_string() }))
    }
}

/// Caller identity resolved from the `Authorization: Bearer` header.
pub struct Authed(pub Caller);

impl FromRequest for Authed {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_caller(req))
    }
}

fn resolve_caller(req: &HttpRequest) -> Result<Authed, ServiceError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ServiceError::Storage("application state missing".to_string()))?;
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
        ServiceError::Authorization("authentication token is missing".to_string())
    })?;
    let caller = state
        .sessions
        .resolve(token)
        .ok_or_else(|| ServiceError::Authorization("invalid or expired token".to_string()))?;
    Ok(Authed(caller))
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct CreateSlotRequest {
    date: String,
    time: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotActionRequest {
    appointment_id: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentsQuery {
    #[serde(default)]
    alumni_id: Option<String>,
    #[serde(default)]
    history: Option<String>,
    #[serde(default)]
    slot_history: Option<String>,
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let caller = state.directory.authenticate(&req.email, &req.password)?;
    let user = profile_json(&state, &caller)?;
    let token = state.sessions.issue(caller);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "user": user, "token": token })))
}

async fn register_student(
    req: web::Json<RegisterStudent>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let now = Local::now().naive_local();
    let profile = state.directory.register_student(req.into_inner(), now)?;
    let token = state
        .sessions
        .issue(Caller::new(profile.id.clone(), Role::Student));
    Ok(HttpResponse::Created().json(serde_json::json!({
        "user": student_view(&profile),
        "token": token,
    })))
}

async fn register_alumni(
    req: web::Json<RegisterAlumni>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let now = Local::now().naive_local();
    let profile = state.directory.register_alumni(req.into_inner(), now)?;
    let token = state
        .sessions
        .issue(Caller::new(profile.id.clone(), Role::Alumni));
    Ok(HttpResponse::Created().json(serde_json::json!({
        "user": alumni_view(&profile),
        "token": token,
    })))
}

async fn list_alumni(
    _caller: Authed,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let alumni: Vec<_> = state
        .directory
        .list_alumni()
        .iter()
        .map(alumni_view)
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "alumni": alumni })))
}

async fn create_slot(
    caller: Authed,
    req: web::Json<CreateSlotRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let date = clock::parse_date(&req.date)?;
    let now = Local::now().naive_local();
    let slot = state.ledger.create_slot(&caller.0, date, &req.time, now)?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "appointment": slot_view(&slot, &state.directory),
    })))
}

/// One endpoint, three read shapes, keyed by the query parameters the
/// clients send: `slotHistory=true` for archive records, `history=true` for
/// the participant view, `alumniId` for the availability or owner view.
async fn list_appointments(
    caller: Authed,
    query: web::Query<AppointmentsQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let caller = caller.0;

    if query.slot_history.as_deref() == Some("true") {
        let records: Vec<_> = state
            .ledger
            .list_history(&caller)
            .iter()
            .map(history_view)
            .collect();
        return Ok(HttpResponse::Ok().json(serde_json::json!({ "slotHistory": records })));
    }

    let now = Local::now().naive_local();
    let slots = if query.history.as_deref() == Some("true") {
        state.ledger.sweep_expired(now)?;
        state.ledger.list_participant_slots(&caller)
    } else if let Some(alumni_id) = &query.alumni_id {
        state.ledger.sweep_expired(now)?;
        if caller.role == Role::Alumni && caller.id == *alumni_id {
            state.ledger.list_owner_slots(alumni_id)
        } else {
            state.ledger.list_available(alumni_id)
        }
    } else {
        Vec::new()
    };

    let views: Vec<_> = slots
        .iter()
        .map(|slot| slot_view(slot, &state.directory))
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "appointments": views })))
}

async fn book_slot(
    caller: Authed,
    req: web::Json<SlotActionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let caller = caller.0;
    let student_name = state.directory.display_name(&caller.id).unwrap_or_default();
    let slot = state.ledger.transition(
        &req.appointment_id,
        &caller,
        &Transition::Book { student_name },
        Local::now().naive_local(),
    )?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "appointment": slot_view(&slot, &state.directory),
    })))
}

async fn cancel_slot(
    caller: Authed,
    req: web::Json<SlotActionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let slot = state.ledger.transition(
        &req.appointment_id,
        &caller.0,
        &Transition::Cancel,
        Local::now().naive_local(),
    )?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "appointment": slot_view(&slot, &state.directory),
    })))
}

async fn reject_slot(
    caller: Authed,
    req: web::Json<SlotActionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let req = req.into_inner();
    let slot = state.ledger.transition(
        &req.appointment_id,
        &caller.0,
        &Transition::Reject { reason: req.reason },
        Local::now().naive_local(),
    )?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "appointment": slot_view(&slot, &state.directory),
    })))
}

async fn complete_slot(
    caller: Authed,
    req: web::Json<SlotActionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let slot = state.ledger.transition(
        &req.appointment_id,
        &caller.0,
        &Transition::Approve,
        Local::now().naive_local(),
    )?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "appointment": slot_view(&slot, &state.directory),
    })))
}

async fn export_history(
    caller: Authed,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let records = state.ledger.list_history(&caller.0);
    let bytes = export::history_to_csv(&records)?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"slot-history.csv\"",
        ))
        .body(bytes))
}

/// Route table, shared between the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health))
        .route("/api/auth/login", web::post().to(login))
        .route("/api/students/register", web::post().to(register_student))
        .route("/api/alumni/register", web::post().to(register_alumni))
        .route("/api/alumni", web::get().to(list_alumni))
        .route("/api/appointments", web::post().to(create_slot))
        .route("/api/appointments", web::get().to(list_appointments))
        .route("/api/appointments/book", web::post().to(book_slot))
        .route("/api/appointments/cancel", web::post().to(cancel_slot))
        .route("/api/appointments/reject", web::post().to(reject_slot))
        .route("/api/appointments/complete", web::post().to(complete_slot))
        .route(
            "/api/appointments/history/export",
            web::get().to(export_history),
        );
}

pub async fn start_server(port: u16, state: web::Data<AppState>) -> std::io::Result<()> {
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

fn profile_json(
    state: &web::Data<AppState>,
    caller: &Caller,
) -> Result<serde_json::Value, ServiceError> {
    let user = match caller.role {
        Role::Student => state
            .directory
            .find_student(&caller.id)
            .map(|p| serde_json::to_value(student_view(&p))),
        Role::Alumni => state
            .directory
            .find_alumni(&caller.id)
            .map(|p| serde_json::to_value(alumni_view(&p))),
    };
    user.ok_or_else(|| ServiceError::NotFound("user not found".to_string()))?
        .map_err(ServiceError::from)
}
