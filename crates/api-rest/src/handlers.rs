//! HTTP handlers for the discharge summary pages.

use crate::error::{ApiError, USER_NOT_FOUND_MESSAGE};
use crate::form_payload::FormPayload;
use crate::state::AppState;
use api_shared::{HealthRes, HealthService, UserInfo};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use hms_core::form_state::FormMachine;
use hms_core::presentation::{render_edit_form, EditFormView, FormDraft};
use hms_core::retrieval::{load_for_edit, DischargeSummaryDisplay};
use hms_core::schema::FieldErrors;
use hms_core::toast::{clear_cookie, Toast};
use hms_core::{submit_edit, SubmissionContext, SubmissionOutcome};
use serde::Serialize;

/// Body of the read-only discharge summary page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DischargeSummaryPage {
    pub discharge_summary: DischargeSummaryDisplay,
    /// Flash message carried over from the previous request, if any.
    pub toast: Option<Toast>,
}

fn require_user(state: &AppState, headers: &HeaderMap) -> Result<UserInfo, ApiError> {
    state
        .user_info(headers)
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND_MESSAGE.into()))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive", body = HealthRes)
    )
)]
/// Health check endpoint
///
/// # Returns
/// * `Json<HealthRes>` - JSON response indicating service health status
#[axum::debug_handler]
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/in-patients/ds/{id}/edit",
    params(("id" = String, Path, description = "Discharge summary id")),
    responses(
        (status = 200, description = "Edit form for the record"),
        (status = 404, description = "Unknown caller or record", body = api_shared::ErrorBody)
    )
)]
/// Load the edit form for a discharge summary.
///
/// The form is pre-filled from the stored record, carries a fresh honeypot and starts idle.
///
/// # Returns
/// * `Json<EditFormView>` - the form view model
///
/// # Errors
/// * `404` - when the caller cannot be identified or the record is not visible to their
///   hospital
#[axum::debug_handler]
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<EditFormView>, ApiError> {
    let user = require_user(&state, &headers)?;
    let record = load_for_edit(state.store.as_ref(), &id, &user.hospital_id)?;

    Ok(Json(render_edit_form(
        &FormDraft::from_record(&record),
        &FieldErrors::default(),
        &FormMachine::new(),
        state.honeypot.issue(Utc::now()),
    )))
}

#[utoipa::path(
    post,
    path = "/in-patients/ds/{id}/edit",
    params(("id" = String, Path, description = "Discharge summary id")),
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "Edit form fields"),
    responses(
        (status = 302, description = "Saved; redirect to the read-only page with a toast cookie"),
        (status = 200, description = "Form redisplayed after a structural or validate intent"),
        (status = 204, description = "Valid submission that updated nothing"),
        (status = 400, description = "Validation errors or a tripped honeypot"),
        (status = 404, description = "Unknown caller or record", body = api_shared::ErrorBody)
    )
)]
/// Handle a post of the edit form.
///
/// # Returns
/// * `302` with `Location` and `Set-Cookie` when the record was saved
/// * `200` with the redisplayed form for reset, drug list edits and on-blur validation
/// * `400` with the form and its errors when validation fails
/// * `204` when nothing was updated
///
/// # Errors
/// * `400` - when the honeypot trips or the body cannot be decoded
/// * `404` - when the caller cannot be identified
/// * `500` - when storage fails
#[axum::debug_handler]
pub async fn submit_edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    FormPayload(pairs): FormPayload,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &headers)?;
    let ctx = SubmissionContext {
        store: state.store.as_ref(),
        honeypot: &state.honeypot,
        caller_hospital_id: &user.hospital_id,
        enforce_tenant_match: state.cfg.enforce_tenant_match(),
        now: Utc::now(),
    };

    let response = match submit_edit(&ctx, &id, &pairs)? {
        SubmissionOutcome::Redirect { location, toast } => {
            let cookie = state.toasts.set_cookie(&toast)?;
            (
                StatusCode::FOUND,
                [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
            )
                .into_response()
        }
        SubmissionOutcome::Rejected(view) => (StatusCode::BAD_REQUEST, Json(*view)).into_response(),
        SubmissionOutcome::Rendered(view) => (StatusCode::OK, Json(*view)).into_response(),
        SubmissionOutcome::NoOp => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/in-patients/ds/{id}/view",
    params(("id" = String, Path, description = "Discharge summary id")),
    responses(
        (status = 200, description = "The record with any pending toast"),
        (status = 404, description = "Unknown caller or record", body = api_shared::ErrorBody)
    )
)]
/// Read-only view of a discharge summary.
///
/// A valid toast cookie is returned in the body once and then cleared.
#[axum::debug_handler]
pub async fn view_discharge_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &headers)?;
    let record = load_for_edit(state.store.as_ref(), &id, &user.hospital_id)?;

    let toast = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| state.toasts.from_cookie_header(cookies));
    let page = Json(DischargeSummaryPage {
        discharge_summary: DischargeSummaryDisplay::from(&record),
        toast: toast.clone(),
    });

    Ok(match toast {
        Some(_) => ([(header::SET_COOKIE, clear_cookie())], page).into_response(),
        None => page.into_response(),
    })
}
