//! Handlers mimicking the Resend email API.

use crate::Outbox;
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// An email the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedEmail {
    pub id: String,
    pub from: String,
    /// Recipients joined with `", "`.
    pub to: String,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    fn joined(&self) -> String {
        match self {
            Recipients::One(to) => to.trim().to_string(),
            Recipients::Many(to) => to
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendEmailReq {
    #[serde(default)]
    from: String,
    to: Option<Recipients>,
    #[serde(default)]
    subject: String,
    html: Option<String>,
    text: Option<String>,
}

pub(crate) fn router(outbox: Outbox) -> Router {
    Router::new()
        .route("/emails", post(send_email))
        .fallback(unhandled)
        .with_state(outbox)
}

#[axum::debug_handler]
async fn send_email(
    State(outbox): State<Outbox>,
    Json(req): Json<SendEmailReq>,
) -> impl IntoResponse {
    let to = req.to.as_ref().map(Recipients::joined).unwrap_or_default();
    let missing = [("from", req.from.trim()), ("to", to.as_str()), ("subject", req.subject.trim())]
        .into_iter()
        .find(|(_, value)| value.is_empty())
        .map(|(field, _)| field);
    if let Some(field) = missing {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "statusCode": 422,
                "name": "validation_error",
                "message": format!("Missing `{field}` field."),
            })),
        );
    }

    let email = RecordedEmail {
        id: uuid::Uuid::new_v4().to_string(),
        from: req.from,
        to,
        subject: req.subject,
        html: req.html,
        text: req.text,
        received_at: Utc::now(),
    };
    tracing::info!(id = %email.id, to = %email.to, subject = %email.subject, "mock email accepted");
    let id = email.id.clone();

    match outbox.lock() {
        Ok(mut outbox) => outbox.push(email),
        Err(poisoned) => poisoned.into_inner().push(email),
    }
    (StatusCode::OK, Json(json!({ "id": id })))
}

async fn unhandled(method: Method, uri: Uri) -> impl IntoResponse {
    tracing::warn!(%method, %uri, "unhandled request to mock server");
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "statusCode": 404, "name": "not_found", "message": "No mock handler" })),
    )
}
