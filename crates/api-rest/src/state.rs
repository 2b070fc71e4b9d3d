//! Shared state for the REST handlers.

use api_shared::auth::{resolve_user_info, API_KEY_HEADER, HOSPITAL_ID_HEADER, USER_ID_HEADER};
use api_shared::UserInfo;
use axum::http::HeaderMap;
use hms_core::honeypot::Honeypot;
use hms_core::toast::ToastSealer;
use hms_core::{CoreConfig, DischargeSummaryStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub store: Arc<dyn DischargeSummaryStore>,
    pub honeypot: Honeypot,
    pub toasts: ToastSealer,
    api_key: Arc<str>,
}

impl AppState {
    pub fn new(
        cfg: Arc<CoreConfig>,
        store: Arc<dyn DischargeSummaryStore>,
        api_key: impl Into<String>,
    ) -> Self {
        let honeypot = Honeypot::from_config(&cfg);
        let toasts = ToastSealer::new(cfg.session_secret());
        Self {
            cfg,
            store,
            honeypot,
            toasts,
            api_key: Arc::from(api_key.into()),
        }
    }

    /// Resolve the caller from the identity headers.
    ///
    /// Returns `None` when the API key is wrong or any header is missing.
    pub fn user_info(&self, headers: &HeaderMap) -> Option<UserInfo> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        match resolve_user_info(
            &self.api_key,
            header(API_KEY_HEADER),
            header(USER_ID_HEADER),
            header(HOSPITAL_ID_HEADER),
        ) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!("caller not identified: {}", e);
                None
            }
        }
    }
}
