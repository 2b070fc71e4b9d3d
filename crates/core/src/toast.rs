//! One-shot notifications carried across a redirect in a signed cookie.
//!
//! The cookie value is `<base64url(json)>.<hex hmac-sha256>`, keyed by the session secret. A
//! cookie that fails verification or does not decode is treated as absent.

use crate::constants::TOAST_COOKIE_NAME;
use crate::signing;
use crate::{HmsError, HmsResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastType {
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ToastType,
    pub title: String,
    pub description: String,
}

impl Toast {
    fn new(kind: ToastType, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ToastType::Success, title, description)
    }
}

/// Signs and reads toast cookies.
#[derive(Debug, Clone)]
pub struct ToastSealer {
    secret: String,
}

impl ToastSealer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Signed cookie value for `toast`.
    pub fn seal(&self, toast: &Toast) -> HmsResult<String> {
        let json = serde_json::to_vec(toast).map_err(HmsError::JsonSerialization)?;
        Ok(signing::seal(&self.secret, &URL_SAFE_NO_PAD.encode(json)))
    }

    /// Verify and decode a cookie value.
    pub fn open(&self, value: &str) -> Option<Toast> {
        let payload = signing::unseal(&self.secret, value)?;
        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// `Set-Cookie` header value carrying `toast`.
    pub fn set_cookie(&self, toast: &Toast) -> HmsResult<String> {
        Ok(format!(
            "{TOAST_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
            self.seal(toast)?
        ))
    }

    /// Find and open the toast in a `Cookie` request header.
    pub fn from_cookie_header(&self, header: &str) -> Option<Toast> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == TOAST_COOKIE_NAME)
            .and_then(|(_, value)| self.open(value))
    }
}

/// `Set-Cookie` header value that removes the toast cookie.
pub fn clear_cookie() -> String {
    format!("{TOAST_COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
