//! Caller identity.
//!
//! Requests identify their caller with three headers. The API key proves the request comes
//! from a trusted front end; the user and hospital ids are taken from that front end as given.

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const HOSPITAL_ID_HEADER: &str = "x-hospital-id";

/// The authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: String,
    /// Tenant every read and write is scoped to.
    pub hospital_id: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("missing {0} header")]
    MissingHeader(&'static str),
}

/// Validates the provided API key against the configured one.
///
/// Returns `Ok(())` if the key matches, or an error if it is missing or different.
pub fn validate_api_key(expected_key: &str, provided_key: Option<&str>) -> Result<(), AuthError> {
    match provided_key {
        None => Err(AuthError::MissingApiKey),
        Some(key) if key == expected_key => Ok(()),
        Some(_) => Err(AuthError::InvalidApiKey),
    }
}

/// Resolve the caller from raw header values.
///
/// Blank values count as missing.
pub fn resolve_user_info(
    expected_key: &str,
    api_key: Option<&str>,
    user_id: Option<&str>,
    hospital_id: Option<&str>,
) -> Result<UserInfo, AuthError> {
    fn present(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|v| !v.is_empty())
    }

    validate_api_key(expected_key, present(api_key))?;
    let user_id = present(user_id).ok_or(AuthError::MissingHeader(USER_ID_HEADER))?;
    let hospital_id = present(hospital_id).ok_or(AuthError::MissingHeader(HOSPITAL_ID_HEADER))?;

    Ok(UserInfo {
        user_id: user_id.to_string(),
        hospital_id: hospital_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_complete_identity() {
        let user = resolve_user_info("k", Some("k"), Some("u1"), Some(" h1 ")).unwrap();
        assert_eq!(
            user,
            UserInfo {
                user_id: "u1".into(),
                hospital_id: "h1".into()
            }
        );
    }

    #[test]
    fn rejects_wrong_or_missing_key() {
        assert_eq!(
            resolve_user_info("k", Some("nope"), Some("u1"), Some("h1")),
            Err(AuthError::InvalidApiKey)
        );
        assert_eq!(
            resolve_user_info("k", Some(" "), Some("u1"), Some("h1")),
            Err(AuthError::MissingApiKey)
        );
    }

    #[test]
    fn rejects_missing_hospital() {
        assert_eq!(
            resolve_user_info("k", Some("k"), Some("u1"), None),
            Err(AuthError::MissingHeader(HOSPITAL_ID_HEADER))
        );
    }
}
