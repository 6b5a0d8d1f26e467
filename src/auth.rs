//! Admin session validation
//!
//! The session store is owned by the login flow; imports only ask
//! whether a token is currently usable.

use chrono::Utc;

use crate::error::AppError;
use crate::store::ImportStore;

/// Validate an opaque session token: it must exist, be active, and not
/// be past its expiry. Runs before any import work so a rejected call
/// is side-effect free.
pub async fn validate_session(store: &dyn ImportStore, token: &str) -> Result<(), AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Missing session token".to_string()));
    }

    let session = store.find_session(token).await.map_err(AppError::Internal)?;

    match session {
        Some(s) if s.is_active && s.expires_at >= Utc::now() => Ok(()),
        Some(_) => Err(AppError::Unauthorized(
            "Session expired or inactive".to_string(),
        )),
        None => Err(AppError::Unauthorized("Invalid session token".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::MockStore;
    use chrono::Duration;

    #[tokio::test]
    async fn test_valid_session_passes() {
        let store = MockStore::new();
        store.add_session("tok", true, Utc::now() + Duration::hours(1));
        assert!(validate_session(&store, "tok").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let store = MockStore::new();
        store.add_session("tok", true, Utc::now() - Duration::minutes(1));
        let err = validate_session(&store, "tok").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_inactive_session_rejected() {
        let store = MockStore::new();
        store.add_session("tok", false, Utc::now() + Duration::hours(1));
        let err = validate_session(&store, "tok").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_unknown_and_missing_tokens_rejected() {
        let store = MockStore::new();
        assert!(matches!(
            validate_session(&store, "nope").await.unwrap_err(),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            validate_session(&store, "  ").await.unwrap_err(),
            AppError::Unauthorized(_)
        ));
    }
}
