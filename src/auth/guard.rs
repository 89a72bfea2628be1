use super::session::SessionData;
use crate::errors::AppError;
use crate::AppState;

/// Look up the session in [`AppState`] and return a copy of it. Expired
/// sessions are dropped on the way out.
pub fn validate_session(state: &AppState, token: &str) -> Result<SessionData, AppError> {
    let mut store = state
        .sessions
        .lock()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let session = store.validate(token).cloned();
    store.purge_expired();
    session
}

/// Same as [`validate_session`], and the session must hold the admin role.
pub fn validate_admin(state: &AppState, token: &str) -> Result<SessionData, AppError> {
    let mut store = state
        .sessions
        .lock()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let session = store.validate_admin(token).cloned();
    store.purge_expired();
    session
}
