use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Customer,
}

/// Identity handed over by the hosted auth provider after sign-in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub login_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub struct SessionStore {
    sessions: HashMap<String, SessionData>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_mins: u64) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl: Duration::minutes(ttl_mins as i64),
        }
    }

    /// Register a signed-in user and return the session token (UUID v4).
    pub fn create(&mut self, user_id: impl Into<String>, email: impl Into<String>, role: Role) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        self.sessions.insert(
            token.clone(),
            SessionData {
                user_id: user_id.into(),
                email: email.into(),
                role,
                login_at: now,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Token must exist and not be past its expiry.
    pub fn validate(&self, token: &str) -> Result<&SessionData, AppError> {
        match self.sessions.get(token) {
            None => Err(AppError::Auth("Session is not valid, please sign in again".into())),
            Some(s) if Utc::now() > s.expires_at => {
                Err(AppError::Auth("Session expired, please sign in again".into()))
            }
            Some(s) => Ok(s),
        }
    }

    pub fn validate_admin(&self, token: &str) -> Result<&SessionData, AppError> {
        let s = self.validate(token)?;
        if !s.is_admin() {
            return Err(AppError::Forbidden("only administrators can manage coupons".into()));
        }
        Ok(s)
    }

    pub fn destroy(&mut self, token: &str) {
        self.sessions.remove(token);
    }

    /// Drop expired sessions; returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at >= now);
        before - self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_session_passes_both_checks() {
        let mut store = SessionStore::new(60);
        let token = store.create("u-1", "owner@bakery.test", Role::Admin);
        assert_eq!(store.validate(&token).unwrap().email, "owner@bakery.test");
        assert!(store.validate_admin(&token).is_ok());
    }

    #[test]
    fn customer_cannot_act_as_admin() {
        let mut store = SessionStore::new(60);
        let token = store.create("u-2", "guest@bakery.test", Role::Customer);
        assert!(store.validate(&token).is_ok());
        assert!(matches!(store.validate_admin(&token), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn zero_lifetime_sessions_expire_and_get_purged() {
        let mut store = SessionStore::new(0);
        let token = store.create("u-3", "late@bakery.test", Role::Customer);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(matches!(store.validate(&token), Err(AppError::Auth(_))));
        assert_eq!(store.purge_expired(), 1);
    }

    #[test]
    fn destroyed_token_is_rejected() {
        let mut store = SessionStore::new(60);
        let token = store.create("u-4", "x@bakery.test", Role::Admin);
        store.destroy(&token);
        assert!(store.validate(&token).is_err());
    }
}
