//! Login sessions
//!
//! Credentials are compared as plain values against the Users collection.
//! Sessions live in memory and end on logout or restart.

use inward_common::models::Role;
use inward_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db;

/// Acting user attached to every authenticated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden("Admin role required".to_string()))
        }
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    db: SqlitePool,
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let user = db::users::find_by_username(&self.db, username.trim())
            .await?
            .filter(|user| user.password == password)
            .ok_or_else(|| Error::Unauthorized("Invalid username or password".to_string()))?;

        let session = Session {
            token: Uuid::new_v4(),
            username: user.username,
            name: user.name,
            role: user.role,
        };
        self.sessions
            .write()
            .await
            .insert(session.token, session.clone());

        info!(username = %session.username, role = session.role.as_str(), "Login");
        Ok(session)
    }

    /// Returns false when the token was not active
    pub async fn logout(&self, token: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&token);
        if let Some(session) = &removed {
            info!(username = %session.username, "Logout");
        } else {
            debug!("Logout for unknown session token");
        }
        removed.is_some()
    }

    pub async fn get(&self, token: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&token).cloned()
    }

    /// End every session of a user (after the user is deleted)
    pub async fn revoke_user(&self, username: &str) {
        self.sessions
            .write()
            .await
            .retain(|_, session| session.username != username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;
    use inward_common::models::User;

    async fn registry_with_staff() -> (tempfile::TempDir, SessionRegistry) {
        let (dir, db) = temp_db().await;
        db::users::insert_user(
            &db,
            &User {
                id: Uuid::new_v4(),
                username: "staff".to_string(),
                password: "123".to_string(),
                role: Role::Staff,
                name: "Gate Staff".to_string(),
            },
        )
        .await
        .unwrap();
        (dir, SessionRegistry::new(db))
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let (_dir, registry) = registry_with_staff().await;

        let session = registry.login("staff", "123").await.unwrap();
        assert_eq!(session.name, "Gate Staff");
        assert!(!session.is_admin());
        assert!(matches!(session.require_admin(), Err(Error::Forbidden(_))));
        assert_eq!(registry.get(session.token).await, Some(session.clone()));

        assert!(registry.logout(session.token).await);
        assert!(registry.get(session.token).await.is_none());
        assert!(!registry.logout(session.token).await);
    }

    #[tokio::test]
    async fn test_wrong_credentials() {
        let (_dir, registry) = registry_with_staff().await;

        assert!(matches!(
            registry.login("staff", "wrong").await,
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            registry.login("nobody", "123").await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke_user() {
        let (_dir, registry) = registry_with_staff().await;
        let session = registry.login("staff", "123").await.unwrap();

        registry.revoke_user("staff").await;
        assert!(registry.get(session.token).await.is_none());
    }
}
