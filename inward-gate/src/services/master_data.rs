//! Master data, users and settings mutations
//!
//! Entries reference clients and products by name, so renaming or deleting an
//! item never touches existing entries.

use inward_common::models::{Collection, MasterItem, MasterKind, Role, User, PROTECTED_USERNAME};
use inward_common::{Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::fanout::FanOut;
use super::sessions::{Session, SessionRegistry};
use crate::db;

/// New user form
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub name: String,
}

#[derive(Clone)]
pub struct MasterData {
    db: SqlitePool,
    fanout: FanOut,
    sessions: SessionRegistry,
}

impl MasterData {
    pub fn new(db: SqlitePool, fanout: FanOut, sessions: SessionRegistry) -> Self {
        Self {
            db,
            fanout,
            sessions,
        }
    }

    /// Quick add from the entry form; any role
    pub async fn add_item(&self, kind: MasterKind, name: &str) -> Result<MasterItem> {
        let name = non_blank(name, "Name")?;
        let item = db::master::insert_item(&self.db, kind, name).await?;

        info!(table = kind.table(), item = %item.name, "Master item added");
        self.fanout.publish(kind.collection()).await;
        Ok(item)
    }

    pub async fn rename_item(
        &self,
        session: &Session,
        kind: MasterKind,
        id: Uuid,
        name: &str,
    ) -> Result<()> {
        session.require_admin()?;
        let name = non_blank(name, "Name")?;
        db::master::rename_item(&self.db, kind, id, name).await?;

        info!(table = kind.table(), %id, new_name = %name, "Master item renamed");
        self.fanout.publish(kind.collection()).await;
        Ok(())
    }

    pub async fn delete_item(&self, session: &Session, kind: MasterKind, id: Uuid) -> Result<()> {
        session.require_admin()?;
        db::master::delete_item(&self.db, kind, id).await?;

        info!(table = kind.table(), %id, "Master item deleted");
        self.fanout.publish(kind.collection()).await;
        Ok(())
    }

    pub async fn create_user(&self, session: &Session, new_user: &NewUser) -> Result<User> {
        session.require_admin()?;
        let user = User {
            id: Uuid::new_v4(),
            username: non_blank(&new_user.username, "Username")?.to_string(),
            password: non_blank(&new_user.password, "Password")?.to_string(),
            role: new_user.role,
            name: non_blank(&new_user.name, "Name")?.to_string(),
        };
        db::users::insert_user(&self.db, &user).await?;

        info!(username = %user.username, role = user.role.as_str(), "User created");
        self.fanout.publish(Collection::Users).await;
        Ok(user)
    }

    /// Delete a user; the protected admin account is refused
    pub async fn delete_user(&self, session: &Session, id: Uuid) -> Result<()> {
        session.require_admin()?;
        let user = db::users::get_user(&self.db, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))?;
        if user.username == PROTECTED_USERNAME {
            return Err(Error::Forbidden(format!(
                "User '{}' cannot be deleted",
                PROTECTED_USERNAME
            )));
        }

        db::users::delete_user(&self.db, id).await?;
        self.sessions.revoke_user(&user.username).await;

        info!(username = %user.username, "User deleted");
        self.fanout.publish(Collection::Users).await;
        Ok(())
    }

    /// Set or clear (None or blank) the global logo
    pub async fn set_logo(&self, session: &Session, logo: Option<&str>) -> Result<()> {
        session.require_admin()?;
        let logo = logo.map(str::trim).filter(|l| !l.is_empty());
        db::settings::set_logo(&self.db, logo).await?;

        info!(cleared = logo.is_none(), "Logo updated");
        self.fanout.publish(Collection::Settings).await;
        Ok(())
    }
}

fn non_blank<'a>(raw: &'a str, label: &str) -> Result<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{} is required", label)));
    }
    Ok(value)
}
