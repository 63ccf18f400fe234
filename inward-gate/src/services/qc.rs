//! Quality-check transitions
//!
//! Any status may move to Approved or Rejected, any number of times. Nothing
//! moves an entry back to Pending; the store itself would allow it.

use inward_common::config::QcPolicy;
use inward_common::models::{EntryId, QcStatus, Role};
use inward_common::{Error, Result};
use serde::{Deserialize, Serialize};

use super::entry_store::{EntryStore, QcChange};

/// Operator action on an entry's QC status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QcAction {
    Approve,
    Reject,
}

impl QcAction {
    pub fn target(&self) -> QcStatus {
        match self {
            QcAction::Approve => QcStatus::Approved,
            QcAction::Reject => QcStatus::Rejected,
        }
    }

    /// Map a requested status onto an action; Pending has no action
    pub fn for_status(status: QcStatus) -> Result<Self> {
        match status {
            QcStatus::Approved => Ok(QcAction::Approve),
            QcStatus::Rejected => Ok(QcAction::Reject),
            QcStatus::Pending => Err(Error::Validation(
                "QC status cannot be reset to Pending".to_string(),
            )),
        }
    }
}

/// Check the session role against the configured QC policy
pub fn authorize(policy: QcPolicy, role: Role) -> Result<()> {
    if policy.permits(role) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "Role '{}' may not change QC status",
            role.as_str()
        )))
    }
}

/// Authorize and apply a QC action
pub async fn apply(
    store: &EntryStore,
    policy: QcPolicy,
    role: Role,
    id: EntryId,
    action: QcAction,
) -> Result<QcChange> {
    authorize(policy, role)?;
    store.update_status(id, action.target()).await
}
