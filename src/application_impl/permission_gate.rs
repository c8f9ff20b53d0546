use crate::application_port::{AuthError, Logical, Requirement};
use crate::domain_model::LoginId;
use crate::domain_port::AuthorizationInfo;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Checks a [`Requirement`] against what [`AuthorizationInfo`] reports for
/// an identity. Sets are fetched on every call.
pub struct PermissionGate {
    info: Arc<dyn AuthorizationInfo>,
}

impl PermissionGate {
    pub fn new(info: Arc<dyn AuthorizationInfo>) -> PermissionGate {
        PermissionGate { info }
    }

    pub async fn check(
        &self,
        login_id: &LoginId,
        requirement: &Requirement,
    ) -> Result<(), AuthError> {
        if requirement.is_empty() {
            return Ok(());
        }

        if !requirement.permissions.is_empty() {
            let owned = self.info.permission_set(login_id).await;
            if !satisfied(
                requirement.permission_logical,
                &requirement.permissions,
                &owned,
            ) {
                debug!(%login_id, required = ?requirement.permissions, "permission denied");
                return Err(AuthError::NoPermission);
            }
        }

        if !requirement.roles.is_empty() {
            let owned = self.info.role_set(login_id).await;
            if !satisfied(requirement.role_logical, &requirement.roles, &owned) {
                debug!(%login_id, required = ?requirement.roles, "role denied");
                return Err(AuthError::NoPermission);
            }
        }

        Ok(())
    }

    pub async fn has_permission(&self, login_id: &LoginId, permission: &str) -> bool {
        self.info.permission_set(login_id).await.contains(permission)
    }

    pub async fn has_role(&self, login_id: &LoginId, role: &str) -> bool {
        self.info.role_set(login_id).await.contains(role)
    }
}

fn satisfied(logical: Logical, required: &[String], owned: &HashSet<String>) -> bool {
    match logical {
        Logical::And => required.iter().all(|item| owned.contains(item)),
        Logical::Or => required.iter().any(|item| owned.contains(item)),
    }
}
