use rocket::http::Status;
use serde::Serialize;

use super::{Permission, Role};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub uses_default_password: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub full_name: Option<String>,
    pub uses_default_password: Option<bool>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        let role = user.role.unwrap_or_default();
        Self {
            id: user.id.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            // An unreadable role gets the least privilege, never more.
            role: Role::from_str(&role).unwrap_or(Role::Pending),
            full_name: user.full_name,
            uses_default_password: user.uses_default_password.unwrap_or_default(),
        }
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), Status> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(Status::Forbidden)
        }
    }

    /// Own account, or anyone's when the role may edit credentials.
    pub fn require_self_or(&self, user_id: i64, permission: Permission) -> Result<(), Status> {
        if self.id == user_id {
            return Ok(());
        }
        self.require_permission(permission)
    }
}
