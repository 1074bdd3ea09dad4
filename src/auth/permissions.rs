use anyhow::Error;
use once_cell::sync::Lazy;
use rocket::serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnProfile,
    EditOwnProfile,

    ViewDashboard,
    ViewStudents,
    EditStudents,
    ImportStudents,
    ViewLogistics,
    ManageSchedule,
    ViewProblems,
    ManageProblems,

    ViewStaff,
    ProvisionStaff,
    EditUserRoles,
    EditUserCredentials,
    ManageInventory,
    ManageVenues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum Role {
    Pending,
    Coach,
    Admin,
}

static PENDING_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnProfile);
    permissions.insert(Permission::EditOwnProfile);

    permissions
});

static COACH_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(PENDING_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewDashboard);
    permissions.insert(Permission::ViewStudents);
    permissions.insert(Permission::EditStudents);
    permissions.insert(Permission::ImportStudents);
    permissions.insert(Permission::ViewLogistics);
    permissions.insert(Permission::ManageSchedule);
    permissions.insert(Permission::ViewProblems);
    permissions.insert(Permission::ManageProblems);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(COACH_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewStaff);
    permissions.insert(Permission::ProvisionStaff);
    permissions.insert(Permission::EditUserRoles);
    permissions.insert(Permission::EditUserCredentials);
    permissions.insert(Permission::ManageInventory);
    permissions.insert(Permission::ManageVenues);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Pending => &PENDING_PERMISSIONS,
            Role::Coach => &COACH_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pending => "pending",
            Role::Coach => "coach",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "pending" => Ok(Role::Pending),
            "coach" => Ok(Role::Coach),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Permission, Role};

    #[test]
    fn pending_accounts_only_manage_their_profile() {
        assert!(Role::Pending.has_permission(Permission::EditOwnProfile));
        assert!(!Role::Pending.has_permission(Permission::ViewStudents));
        assert!(!Role::Pending.has_permission(Permission::ViewDashboard));
    }

    #[test]
    fn coaches_cannot_touch_staff_or_inventory() {
        assert!(Role::Coach.has_permission(Permission::EditStudents));
        assert!(Role::Coach.has_permission(Permission::ManageSchedule));
        assert!(!Role::Coach.has_permission(Permission::ProvisionStaff));
        assert!(!Role::Coach.has_permission(Permission::ManageInventory));
        assert!(!Role::Coach.has_permission(Permission::EditUserRoles));
    }

    #[test]
    fn admins_inherit_everything() {
        for permission in Role::Coach.permissions() {
            assert!(Role::Admin.has_permission(*permission));
        }
        assert!(Role::Admin.has_permission(Permission::ProvisionStaff));
    }

    #[test]
    fn role_names_round_trip() {
        for role in [Role::Pending, Role::Coach, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("student").is_err());
    }
}
