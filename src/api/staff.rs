use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use tracing::info;

use super::auth::UserData;
use crate::auth::{Permission, Role, User};
use crate::db::{get_user, get_users_by_role, update_user_role};
use crate::validation::{AppErrorExt, ApiResult, PermissionCheckExt, ValidationResponse};

async fn list_by_role(user: &User, db: &Pool<Sqlite>, role: Role) -> ApiResult<Json<Vec<UserData>>> {
    user.require_permission(Permission::ViewStaff)
        .validate_custom()?;

    let users = get_users_by_role(db, role).await.validate_custom()?;
    Ok(Json(users.into_iter().map(UserData::from).collect()))
}

#[get("/staff")]
pub async fn api_list_staff(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<UserData>>> {
    list_by_role(&user, db, Role::Coach).await
}

#[get("/staff/pending")]
pub async fn api_list_pending(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<UserData>>> {
    list_by_role(&user, db, Role::Pending).await
}

#[derive(Deserialize)]
pub struct RoleChange {
    role: Role,
}

/// Approves a pending account or moves staff between roles.
#[put("/staff/<id>/role", data = "<change>")]
pub async fn api_change_role(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
    change: Json<RoleChange>,
) -> ApiResult<Json<UserData>> {
    user.require_permission(Permission::EditUserRoles)
        .validate_custom()?;

    if id == user.id {
        return Err(Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::with_error(
                "role",
                "You cannot change your own role",
            )),
        ));
    }

    update_user_role(db, id, change.role).await.validate_custom()?;
    let updated = get_user(db, id).await.validate_custom()?;

    info!(email = %updated.email, role = %updated.role, changed_by = %user.email, "Role changed");
    Ok(Json(UserData::from(updated)))
}
