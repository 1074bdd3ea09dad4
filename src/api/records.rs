//! Handler bodies shared by every record panel.
//!
//! Rocket routes cannot be generic, so each panel declares thin routes that
//! call into these with its concrete [`Record`] type.

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use crate::auth::User;
use crate::collection::{self, Record};
use crate::validation::{AppErrorExt, ApiResult, JsonValidateExt, PermissionCheckExt};

pub async fn list_records<R: Record>(user: &User, db: &Pool<Sqlite>) -> ApiResult<Json<Vec<R>>> {
    user.require_permission(R::READ).validate_custom()?;

    let records = collection::list::<R>(db).await.validate_custom()?;
    Ok(Json(records))
}

pub async fn get_record<R: Record>(user: &User, db: &Pool<Sqlite>, id: i64) -> ApiResult<Json<R>> {
    user.require_permission(R::READ).validate_custom()?;

    let record = collection::get::<R>(db, id).await.validate_custom()?;
    Ok(Json(record))
}

pub async fn create_record<R: Record>(
    user: &User,
    db: &Pool<Sqlite>,
    draft: Json<R::Draft>,
) -> ApiResult<Custom<Json<R>>> {
    user.require_permission(R::WRITE).validate_custom()?;
    let draft = draft.validate_custom()?;

    let record = collection::create::<R>(db, &draft).await.validate_custom()?;
    Ok(Custom(Status::Created, Json(record)))
}

pub async fn update_record<R: Record>(
    user: &User,
    db: &Pool<Sqlite>,
    id: i64,
    draft: Json<R::Draft>,
) -> ApiResult<Json<R>> {
    user.require_permission(R::WRITE).validate_custom()?;
    let draft = draft.validate_custom()?;

    let record = collection::update::<R>(db, id, &draft)
        .await
        .validate_custom()?;
    Ok(Json(record))
}

pub async fn delete_record<R: Record>(user: &User, db: &Pool<Sqlite>, id: i64) -> ApiResult<Status> {
    user.require_permission(R::WRITE).validate_custom()?;

    collection::delete::<R>(db, id).await.validate_custom()?;
    Ok(Status::NoContent)
}
