use rocket::State;
use rocket::data::{Data, ToByteUnit};
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::{Json, Value, json};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

use super::records::{create_record, delete_record, get_record, list_records, update_record};
use crate::auth::{Permission, User};
use crate::collection;
use crate::models::{Student, StudentDraft};
use crate::roster::{export_students, import_students};
use crate::validation::{
    AppErrorExt, ApiResult, PermissionCheckExt, ValidationResponse,
};

const IMPORT_LIMIT_MIB: usize = 2;

#[get("/students")]
pub async fn api_list_students(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Student>>> {
    list_records::<Student>(&user, db).await
}

#[get("/students/<id>")]
pub async fn api_get_student(user: User, db: &State<Pool<Sqlite>>, id: i64) -> ApiResult<Json<Student>> {
    get_record::<Student>(&user, db, id).await
}

#[post("/students", data = "<draft>")]
pub async fn api_create_student(
    user: User,
    db: &State<Pool<Sqlite>>,
    draft: Json<StudentDraft>,
) -> ApiResult<Custom<Json<Student>>> {
    create_record::<Student>(&user, db, draft).await
}

#[put("/students/<id>", data = "<draft>")]
pub async fn api_update_student(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
    draft: Json<StudentDraft>,
) -> ApiResult<Json<Student>> {
    update_record::<Student>(&user, db, id, draft).await
}

#[delete("/students/<id>")]
pub async fn api_delete_student(user: User, db: &State<Pool<Sqlite>>, id: i64) -> ApiResult<Status> {
    delete_record::<Student>(&user, db, id).await
}

#[derive(Responder)]
#[response(content_type = "text/csv")]
pub struct CsvDownload {
    body: String,
    disposition: Header<'static>,
}

impl CsvDownload {
    fn new(filename: &str, body: String) -> Self {
        Self {
            body,
            disposition: Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            ),
        }
    }
}

#[get("/students/export")]
pub async fn api_export_students(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<CsvDownload> {
    user.require_permission(Permission::ViewStudents)
        .validate_custom()?;

    let students = collection::list::<Student>(db).await.validate_custom()?;
    let body = export_students(&students).validate_custom()?;

    info!(rows = students.len(), "Exported student roster");
    Ok(CsvDownload::new("aoi_students.csv", body))
}

/// Takes the raw CSV text as the request body.
#[post("/students/import", data = "<upload>")]
pub async fn api_import_students(
    user: User,
    db: &State<Pool<Sqlite>>,
    upload: Data<'_>,
) -> ApiResult<Custom<Json<Value>>> {
    user.require_permission(Permission::ImportStudents)
        .validate_custom()?;

    let text = upload
        .open(IMPORT_LIMIT_MIB.mebibytes())
        .into_string()
        .await
        .map_err(|e| {
            warn!("Failed to read CSV upload: {}", e);
            Custom(
                Status::BadRequest,
                Json(ValidationResponse::with_error("file", "Could not read upload")),
            )
        })?;

    if !text.is_complete() {
        return Err(Custom(
            Status::PayloadTooLarge,
            Json(ValidationResponse::with_error("file", "CSV file is too large")),
        ));
    }

    let drafts = import_students(&text).validate_custom()?;
    let inserted = collection::create_many::<Student>(db, &drafts)
        .await
        .validate_custom()?;

    info!(inserted, "Imported student roster");
    Ok(Custom(Status::Created, Json(json!({ "inserted": inserted }))))
}
