use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use super::records::{create_record, delete_record, get_record, list_records, update_record};
use crate::auth::User;
use crate::models::{Problem, ProblemDraft};
use crate::validation::ApiResult;

#[get("/problems")]
pub async fn api_list_problems(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<Problem>>> {
    list_records::<Problem>(&user, db).await
}

#[get("/problems/<id>")]
pub async fn api_get_problem(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
) -> ApiResult<Json<Problem>> {
    get_record::<Problem>(&user, db, id).await
}

#[post("/problems", data = "<draft>")]
pub async fn api_create_problem(
    user: User,
    db: &State<Pool<Sqlite>>,
    draft: Json<ProblemDraft>,
) -> ApiResult<Custom<Json<Problem>>> {
    create_record::<Problem>(&user, db, draft).await
}

#[put("/problems/<id>", data = "<draft>")]
pub async fn api_update_problem(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
    draft: Json<ProblemDraft>,
) -> ApiResult<Json<Problem>> {
    update_record::<Problem>(&user, db, id, draft).await
}

#[delete("/problems/<id>")]
pub async fn api_delete_problem(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
) -> ApiResult<Status> {
    delete_record::<Problem>(&user, db, id).await
}
