use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use tracing::info;
use validator::Validate;

use super::records::{create_record, delete_record, get_record, list_records, update_record};
use crate::auth::{Permission, User};
use crate::collection::{self, Field};
use crate::config::AppConfig;
use crate::models::{
    CampSession, CampSessionDraft, Resource, ResourceDraft, Venue, VenueDraft,
};
use crate::timetable::{Timetable, VenueOccupancy, build_timetable, venue_occupancy};
use crate::validation::{AppErrorExt, ApiResult, JsonValidateExt, PermissionCheckExt};

#[get("/sessions")]
pub async fn api_list_sessions(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<CampSession>>> {
    list_records::<CampSession>(&user, db).await
}

#[get("/sessions/<id>")]
pub async fn api_get_session(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
) -> ApiResult<Json<CampSession>> {
    get_record::<CampSession>(&user, db, id).await
}

#[post("/sessions", data = "<draft>")]
pub async fn api_create_session(
    user: User,
    db: &State<Pool<Sqlite>>,
    draft: Json<CampSessionDraft>,
) -> ApiResult<Custom<Json<CampSession>>> {
    create_record::<CampSession>(&user, db, draft).await
}

#[put("/sessions/<id>", data = "<draft>")]
pub async fn api_update_session(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
    draft: Json<CampSessionDraft>,
) -> ApiResult<Json<CampSession>> {
    update_record::<CampSession>(&user, db, id, draft).await
}

#[delete("/sessions/<id>")]
pub async fn api_delete_session(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
) -> ApiResult<Status> {
    delete_record::<CampSession>(&user, db, id).await
}

#[get("/timetable")]
pub async fn api_timetable(
    user: User,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<Timetable>> {
    user.require_permission(Permission::ViewLogistics)
        .validate_custom()?;

    let sessions = collection::list::<CampSession>(db).await.validate_custom()?;
    Ok(Json(build_timetable(&config.camp_days, &sessions)))
}

#[get("/resources")]
pub async fn api_list_resources(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<Resource>>> {
    list_records::<Resource>(&user, db).await
}

#[get("/resources/<id>")]
pub async fn api_get_resource(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
) -> ApiResult<Json<Resource>> {
    get_record::<Resource>(&user, db, id).await
}

#[post("/resources", data = "<draft>")]
pub async fn api_create_resource(
    user: User,
    db: &State<Pool<Sqlite>>,
    draft: Json<ResourceDraft>,
) -> ApiResult<Custom<Json<Resource>>> {
    create_record::<Resource>(&user, db, draft).await
}

#[put("/resources/<id>", data = "<draft>")]
pub async fn api_update_resource(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
    draft: Json<ResourceDraft>,
) -> ApiResult<Json<Resource>> {
    update_record::<Resource>(&user, db, id, draft).await
}

#[delete("/resources/<id>")]
pub async fn api_delete_resource(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
) -> ApiResult<Status> {
    delete_record::<Resource>(&user, db, id).await
}

#[derive(Deserialize, Validate)]
pub struct CountUpdate {
    #[validate(range(min = 0, message = "Count cannot be negative"))]
    count: i64,
}

/// The inventory panel's +/- buttons.
#[patch("/resources/<id>/count", data = "<update>")]
pub async fn api_set_resource_count(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
    update: Json<CountUpdate>,
) -> ApiResult<Json<Resource>> {
    user.require_permission(Permission::ManageInventory)
        .validate_custom()?;
    let update = update.validate_custom()?;

    let resource =
        collection::set_field::<Resource>(db, id, "count", Field::Integer(Some(update.count)))
            .await
            .validate_custom()?;

    info!(resource = %resource.name, count = resource.count, "Inventory count changed");
    Ok(Json(resource))
}

#[get("/venues")]
pub async fn api_list_venues(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Venue>>> {
    list_records::<Venue>(&user, db).await
}

#[get("/venues/<id>")]
pub async fn api_get_venue(user: User, db: &State<Pool<Sqlite>>, id: i64) -> ApiResult<Json<Venue>> {
    get_record::<Venue>(&user, db, id).await
}

#[post("/venues", data = "<draft>")]
pub async fn api_create_venue(
    user: User,
    db: &State<Pool<Sqlite>>,
    draft: Json<VenueDraft>,
) -> ApiResult<Custom<Json<Venue>>> {
    create_record::<Venue>(&user, db, draft).await
}

#[put("/venues/<id>", data = "<draft>")]
pub async fn api_update_venue(
    user: User,
    db: &State<Pool<Sqlite>>,
    id: i64,
    draft: Json<VenueDraft>,
) -> ApiResult<Json<Venue>> {
    update_record::<Venue>(&user, db, id, draft).await
}

#[delete("/venues/<id>")]
pub async fn api_delete_venue(user: User, db: &State<Pool<Sqlite>>, id: i64) -> ApiResult<Status> {
    delete_record::<Venue>(&user, db, id).await
}

#[get("/venues/occupancy")]
pub async fn api_venue_occupancy(
    user: User,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<Vec<VenueOccupancy>>> {
    user.require_permission(Permission::ViewLogistics)
        .validate_custom()?;

    let venues = collection::list::<Venue>(db).await.validate_custom()?;
    let sessions = collection::list::<CampSession>(db).await.validate_custom()?;

    Ok(Json(venue_occupancy(
        &venues,
        &sessions,
        config.camp_days.len(),
    )))
}
