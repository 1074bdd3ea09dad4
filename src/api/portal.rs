use rocket::State;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use super::auth::UserData;
use crate::auth::{Permission, Role, User};
use crate::collection;
use crate::db::count_users_by_role;
use crate::error::AppError;
use crate::models::{CampSession, Problem, Student, Venue};
use crate::validation::{AppErrorExt, ApiResult, PermissionCheckExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortalView {
    Dashboard,
    Students,
    Logistics,
    Settings,
    Staff,
}

impl PortalView {
    pub const ALL: [PortalView; 5] = [
        PortalView::Dashboard,
        PortalView::Students,
        PortalView::Logistics,
        PortalView::Settings,
        PortalView::Staff,
    ];

    fn required_permission(self) -> Permission {
        match self {
            PortalView::Dashboard => Permission::ViewDashboard,
            PortalView::Students => Permission::ViewStudents,
            PortalView::Logistics => Permission::ViewLogistics,
            PortalView::Settings => Permission::ViewOwnProfile,
            PortalView::Staff => Permission::ViewStaff,
        }
    }
}

pub fn views_for(user: &User) -> Vec<PortalView> {
    PortalView::ALL
        .into_iter()
        .filter(|view| user.has_permission(view.required_permission()))
        .collect()
}

#[derive(Serialize, Deserialize)]
pub struct PortalShell {
    pub user: UserData,
    pub views: Vec<PortalView>,
}

#[get("/portal")]
pub async fn api_portal(user: User) -> Json<PortalShell> {
    let views = views_for(&user);
    Json(PortalShell {
        user: UserData::from(user),
        views,
    })
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub students: i64,
    pub coaches: i64,
    pub problems: i64,
    pub translated_problems: i64,
    pub sessions: i64,
    pub venues: i64,
}

async fn dashboard_stats(db: &Pool<Sqlite>) -> Result<DashboardStats, AppError> {
    let problems = collection::list::<Problem>(db).await?;

    Ok(DashboardStats {
        students: collection::count::<Student>(db).await?,
        coaches: count_users_by_role(db, Role::Coach).await?,
        problems: problems.len() as i64,
        translated_problems: problems.iter().filter(|p| p.is_fully_translated()).count() as i64,
        sessions: collection::count::<CampSession>(db).await?,
        venues: collection::count::<Venue>(db).await?,
    })
}

#[get("/dashboard")]
pub async fn api_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<DashboardStats>> {
    user.require_permission(Permission::ViewDashboard)
        .validate_custom()?;

    let stats = dashboard_stats(db).await.validate_custom()?;
    Ok(Json(stats))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
