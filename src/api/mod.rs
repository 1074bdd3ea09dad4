pub mod auth;
pub mod logistics;
pub mod portal;
pub mod problems;
pub mod records;
pub mod staff;
pub mod students;

use rocket::Route;

pub fn routes() -> Vec<Route> {
    routes![
        auth::api_login,
        auth::api_logout,
        auth::api_me,
        auth::api_me_unauthorized,
        auth::api_register,
        auth::api_update_profile,
        auth::api_add_coach,
        staff::api_list_staff,
        staff::api_list_pending,
        staff::api_change_role,
        students::api_list_students,
        students::api_get_student,
        students::api_create_student,
        students::api_update_student,
        students::api_delete_student,
        students::api_export_students,
        students::api_import_students,
        logistics::api_list_sessions,
        logistics::api_get_session,
        logistics::api_create_session,
        logistics::api_update_session,
        logistics::api_delete_session,
        logistics::api_timetable,
        logistics::api_list_resources,
        logistics::api_get_resource,
        logistics::api_create_resource,
        logistics::api_update_resource,
        logistics::api_delete_resource,
        logistics::api_set_resource_count,
        logistics::api_list_venues,
        logistics::api_get_venue,
        logistics::api_create_venue,
        logistics::api_update_venue,
        logistics::api_delete_venue,
        logistics::api_venue_occupancy,
        problems::api_list_problems,
        problems::api_get_problem,
        problems::api_create_problem,
        problems::api_update_problem,
        problems::api_delete_problem,
        portal::api_portal,
        portal::api_dashboard,
        portal::health,
    ]
}
