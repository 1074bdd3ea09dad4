use chrono::Utc;
use rocket::State;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{Permission, Role, SESSION_COOKIE, User, UserSession};
use crate::config::AuthSettings;
use crate::db::{
    authenticate_user, create_user, create_user_session, get_user, invalidate_session,
    update_user_profile,
};
use crate::validation::{
    AppErrorExt, ApiResult, JsonValidateExt, PermissionCheckExt, ValidationResponse,
};

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// The public face of an account. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserData {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub full_name: Option<String>,
    pub uses_default_password: bool,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
            uses_default_password: user.uses_default_password,
        }
    }
}

fn invalid_credentials() -> Custom<Json<ValidationResponse>> {
    Custom(
        Status::Unauthorized,
        Json(ValidationResponse::with_error(
            "credentials",
            "Invalid credentials",
        )),
    )
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    auth: &State<AuthSettings>,
) -> ApiResult<Json<UserData>> {
    let login = login.into_inner();
    info!(email = %login.email, "Login attempt");

    let Some(user) = authenticate_user(db, &login.email, &login.password)
        .await
        .validate_custom()?
    else {
        warn!(email = %login.email, "Login rejected");
        return Err(invalid_credentials());
    };

    let token = UserSession::generate_token();
    let expires_at = Utc::now() + auth.session_ttl;

    create_user_session(db, user.id, &token, expires_at.naive_utc())
        .await
        .validate_custom()?;

    cookies.add_private(
        Cookie::build((SESSION_COOKIE, token))
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(rocket::time::Duration::hours(auth.session_ttl.num_hours())),
    );

    if user.uses_default_password {
        warn!(email = %user.email, "Account is still using the shared default password");
    }

    Ok(Json(UserData::from(user)))
}

#[post("/logout")]
pub async fn api_logout(cookies: &CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Status {
    let token = cookies
        .get_private(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        if let Err(err) = invalidate_session(db, &token).await {
            err.log_and_record("Logout");
        }
    }

    cookies.remove_private(Cookie::build(SESSION_COOKIE));

    Status::Ok
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[derive(Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(email(message = "Invalid email address"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    full_name: String,
}

/// Self-service sign-up. The account waits as `pending` until an admin
/// assigns it a role.
#[post("/register", data = "<registration>")]
pub async fn api_register(
    registration: Json<RegistrationRequest>,
    db: &State<Pool<Sqlite>>,
    auth: &State<AuthSettings>,
) -> ApiResult<Custom<Json<UserData>>> {
    let registration = registration.validate_custom()?;

    let password_hash = auth.hash_password(&registration.password).validate_custom()?;

    let id = create_user(
        db,
        &registration.email,
        &password_hash,
        Role::Pending,
        Some(&registration.full_name),
        false,
    )
    .await
    .validate_custom()?;

    let user = get_user(db, id).await.validate_custom()?;
    info!(email = %user.email, "Registered pending account");

    Ok(Custom(Status::Created, Json(UserData::from(user))))
}

#[derive(Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[serde(rename = "userId")]
    user_id: i64,
    #[serde(default)]
    #[validate(length(max = 100, message = "Full name is too long"))]
    full_name: String,
    #[serde(rename = "newPassword", default)]
    new_password: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: UserData,
}

#[post("/user/update", data = "<profile>")]
pub async fn api_update_profile(
    profile: Json<ProfileUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    auth: &State<AuthSettings>,
) -> ApiResult<Json<ProfileUpdateResponse>> {
    let profile = profile.validate_custom()?;

    user.require_self_or(profile.user_id, Permission::EditUserCredentials)
        .validate_custom()?;

    // An empty password field means "keep the current one".
    let new_password = profile.new_password.filter(|p| !p.is_empty());
    if let Some(password) = &new_password {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error(
                    "newPassword",
                    "Password must be at least 6 characters",
                )),
            ));
        }
    }

    let password_hash = match new_password {
        Some(password) => Some(auth.hash_password(&password).validate_custom()?),
        None => None,
    };

    let full_name = Some(profile.full_name.trim()).filter(|name| !name.is_empty());
    update_user_profile(db, profile.user_id, full_name, password_hash.as_deref())
        .await
        .validate_custom()?;

    let updated = get_user(db, profile.user_id).await.validate_custom()?;

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully".to_string(),
        user: UserData::from(updated),
    }))
}

#[derive(Deserialize, Validate)]
pub struct ProvisionRequest {
    #[serde(default)]
    #[validate(email(message = "Email required"))]
    email: String,
}

#[derive(Serialize, Deserialize)]
pub struct ProvisionResponse {
    pub success: bool,
    pub id: i64,
}

/// Admin-only: creates a coach account on the shared default password.
#[post("/admin/add-coach", data = "<request>")]
pub async fn api_add_coach(
    request: Json<ProvisionRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
    auth: &State<AuthSettings>,
) -> ApiResult<Custom<Json<ProvisionResponse>>> {
    user.require_permission(Permission::ProvisionStaff)
        .validate_custom()?;

    let request = request.validate_custom()?;

    let id = create_user(
        db,
        &request.email,
        &auth.default_password_hash,
        Role::Coach,
        None,
        true,
    )
    .await
    .validate_custom()?;

    info!(email = %request.email, provisioned_by = %user.email, "Provisioned coach account");

    Ok(Custom(
        Status::Created,
        Json(ProvisionResponse { success: true, id }),
    ))
}
