use crate::{
    auth::{DbUser, DbUserSession, Role, User, UserSession},
    error::AppError,
};
use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

const USER_COLUMNS: &str = "id, email, role, full_name, uses_default_password";

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn find_user_by_email(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<User>, AppError> {
    info!("Looking up user by email");
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(User::from))
}

/// Returns the account only when the password verifies. An unknown email and
/// a wrong password are indistinguishable to the caller.
#[instrument(skip_all, fields(email))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");

    #[derive(sqlx::FromRow)]
    struct Credentials {
        id: i64,
        password_hash: String,
    }

    let credentials =
        sqlx::query_as::<_, Credentials>("SELECT id, password_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    let Some(credentials) = credentials else {
        return Ok(None);
    };

    match bcrypt::verify(password, &credentials.password_hash) {
        Ok(true) => Ok(Some(get_user(pool, credentials.id).await?)),
        _ => Ok(None),
    }
}

#[instrument(skip(pool, password_hash))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password_hash: &str,
    role: Role,
    full_name: Option<&str>,
    uses_default_password: bool,
) -> Result<i64, AppError> {
    info!("Creating new user");

    if find_user_by_email(pool, email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let res = sqlx::query(
        "INSERT INTO users (email, role, full_name, password_hash, uses_default_password)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(email)
    .bind(role.as_str())
    .bind(full_name)
    .bind(password_hash)
    .bind(uses_default_password)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Writes the display name and, when given, a new already-salted password
/// hash in one transaction. A new hash clears the shared-default marker.
#[instrument(skip(pool, password_hash), fields(password_changed = password_hash.is_some()))]
pub async fn update_user_profile(
    pool: &Pool<Sqlite>,
    user_id: i64,
    full_name: Option<&str>,
    password_hash: Option<&str>,
) -> Result<(), AppError> {
    info!("Updating user profile");
    let mut tx = pool.begin().await?;

    let res = sqlx::query("UPDATE users SET full_name = ? WHERE id = ?")
        .bind(full_name)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
    }

    if let Some(password_hash) = password_hash {
        sqlx::query(
            "UPDATE users SET password_hash = ?, uses_default_password = FALSE WHERE id = ?",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn update_user_role(
    pool: &Pool<Sqlite>,
    user_id: i64,
    role: Role,
) -> Result<(), AppError> {
    info!("Updating user role");
    let res = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(user_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
    }

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_users_by_role(pool: &Pool<Sqlite>, role: Role) -> Result<Vec<User>, AppError> {
    info!(role = %role, "Getting users by role");

    let rows = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

#[instrument(skip(pool))]
pub async fn count_users_by_role(pool: &Pool<Sqlite>, role: Role) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(role.as_str())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Creates the configured admin account on an empty install.
#[instrument(skip(pool, password_hash))]
pub async fn ensure_admin(
    pool: &Pool<Sqlite>,
    email: &str,
    password_hash: &str,
) -> Result<bool, AppError> {
    if find_user_by_email(pool, email).await?.is_some() {
        return Ok(false);
    }

    info!("Bootstrapping admin account");
    create_user(pool, email, password_hash, Role::Admin, None, false).await?;
    Ok(true)
}

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let res = sqlx::query("INSERT INTO user_sessions (user_id, token, expires_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(UserSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
