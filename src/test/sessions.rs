#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rocket::http::{ContentType, Cookie, Status};
    use serde_json::json;
    use sqlx::{Pool, Sqlite};

    use crate::auth::UserSession;
    use crate::db::{clean_expired_sessions, create_user_session, get_session_by_token};
    use crate::error::AppError;
    use crate::test::utils::{
        STANDARD_PASSWORD, TestDbBuilder, create_standard_test_db, login_test_user,
        setup_test_client, test_config,
    };

    async fn session_tokens(pool: &Pool<Sqlite>, user_id: i64) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT token FROM user_sessions WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .expect("Failed to list sessions")
    }

    #[rocket::async_test]
    async fn test_login_issues_session_for_configured_ttl() {
        let test_db = create_standard_test_db().await;
        let coach_id = test_db.user_id("coach@aoi.dz").unwrap();
        let (client, pool) = setup_test_client(test_db).await;
        let ttl_hours = test_config().session_ttl_hours;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(json!({ "email": "coach@aoi.dz", "password": STANDARD_PASSWORD }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let cookie = response
            .cookies()
            .get("session_token")
            .cloned()
            .expect("Login should set the session cookie");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(rocket::time::Duration::hours(ttl_hours)));

        let tokens = session_tokens(&pool, coach_id).await;
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].len(), 48);

        let session = get_session_by_token(&pool, &tokens[0]).await.unwrap();
        let expected = Utc::now().naive_utc() + Duration::hours(ttl_hours);
        let drift = (session.expires_at - expected).num_seconds().abs();
        assert!(drift <= 5, "Session expiry is {drift}s away from the configured TTL");
        assert!(session.is_valid());
    }

    #[rocket::async_test]
    async fn test_logout_on_one_device_keeps_the_other() {
        let test_db = create_standard_test_db().await;
        let coach_id = test_db.user_id("coach@aoi.dz").unwrap();
        let (client, pool) = setup_test_client(test_db).await;

        let laptop = login_test_user(&client, "coach@aoi.dz", STANDARD_PASSWORD).await;
        let phone = login_test_user(&client, "coach@aoi.dz", STANDARD_PASSWORD).await;
        assert_eq!(session_tokens(&pool, coach_id).await.len(), 2);

        let response = client.post("/api/logout").cookies(laptop.clone()).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(session_tokens(&pool, coach_id).await.len(), 1);

        let response = client.get("/api/me").cookies(laptop).dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
        let response = client.get("/api/me").cookies(phone).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_expired_session_is_refused_then_purged() {
        let test_db = create_standard_test_db().await;
        let coach_id = test_db.user_id("coach@aoi.dz").unwrap();
        let (client, pool) = setup_test_client(test_db).await;

        let live = login_test_user(&client, "coach@aoi.dz", STANDARD_PASSWORD).await;

        let stale_token = UserSession::generate_token();
        let yesterday = (Utc::now() - Duration::days(1)).naive_utc();
        create_user_session(&pool, coach_id, &stale_token, yesterday)
            .await
            .unwrap();

        let response = client
            .get("/api/me")
            .private_cookie(Cookie::build(("session_token", stale_token.clone())).build())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        assert_eq!(clean_expired_sessions(&pool).await.unwrap(), 1);
        assert!(matches!(
            get_session_by_token(&pool, &stale_token).await,
            Err(AppError::Authentication(_))
        ));

        let response = client.get("/api/me").cookies(live).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_purge_keeps_sessions_that_have_not_lapsed() {
        let test_db = TestDbBuilder::new()
            .coach("night.shift@aoi.dz", None)
            .build()
            .await
            .expect("Failed to build test database");
        let pool = test_db.pool.clone();
        let coach_id = test_db.user_id("night.shift@aoi.dz").unwrap();

        let closing_soon = UserSession::generate_token();
        create_user_session(
            &pool,
            coach_id,
            &closing_soon,
            (Utc::now() + Duration::minutes(1)).naive_utc(),
        )
        .await
        .unwrap();

        assert_eq!(clean_expired_sessions(&pool).await.unwrap(), 0);
        assert!(get_session_by_token(&pool, &closing_soon).await.unwrap().is_valid());
    }
}
