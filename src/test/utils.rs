use std::collections::HashMap;
use std::sync::Once;

use chrono::NaiveDate;
use rocket::http::{ContentType, Cookie, Status};
use rocket::local::asynchronous::Client;
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::auth::Role;
use crate::collection;
use crate::config::{AppConfig, AuthSettings};
use crate::db::create_user;
use crate::error::AppError;
use crate::init_rocket;
use crate::models::{
    CampSession, CampSessionDraft, Student, StudentDraft, TimeSlot, Venue, VenueDraft,
};

static INIT: Once = Once::new();
pub static STANDARD_PASSWORD: &str = "password123";
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestUser {
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub password: String,
}

#[derive(Default)]
pub struct TestDbBuilder {
    users: Vec<TestUser>,
    students: Vec<StudentDraft>,
    venues: Vec<VenueDraft>,
    sessions: Vec<CampSessionDraft>,
}

impl TestDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coach(self, email: &str, full_name: Option<&str>) -> Self {
        self.user_with_password(email, full_name, Role::Coach, STANDARD_PASSWORD)
    }

    pub fn admin(self, email: &str, full_name: Option<&str>) -> Self {
        self.user_with_password(email, full_name, Role::Admin, STANDARD_PASSWORD)
    }

    pub fn pending(self, email: &str, full_name: Option<&str>) -> Self {
        self.user_with_password(email, full_name, Role::Pending, STANDARD_PASSWORD)
    }

    pub fn user_with_password(
        mut self,
        email: &str,
        full_name: Option<&str>,
        role: Role,
        password: &str,
    ) -> Self {
        self.users.push(TestUser {
            email: email.to_string(),
            full_name: full_name.map(String::from),
            role,
            password: password.to_string(),
        });
        self
    }

    pub fn student(mut self, first_name_en: &str, last_name_en: &str, division: &str) -> Self {
        let mut draft = StudentDraft::named("طالب", "جزائري", first_name_en, last_name_en);
        draft.division = division.to_string();
        self.students.push(draft);
        self
    }

    pub fn venue(mut self, name: &str, capacity: Option<i64>) -> Self {
        self.venues.push(VenueDraft {
            name: name.to_string(),
            capacity,
        });
        self
    }

    pub fn session(mut self, title: &str, venue: &str, date: NaiveDate, slot: TimeSlot) -> Self {
        self.sessions.push(CampSessionDraft {
            title: title.to_string(),
            venue: venue.to_string(),
            date,
            time_slot: slot,
        });
        self
    }

    pub async fn build(self) -> Result<TestDb, AppError> {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("debug")
                .with_test_writer()
                .try_init();
        });

        // One connection that never recycles, so the in-memory database lives
        // as long as the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let mut user_ids = HashMap::new();
        for user in &self.users {
            let password_hash = bcrypt::hash(&user.password, TEST_BCRYPT_COST)?;
            let id = create_user(
                &pool,
                &user.email,
                &password_hash,
                user.role,
                user.full_name.as_deref(),
                false,
            )
            .await?;
            user_ids.insert(user.email.clone(), id);
        }

        for draft in &self.students {
            collection::create::<Student>(&pool, draft).await?;
        }
        for draft in &self.venues {
            collection::create::<Venue>(&pool, draft).await?;
        }
        for draft in &self.sessions {
            collection::create::<CampSession>(&pool, draft).await?;
        }

        Ok(TestDb { pool, user_ids })
    }
}

pub struct TestDb {
    pub pool: Pool<Sqlite>,
    pub user_ids: HashMap<String, i64>,
}

impl TestDb {
    pub fn user_id(&self, email: &str) -> Option<i64> {
        self.user_ids.get(email).copied()
    }
}

pub fn camp_day(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, day).expect("valid July date")
}

pub fn test_config() -> AppConfig {
    AppConfig {
        bcrypt_cost: TEST_BCRYPT_COST,
        ..AppConfig::default()
    }
}

/// Admin, coach and pending accounts plus a small camp.
pub async fn create_standard_test_db() -> TestDb {
    TestDbBuilder::new()
        .admin("admin@aoi.dz", Some("Camp Admin"))
        .coach("coach@aoi.dz", Some("Coach Karim"))
        .pending("pending@aoi.dz", Some("New Volunteer"))
        .student("Amine", "Benali", "Div 1")
        .student("Sara", "Haddad", "Div 2")
        .venue("Salle Info 1", Some(30))
        .venue("Auditorium", Some(120))
        .session("Graphs I", "Salle Info 1", camp_day(15), TimeSlot::Morning)
        .session("Contest 1", "Auditorium", camp_day(15), TimeSlot::Afternoon)
        .build()
        .await
        .expect("Failed to build test database")
}

pub async fn setup_test_client(test_db: TestDb) -> (Client, Pool<Sqlite>) {
    let config = test_config();
    let auth = AuthSettings::from_config(&config).expect("Failed to build auth settings");
    let pool = test_db.pool.clone();

    let figment = rocket::Config::figment().merge(("log_level", "off"));
    let client = Client::untracked(init_rocket(figment, test_db.pool, config, auth))
        .await
        .expect("Failed to build Rocket client");

    (client, pool)
}

pub async fn login_test_user(client: &Client, email: &str, password: &str) -> Vec<Cookie<'static>> {
    let response = client
        .post("/api/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": password }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok, "Login failed for {}", email);

    response.cookies().iter().cloned().collect()
}
