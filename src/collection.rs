//! Generic storage for the portal's record tables.
//!
//! Every panel (students, camp sessions, resources, venues, problems) is a
//! plain table with list/get/create/update/delete. A [`Record`] names its
//! table and the permissions that guard it, and its [`Draft`] lists the
//! writable columns. The functions here build the SQL from those two.

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::query_builder::Separated;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{FromRow, Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument};
use validator::Validate;

use crate::auth::Permission;
use crate::error::AppError;

/// A single writable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(Option<String>),
    Integer(Option<i64>),
    Date(Option<NaiveDate>),
    Flag(bool),
}

impl Field {
    pub fn text(value: impl Into<String>) -> Self {
        Field::Text(Some(value.into()))
    }

    fn bind_value(self, row: &mut Separated<'_, '_, Sqlite, &'static str>) {
        match self {
            Field::Text(v) => row.push_bind(v),
            Field::Integer(v) => row.push_bind(v),
            Field::Date(v) => row.push_bind(v),
            Field::Flag(v) => row.push_bind(v),
        };
    }

    fn bind_assignment(
        self,
        column: &'static str,
        assignments: &mut Separated<'_, '_, Sqlite, &'static str>,
    ) {
        assignments.push(column).push_unseparated(" = ");
        match self {
            Field::Text(v) => assignments.push_bind_unseparated(v),
            Field::Integer(v) => assignments.push_bind_unseparated(v),
            Field::Date(v) => assignments.push_bind_unseparated(v),
            Field::Flag(v) => assignments.push_bind_unseparated(v),
        };
    }
}

/// Writable side of a record: what clients send on create and update.
pub trait Draft: Validate + DeserializeOwned + Send + Sync {
    /// Column/value pairs, always in the same column order.
    fn fields(&self) -> Vec<(&'static str, Field)>;
}

/// Stored side of a record: a row of `TABLE`.
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Unpin + 'static {
    const TABLE: &'static str;
    /// Human-readable name for error messages.
    const LABEL: &'static str;
    const ORDER_BY: &'static str = "created_at DESC, id DESC";
    const READ: Permission;
    const WRITE: Permission;

    type Draft: Draft;
}

#[instrument(skip(pool), fields(table = R::TABLE))]
pub async fn list<R: Record>(pool: &Pool<Sqlite>) -> Result<Vec<R>, AppError> {
    info!("Listing records");
    let rows = sqlx::query_as::<_, R>(&format!(
        "SELECT * FROM {} ORDER BY {}",
        R::TABLE,
        R::ORDER_BY
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[instrument(skip(pool), fields(table = R::TABLE))]
pub async fn get<R: Record>(pool: &Pool<Sqlite>, id: i64) -> Result<R, AppError> {
    info!("Fetching record");
    let row = sqlx::query_as::<_, R>(&format!("SELECT * FROM {} WHERE id = ?", R::TABLE))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", R::LABEL, id)))
}

#[instrument(skip(pool), fields(table = R::TABLE))]
pub async fn count<R: Record>(pool: &Pool<Sqlite>) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", R::TABLE))
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Inserts one draft and reads the stored row back.
#[instrument(skip_all, fields(table = R::TABLE))]
pub async fn create<R: Record>(pool: &Pool<Sqlite>, draft: &R::Draft) -> Result<R, AppError> {
    info!("Creating record");
    let mut conn = pool.acquire().await?;
    let id = insert_rows::<R>(&mut conn, std::slice::from_ref(draft))
        .await?
        .last_insert_rowid();
    drop(conn);

    get::<R>(pool, id).await
}

/// Inserts every draft inside one transaction: either all rows land or none.
#[instrument(skip_all, fields(table = R::TABLE, rows = drafts.len()))]
pub async fn create_many<R: Record>(
    pool: &Pool<Sqlite>,
    drafts: &[R::Draft],
) -> Result<u64, AppError> {
    info!("Creating records in one batch");
    let Some(first) = drafts.first() else {
        return Err(AppError::Validation(format!(
            "No {} rows to insert",
            R::LABEL
        )));
    };
    let rows_per_statement = (SQLITE_MAX_VARIABLES / first.fields().len().max(1)).max(1);

    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for chunk in drafts.chunks(rows_per_statement) {
        inserted += insert_rows::<R>(&mut tx, chunk).await?.rows_affected();
    }
    tx.commit().await?;

    Ok(inserted)
}

/// SQLite's limit on bound parameters in one statement.
const SQLITE_MAX_VARIABLES: usize = 32766;

async fn insert_rows<R: Record>(
    conn: &mut SqliteConnection,
    drafts: &[R::Draft],
) -> Result<sqlx::sqlite::SqliteQueryResult, AppError> {
    let Some(first) = drafts.first() else {
        return Err(AppError::Validation(format!("No {} to insert", R::LABEL)));
    };
    let columns: Vec<&'static str> = first.fields().into_iter().map(|(c, _)| c).collect();

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO ");
    builder.push(R::TABLE).push(" (");
    {
        let mut names = builder.separated(", ");
        for column in &columns {
            names.push(*column);
        }
    }
    builder.push(") ");

    builder.push_values(drafts, |mut row, draft| {
        for (_, value) in draft.fields() {
            value.bind_value(&mut row);
        }
    });

    Ok(builder.build().execute(&mut *conn).await?)
}

#[instrument(skip(pool, draft), fields(table = R::TABLE))]
pub async fn update<R: Record>(
    pool: &Pool<Sqlite>,
    id: i64,
    draft: &R::Draft,
) -> Result<R, AppError> {
    info!("Updating record");
    write_fields::<R>(pool, id, draft.fields()).await?;
    get::<R>(pool, id).await
}

/// Writes a single column, for the panels that edit one value in place.
#[instrument(skip(pool, value), fields(table = R::TABLE))]
pub async fn set_field<R: Record>(
    pool: &Pool<Sqlite>,
    id: i64,
    column: &'static str,
    value: Field,
) -> Result<R, AppError> {
    info!("Setting record field");
    write_fields::<R>(pool, id, vec![(column, value)]).await?;
    get::<R>(pool, id).await
}

async fn write_fields<R: Record>(
    pool: &Pool<Sqlite>,
    id: i64,
    fields: Vec<(&'static str, Field)>,
) -> Result<(), AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE ");
    builder.push(R::TABLE).push(" SET ");
    {
        let mut assignments = builder.separated(", ");
        for (column, value) in fields {
            value.bind_assignment(column, &mut assignments);
        }
    }
    builder.push(" WHERE id = ").push_bind(id);

    let res = builder.build().execute(pool).await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "{} with id {} not found",
            R::LABEL,
            id
        )));
    }

    Ok(())
}

#[instrument(skip(pool), fields(table = R::TABLE))]
pub async fn delete<R: Record>(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting record");
    let res = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", R::TABLE))
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "{} with id {} not found",
            R::LABEL,
            id
        )));
    }

    Ok(())
}
