//! services/api/src/adapters/postgres.rs
//!
//! The relational implementation of the `BenchmarkStore` port. It works against
//! the normalized schema (users, user_devices, user_book_reading_histories,
//! books, authors, genres, book_genres, notifications) using `sqlx`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use store_bench_core::domain::{Database, InsertCount};
use store_bench_core::ports::{BenchmarkStore, PortError, PortResult};
use store_bench_core::workload::{random_last_page, BOOKS_PER_USER, DEVICES_PER_USER};
use tracing::{error, info};

/// User-scoped tables in foreign-key dependency order. `users` goes last.
pub const USER_SCOPED_TABLES: [&str; 4] = [
    "user_book_reading_histories",
    "user_devices",
    "notifications",
    "users",
];

const INSERT_USER_SQL: &str = "INSERT INTO users (name, email, password_hash, created_at, updated_at) \
     VALUES ('Test User', 'test@example.com', 'hash', NOW(), NOW()) RETURNING id";

const INSERT_DEVICE_SQL: &str = "INSERT INTO user_devices (user_id, device_type, device_token, registered_at) \
     VALUES ($1, $2, 'token', NOW()) RETURNING id";

const RANDOM_BOOKS_SQL: &str = "SELECT id FROM books ORDER BY random() LIMIT $1";

const INSERT_HISTORY_SQL: &str = "INSERT INTO user_book_reading_histories \
     (user_id, book_id, start_timestamp, end_timestamp, last_page_read, device_id, created_at) \
     VALUES ($1, $2, NOW(), NOW(), $3, $4, NOW())";

const UPDATE_PASSWORDS_SQL: &str = "UPDATE users SET password_hash = password_hash || '1'";

/// One notification per user from their newest reading history (by `created_at`),
/// joined through book, author, every genre and the device used. Users without
/// history drop out of the inner joins.
pub const ADD_NOTIFICATIONS_SQL: &str = r#"
    WITH latest_reading_history AS (
        SELECT user_id, book_id, device_id, last_page_read,
               ROW_NUMBER() OVER (PARTITION BY user_id ORDER BY created_at DESC) AS rn
        FROM user_book_reading_histories
    )
    INSERT INTO notifications (user_id, message, is_read, created_at)
    SELECT u.id AS user_id,
           'Hey there! You last stopped at page ' || lrh.last_page_read ||
           ' in ''' || b.title || ''' by ' || a.name ||
           ', a ' || string_agg(g.name, ', ') || ' genre book, on your ' || d.device_type ||
           ' device. Can''t wait to see you back!' AS message,
           FALSE,
           NOW()
    FROM users u
    JOIN latest_reading_history lrh ON u.id = lrh.user_id AND lrh.rn = 1
    JOIN books b ON lrh.book_id = b.id
    JOIN authors a ON b.author_id = a.id
    JOIN book_genres bg ON b.id = bg.book_id
    JOIN genres g ON bg.genre_id = g.id
    JOIN user_devices d ON lrh.device_id = d.id
    GROUP BY u.id, lrh.last_page_read, b.title, a.name, d.device_type
"#;

fn store_error(e: sqlx::Error) -> PortError {
    PortError::Store(e.to_string())
}

/// Device type for the `index`-th device of a user.
pub fn device_type(index: usize) -> String {
    format!("DeviceType{}", index)
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A relational store adapter that implements the `BenchmarkStore` port.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new `PostgresStore` over an already connected pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_user(tx: &mut Transaction<'_, Postgres>) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(INSERT_USER_SQL)
            .fetch_one(&mut **tx)
            .await
    }

    async fn insert_devices(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
    ) -> Result<Vec<i32>, sqlx::Error> {
        let mut device_ids = Vec::with_capacity(DEVICES_PER_USER);
        for i in 0..DEVICES_PER_USER {
            let device_id = sqlx::query_scalar::<_, i32>(INSERT_DEVICE_SQL)
                .bind(user_id)
                .bind(device_type(i))
                .fetch_one(&mut **tx)
                .await?;
            device_ids.push(device_id);
        }
        Ok(device_ids)
    }

    /// Writes one history row per (book, device) pair for the user.
    async fn insert_reading_histories(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        device_ids: &[i32],
    ) -> Result<(), sqlx::Error> {
        let book_ids = sqlx::query_scalar::<_, i32>(RANDOM_BOOKS_SQL)
            .bind(BOOKS_PER_USER as i64)
            .fetch_all(&mut **tx)
            .await?;

        for book_id in &book_ids {
            for device_id in device_ids {
                let last_page_read = random_last_page(&mut rand::thread_rng());
                sqlx::query(INSERT_HISTORY_SQL)
                    .bind(user_id)
                    .bind(*book_id)
                    .bind(last_page_read)
                    .bind(*device_id)
                    .execute(&mut **tx)
                    .await?;
            }
        }
        Ok(())
    }
}

//=========================================================================================
// `BenchmarkStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BenchmarkStore for PostgresStore {
    fn database(&self) -> Database {
        Database::PostgreSql
    }

    /// Inserts every user inside one transaction. Any failure drops the
    /// transaction uncommitted, which rolls the whole batch back.
    async fn insert_users(&self, count: InsertCount) -> PortResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Error starting transaction: {}", e);
            store_error(e)
        })?;

        for _ in 0..count.get() {
            let user_id = Self::insert_user(&mut tx).await.map_err(|e| {
                error!("Error inserting user: {}", e);
                store_error(e)
            })?;

            let device_ids = Self::insert_devices(&mut tx, user_id).await.map_err(|e| {
                error!("Error inserting devices for user {}: {}", user_id, e);
                store_error(e)
            })?;

            Self::insert_reading_histories(&mut tx, user_id, &device_ids)
                .await
                .map_err(|e| {
                    error!(
                        "Error inserting user book reading histories for user {}: {}",
                        user_id, e
                    );
                    store_error(e)
                })?;
        }

        tx.commit().await.map_err(|e| {
            error!("Error committing transaction: {}", e);
            store_error(e)
        })?;

        info!("Inserted {} users", count.get());
        Ok(u64::from(count.get()))
    }

    async fn delete_all_users(&self) -> PortResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Error starting transaction: {}", e);
            store_error(e)
        })?;

        let mut users_deleted = 0;
        for table in USER_SCOPED_TABLES {
            let result = sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!("Error deleting data from table {}: {}", table, e);
                    store_error(e)
                })?;
            if table == "users" {
                users_deleted = result.rows_affected();
            }
        }

        tx.commit().await.map_err(|e| {
            error!("Error committing transaction: {}", e);
            store_error(e)
        })?;

        info!("All user data deleted successfully, users removed: {}", users_deleted);
        Ok(users_deleted)
    }

    async fn update_passwords(&self) -> PortResult<u64> {
        let result = sqlx::query(UPDATE_PASSWORDS_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Error updating user passwords: {}", e);
                store_error(e)
            })?;

        info!("Password hashes updated, rows affected: {}", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn add_notifications(&self) -> PortResult<u64> {
        let result = sqlx::query(ADD_NOTIFICATIONS_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Error generating notifications: {}", e);
                store_error(e)
            })?;

        info!("Notifications generated, rows affected: {}", result.rows_affected());
        Ok(result.rows_affected())
    }
}
