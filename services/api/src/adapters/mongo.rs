//! services/api/src/adapters/mongo.rs
//!
//! The document implementation of the `BenchmarkStore` port. Users are
//! denormalized documents embedding their devices, reading histories and
//! notifications; books embed their author. Joins happen in-process.
//!
//! Writes here are only atomic per statement. A failure partway through
//! `add_notifications` leaves the notifications already pushed in place.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{options::FindOptions, Collection, Database as MongoDatabase};
use rand::Rng;
use serde::{Deserialize, Serialize};
use store_bench_core::domain::{Database, InsertCount};
use store_bench_core::ports::{BenchmarkStore, PortError, PortResult};
use store_bench_core::workload::{
    last_read_message, pick_distinct_indexes, random_last_page, BOOKS_PER_USER,
    DEVICES_PER_USER,
};
use tracing::{error, info};

//=========================================================================================
// Typed Document Schema
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub user_devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub user_book_reading_histories: Vec<ReadingHistoryEntry>,
    #[serde(default)]
    pub notifications: Vec<NotificationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub device_type: String,
    pub device_token: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub registered_at: DateTime<Utc>,
}

/// `device` is the entry's own position in the history list, not a pointer
/// into `user_devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingHistoryEntry {
    pub book_id: ObjectId,
    pub device: i32,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_timestamp: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_timestamp: DateTime<Utc>,
    pub last_page_read: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub message: String,
    pub is_read: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub author: Option<AuthorEmbed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorEmbed {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BookId {
    #[serde(rename = "_id")]
    id: ObjectId,
}

//=========================================================================================
// Document Shaping
//=========================================================================================

/// Builds `count` synthetic user documents. Each gets three fixed devices and
/// three reading histories over distinct random books.
pub fn build_user_documents<R: Rng + ?Sized>(
    rng: &mut R,
    book_ids: &[ObjectId],
    count: InsertCount,
    now: DateTime<Utc>,
) -> PortResult<Vec<UserDocument>> {
    let mut users = Vec::with_capacity(count.get() as usize);
    for i in 0..count.get() {
        let picked = pick_distinct_indexes(rng, book_ids.len(), BOOKS_PER_USER).ok_or_else(|| {
            PortError::Store(format!(
                "At least {} books are required, found {}",
                BOOKS_PER_USER,
                book_ids.len()
            ))
        })?;

        let user_devices = (1..=DEVICES_PER_USER)
            .map(|n| DeviceEntry {
                device_type: format!("DeviceType{}", n),
                device_token: format!("token{}", n),
                registered_at: now,
            })
            .collect();

        let user_book_reading_histories = picked
            .into_iter()
            .enumerate()
            .map(|(position, book_index)| ReadingHistoryEntry {
                book_id: book_ids[book_index],
                device: position as i32,
                start_timestamp: now,
                end_timestamp: now,
                last_page_read: random_last_page(&mut *rng),
            })
            .collect();

        users.push(UserDocument {
            id: None,
            name: format!("Test User {}", i),
            email: format!("test{}@example.com", i),
            password_hash: "hash".to_string(),
            created_at: now,
            updated_at: now,
            user_devices,
            user_book_reading_histories,
            notifications: Vec::new(),
        });
    }
    Ok(users)
}

/// The most recent reading history of a document user is the last list entry.
pub fn latest_reading(user: &UserDocument) -> PortResult<&ReadingHistoryEntry> {
    user.user_book_reading_histories.last().ok_or_else(|| {
        PortError::NotFound(format!(
            "User {} has no reading history",
            display_id(user.id)
        ))
    })
}

/// Shapes the notification for a user's latest reading of `book`.
pub fn notification_for(
    reading: &ReadingHistoryEntry,
    book: &BookDocument,
    now: DateTime<Utc>,
) -> PortResult<NotificationEntry> {
    let author = book.author.as_ref().ok_or_else(|| {
        PortError::NotFound(format!("Book {} has no embedded author", book.id))
    })?;
    Ok(NotificationEntry {
        message: last_read_message(reading.last_page_read, &book.title, &author.name),
        is_read: false,
        created_at: now,
    })
}

/// The `_id` of a stored user. Documents read back from the store always carry one.
pub fn saved_user_id(user: &UserDocument) -> PortResult<ObjectId> {
    user.id.ok_or_else(|| {
        error!("User document without an _id (email {})", user.email);
        PortError::NotFound(format!("User document {} has no _id", user.email))
    })
}

/// Turns the book lookup for a user's latest reading into a hard failure when
/// the referenced book does not exist.
pub fn resolved_book(
    user_id: ObjectId,
    reading: &ReadingHistoryEntry,
    found: Option<BookDocument>,
) -> PortResult<BookDocument> {
    found.ok_or_else(|| {
        error!("Book {} referenced by user {} not found", reading.book_id, user_id);
        PortError::NotFound(format!("Book {} not found", reading.book_id))
    })
}

fn display_id(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex())
        .unwrap_or_else(|| "<unsaved>".to_string())
}

fn store_error(e: mongodb::error::Error) -> PortError {
    PortError::Store(e.to_string())
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A document store adapter that implements the `BenchmarkStore` port.
#[derive(Clone)]
pub struct MongoStore {
    users: Collection<UserDocument>,
    books: Collection<BookDocument>,
}

impl MongoStore {
    /// Creates a new `MongoStore` over the given database handle.
    pub fn new(db: &MongoDatabase) -> Self {
        Self {
            users: db.collection("users"),
            books: db.collection("books"),
        }
    }

    async fn load_book_ids(&self) -> Result<Vec<ObjectId>, mongodb::error::Error> {
        let options = FindOptions::builder().projection(doc! { "_id": 1 }).build();
        let ids: Vec<BookId> = self
            .books
            .clone_with_type::<BookId>()
            .find(doc! {}, options)
            .await?
            .try_collect()
            .await?;
        Ok(ids.into_iter().map(|b| b.id).collect())
    }
}

//=========================================================================================
// `BenchmarkStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BenchmarkStore for MongoStore {
    fn database(&self) -> Database {
        Database::MongoDb
    }

    async fn insert_users(&self, count: InsertCount) -> PortResult<u64> {
        let book_ids = self.load_book_ids().await.map_err(|e| {
            error!("Error fetching book IDs: {}", e);
            store_error(e)
        })?;

        let documents =
            build_user_documents(&mut rand::thread_rng(), &book_ids, count, Utc::now())
                .map_err(|e| {
                    error!("Error building user documents: {}", e);
                    e
                })?;

        let result = self.users.insert_many(documents, None).await.map_err(|e| {
            error!("Error inserting users: {}", e);
            store_error(e)
        })?;

        info!("Inserted {} user documents", result.inserted_ids.len());
        Ok(result.inserted_ids.len() as u64)
    }

    async fn delete_all_users(&self) -> PortResult<u64> {
        let result = self.users.delete_many(doc! {}, None).await.map_err(|e| {
            error!("Error deleting users: {}", e);
            store_error(e)
        })?;

        info!(
            "All user data deleted successfully, documents removed: {}",
            result.deleted_count
        );
        Ok(result.deleted_count)
    }

    async fn update_passwords(&self) -> PortResult<u64> {
        let pipeline = vec![doc! {
            "$set": { "password_hash": { "$concat": ["$password_hash", "1"] } }
        }];
        let result = self
            .users
            .update_many(doc! {}, pipeline, None)
            .await
            .map_err(|e| {
                error!("Error updating user passwords: {}", e);
                store_error(e)
            })?;

        info!(
            "Password hashes updated, number of users affected: {}",
            result.modified_count
        );
        Ok(result.modified_count)
    }

    async fn add_notifications(&self) -> PortResult<u64> {
        let users: Vec<UserDocument> = self
            .users
            .find(doc! {}, None)
            .await
            .map_err(|e| {
                error!("Error fetching users: {}", e);
                store_error(e)
            })?
            .try_collect()
            .await
            .map_err(|e| {
                error!("Error decoding user data: {}", e);
                store_error(e)
            })?;

        let mut created = 0;
        for user in &users {
            let user_id = saved_user_id(user)?;
            let reading = latest_reading(user).map_err(|e| {
                error!("Error resolving latest reading for user {}: {}", user_id, e);
                e
            })?;

            let found = self
                .books
                .find_one(doc! { "_id": reading.book_id }, None)
                .await
                .map_err(|e| {
                    error!(
                        "Error fetching book details for book ID {}: {}",
                        reading.book_id, e
                    );
                    store_error(e)
                })?;
            let book = resolved_book(user_id, reading, found)?;

            let notification = notification_for(reading, &book, Utc::now())?;
            let entry = bson::to_bson(&notification)
                .map_err(|e| PortError::Store(e.to_string()))?;

            self.users
                .update_one(
                    doc! { "_id": user_id },
                    doc! { "$push": { "notifications": entry } },
                    None,
                )
                .await
                .map_err(|e| {
                    error!("Error adding notification to user {}: {}", user_id, e);
                    store_error(e)
                })?;
            created += 1;
        }

        info!("Notifications generated for {} users", created);
        Ok(created)
    }
}
