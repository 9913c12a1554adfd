#![allow(dead_code, unreachable_pub)]

use blueprinter::Record;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub title: String,
    pub isdn: String,
}

/// A user and a book seen as one flat object.
#[derive(Debug, Clone, Serialize)]
pub struct UserAndBook {
    #[serde(flatten)]
    pub user: User,
    #[serde(flatten)]
    pub book: Book,
}

/// Wraps a user without flattening it; its own `id` differs from the user's.
#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub id: u32,
    pub role: String,
    pub user: User,
}

#[must_use]
pub fn user() -> User {
    User { id: 1, name: "test".to_owned() }
}

#[must_use]
pub fn book() -> Book {
    Book { title: "blueprints".to_owned(), isdn: "123".to_owned() }
}

#[must_use]
pub fn membership() -> Membership {
    Membership { id: 99, role: "admin".to_owned(), user: user() }
}

/// Wraps a record for comparison against `json!` literals.
#[must_use]
pub fn value(record: Record) -> Value {
    Value::Object(record)
}

/// Completes after `ms` milliseconds, used to reorder async completions.
pub async fn delay(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
