//! Persistence gateways.
//!
//! Each resource is reached through its own trait so handlers depend on the
//! capability they need rather than on a concrete database. The Postgres
//! implementation lives in [`postgres`]; tests use the in-memory store.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{
	Contact, CreateContactInput, CreatePostInput, CreateUserInput, Post, UpdateContactInput,
	UpdatePostInput, UpdateUserInput, User,
};

pub use postgres::PgStore;

pub type Posts = Arc<dyn PostGateway>;
pub type Users = Arc<dyn UserGateway>;
pub type Contacts = Arc<dyn ContactGateway>;
pub type Sessions = Arc<dyn SessionGateway>;

/// An error raised by a gateway.
///
/// Validation errors are raised before any statement is issued, while
/// constraint errors come back from the database itself.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{entity} {id} not found")]
	NotFound { entity: &'static str, id: i64 },
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("constraint violated: {0}")]
	Constraint(&'static str),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Sort order of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
	/// Most recently created first.
	#[default]
	Newest,
	/// Lowest identifier first.
	IdAscending,
}

/// Restricts which posts are counted and listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostPredicate {
	/// Inclusive lower bound on the creation time.
	pub created_from: Option<DateTime<Utc>>,
	/// Exclusive upper bound on the creation time.
	pub created_before: Option<DateTime<Utc>>,
}

impl PostPredicate {
	pub fn matches(&self, post: &Post) -> bool {
		self.created_from.map_or(true, |from| post.created_at >= from)
			&& self
				.created_before
				.map_or(true, |before| post.created_at < before)
	}
}

#[axum::async_trait]
pub trait PostGateway: Send + Sync {
	/// Creates a post written by `author`.
	async fn create(&self, author: &str, input: CreatePostInput) -> Result<Post>;
	async fn get(&self, id: i64) -> Result<Post>;
	/// Applies the fields present in `patch`, leaving the others untouched.
	async fn update(&self, id: i64, patch: UpdatePostInput) -> Result<Post>;
	async fn delete(&self, id: i64) -> Result<()>;
	async fn list(
		&self,
		predicate: PostPredicate,
		order: Order,
		offset: i64,
		limit: i64,
	) -> Result<Vec<Post>>;
	async fn count(&self, predicate: PostPredicate) -> Result<i64>;
}

#[axum::async_trait]
pub trait UserGateway: Send + Sync {
	/// Creates a verified user with an already hashed password.
	async fn create(&self, input: CreateUserInput, password_hash: String) -> Result<User>;
	async fn get(&self, id: i64) -> Result<User>;
	/// Looks a user up by email, ignoring case.
	async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
	async fn update(&self, id: i64, patch: UpdateUserInput) -> Result<User>;
	async fn delete(&self, id: i64) -> Result<()>;
	async fn list(&self, order: Order, offset: i64, limit: i64) -> Result<Vec<User>>;
	async fn count(&self) -> Result<i64>;
}

#[axum::async_trait]
pub trait ContactGateway: Send + Sync {
	async fn create(&self, input: CreateContactInput) -> Result<Contact>;
	async fn get(&self, id: i64) -> Result<Contact>;
	async fn update(&self, id: i64, patch: UpdateContactInput) -> Result<Contact>;
	async fn delete(&self, id: i64) -> Result<()>;
	async fn list(&self, order: Order, offset: i64, limit: i64) -> Result<Vec<Contact>>;
	async fn count(&self) -> Result<i64>;
}

#[axum::async_trait]
pub trait SessionGateway: Send + Sync {
	/// Opens a new session for the user, returning its id.
	async fn create(&self, user_id: i64) -> Result<Uuid>;
	/// Returns the user bound to the session, if the session exists.
	async fn find_user(&self, session_id: Uuid) -> Result<Option<User>>;
	async fn delete(&self, session_id: Uuid) -> Result<()>;
}

#[cfg(test)]
mod test {
	use chrono::TimeZone;

	use super::*;

	fn post_at(created_at: DateTime<Utc>) -> Post {
		Post {
			id: 1,
			title: "title".into(),
			body: "body".into(),
			author: "editor@example.com".into(),
			created_at,
			updated_at: created_at,
		}
	}

	#[test]
	fn test_predicate_bounds() {
		let predicate = PostPredicate {
			created_from: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
			created_before: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
		};

		assert!(predicate.matches(&post_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())));
		assert!(predicate.matches(&post_at(Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap())));
		assert!(!predicate.matches(&post_at(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())));
		assert!(!predicate.matches(&post_at(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap())));
	}

	#[test]
	fn test_empty_predicate_matches_everything() {
		assert!(PostPredicate::default().matches(&post_at(Utc::now())));
	}
}
