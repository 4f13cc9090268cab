use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Rejects values that are empty once surrounding whitespace is removed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(ValidationError::new("required"));
	}

	Ok(())
}

/// The two roles a user can hold.
///
/// Stored as the `permission` Postgres enum.
#[derive(
	Debug,
	Clone,
	Copy,
	Default,
	PartialEq,
	Eq,
	Deserialize,
	Serialize,
	JsonSchema,
	sqlx::Type,
)]
#[sqlx(type_name = "permission")]
pub enum Permission {
	/// Full create, update and delete access to posts, contacts and users.
	Editor,
	/// Read-only access.
	#[default]
	Viewer,
}

impl std::str::FromStr for Permission {
	type Err = ();

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"Editor" => Ok(Self::Editor),
			"Viewer" => Ok(Self::Viewer),
			_ => Err(()),
		}
	}
}

/// A single post.
#[model]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The title of the post.
	#[validate(custom(function = "not_blank"))]
	pub title: String,
	/// The content of the post.
	#[validate(custom(function = "not_blank"))]
	pub body: String,
	/// Email address of the editor that wrote the post.
	#[serde(skip_deserializing)]
	pub author: String,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	/// The last time the post was changed.
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
}

/// A single user.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The display name of the user.
	#[validate(custom(function = "not_blank"))]
	pub name: String,
	/// The user's email address, unique regardless of case.
	#[validate(email)]
	pub email: String,
	/// What the user is allowed to do.
	#[serde(default)]
	pub permission: Permission,
	/// The argon2 password hash in PHC string format.
	#[serde(skip)]
	pub password: String,
	/// Whether the email address has been verified.
	#[serde(skip_deserializing)]
	pub verified: bool,
	/// The creation time of the user.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

/// A message left through the contact form.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Contact {
	/// The unique identifier of the message.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// Where to reply.
	#[validate(email)]
	pub email: String,
	/// A link the visitor wants to share.
	#[validate(custom(function = "not_blank"))]
	pub link: String,
	/// Free-text category of the message.
	#[serde(rename = "type")]
	#[sqlx(rename = "type")]
	#[validate(custom(function = "not_blank"))]
	pub kind: String,
	/// The message itself.
	#[validate(custom(function = "not_blank"))]
	pub message: String,
	/// The time the message was left.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}
