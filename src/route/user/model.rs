use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
	model::{Permission, User},
	render::truncate,
};

const NAME_LENGTH: usize = 30;
const EMAIL_LENGTH: usize = 80;

/// A user as shown in the user listing.
#[derive(Debug, Serialize)]
pub struct UserRow {
	pub id: i64,
	pub name: String,
	pub email: String,
	pub permission: Permission,
	pub created_at: DateTime<Utc>,
}

impl From<User> for UserRow {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			name: truncate(&user.name, NAME_LENGTH),
			email: truncate(&user.email, EMAIL_LENGTH),
			permission: user.permission,
			created_at: user.created_at,
		}
	}
}

fn known_permission(value: &str) -> Result<(), ValidationError> {
	value
		.parse::<Permission>()
		.map(|_| ())
		.map_err(|()| ValidationError::new("permission"))
}

/// The permission picker shown next to each user.
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct PermissionForm {
	#[validate(custom(function = "known_permission"))]
	pub permission: String,
}

impl PermissionForm {
	pub fn permission(&self) -> Option<Permission> {
		self.permission.parse().ok()
	}
}
