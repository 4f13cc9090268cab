use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::not_blank;

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct LoginForm {
	#[validate(email)]
	pub email: String,
	#[serde(skip_serializing)]
	#[validate(custom(function = "not_blank"))]
	pub password: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
	#[validate(custom(function = "not_blank"))]
	pub name: String,
	#[validate(email)]
	pub email: String,
	#[serde(skip_serializing)]
	#[validate(length(min = 8, max = 128, message = "Use between 8 and 128 characters."))]
	pub password: String,
	#[serde(skip_serializing)]
	pub password_confirmation: String,
}

/// What the identity provider sends the browser back with.
#[derive(Debug, Deserialize, Validate)]
pub struct CallbackQuery {
	pub code: Option<String>,
	pub state: Option<String>,
	pub error: Option<String>,
}
