use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::{not_blank, CreateContactInput};

/// The contact form as typed into the browser.
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ContactForm {
	#[validate(email)]
	pub email: String,
	#[validate(custom(function = "not_blank"))]
	pub link: String,
	#[serde(rename = "type")]
	#[validate(custom(function = "not_blank"))]
	pub kind: String,
	#[validate(custom(function = "not_blank"))]
	pub message: String,
}

impl From<ContactForm> for CreateContactInput {
	fn from(form: ContactForm) -> Self {
		Self {
			email: form.email.trim().to_owned(),
			link: form.link.trim().to_owned(),
			kind: form.kind.trim().to_owned(),
			message: form.message.trim().to_owned(),
		}
	}
}
