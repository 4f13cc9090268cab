use std::collections::BTreeMap;

use serde::Serialize;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// The outcome of binding and validating one form post.
///
/// Values are kept so a rejected form can be shown again with what the
/// visitor typed, next to the errors for each field.
#[derive(Debug, Clone, Serialize)]
pub struct Submission<T> {
	pub values: T,
	pub errors: BTreeMap<String, Vec<String>>,
}

/// Turns a validation error code into something a visitor can read.
fn message(code: &str) -> String {
	match code {
		"required" => "This field is required.".into(),
		"email" => "Enter a valid email address.".into(),
		"permission" => "Choose either Editor or Viewer.".into(),
		"length" => "This value has the wrong length.".into(),
		code => format!("This value is invalid ({code})."),
	}
}

impl<T> Submission<T>
where
	T: Validate,
{
	/// Runs the declarative validation rules of `T`, collecting every failure.
	pub fn new(values: T) -> Self {
		let mut submission = Self {
			values,
			errors: BTreeMap::new(),
		};

		if let Err(errors) = submission.values.validate() {
			submission.extend(&errors);
		}

		submission
	}
}

impl<T> Submission<T> {
	/// A form that has not been submitted yet.
	pub fn blank(values: T) -> Self {
		Self {
			values,
			errors: BTreeMap::new(),
		}
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	pub fn set_field_error(&mut self, field: &str, message: impl Into<String>) {
		self.errors
			.entry(field.to_owned())
			.or_default()
			.push(message.into());
	}

	/// Runs a cross-field check, but only once every declarative rule passed.
	///
	/// The check returns `true` when the values are acceptable; otherwise
	/// `message` is attached to `field`.
	pub fn verify(&mut self, field: &str, message: &str, check: impl FnOnce(&T) -> bool) {
		if self.has_errors() {
			return;
		}

		if !check(&self.values) {
			self.set_field_error(field, message);
		}
	}

	fn extend(&mut self, errors: &ValidationErrors) {
		for (field, kind) in errors.errors() {
			if let ValidationErrorsKind::Field(errors) = kind {
				for error in errors {
					let message = error
						.message
						.as_ref()
						.map_or_else(|| message(&error.code), ToString::to_string);

					self.set_field_error(field, message);
				}
			}
		}
	}
}
