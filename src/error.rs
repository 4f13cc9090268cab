use axum::{
	body::Body,
	extract::{
		multipart::{MultipartError, MultipartRejection},
		rejection,
	},
	http::{header, Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tower_governor::GovernorError;

use crate::store;

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{entity} {id} not found")]
	NotFound { entity: &'static str, id: i64 },
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("constraint error: {0}")]
	Constraint(&'static str),
	#[error("permission denied")]
	Permission,
	#[error("not authenticated")]
	Authentication,
	#[error("already authenticated")]
	AlreadyAuthenticated,
	#[error("malformed request: {0}")]
	Transport(String),
	#[error("request timed out")]
	Timeout,
	#[error("identity provider error: {0}")]
	Upstream(String),
	#[error("rate limited: {0}")]
	RateLimited(#[from] GovernorError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("password hash error: {0}")]
	Hash(#[from] argon2::password_hash::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("serialization error: {0}")]
	Serialize(#[from] serde_json::Error),
}

/// The broad category of an [`Error`], attached to error responses so the
/// error page layer can decide how to present them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	NotFound,
	Validation,
	Constraint,
	Permission,
	Authentication,
	Transport,
	Timeout,
	Upstream,
	RateLimited,
	Internal,
}

/// The JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<String>,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::NotFound { .. } => ErrorKind::NotFound,
			Self::Validation(..) => ErrorKind::Validation,
			Self::Constraint(..) => ErrorKind::Constraint,
			Self::Permission | Self::AlreadyAuthenticated => ErrorKind::Permission,
			Self::Authentication => ErrorKind::Authentication,
			Self::Transport(..) => ErrorKind::Transport,
			Self::Timeout => ErrorKind::Timeout,
			Self::Upstream(..) => ErrorKind::Upstream,
			Self::RateLimited(..) => ErrorKind::RateLimited,
			Self::Database(..) | Self::Hash(..) | Self::Io(..) | Self::Serialize(..) => {
				ErrorKind::Internal
			}
		}
	}

	pub fn status(&self) -> StatusCode {
		match self.kind() {
			ErrorKind::NotFound => StatusCode::NOT_FOUND,
			ErrorKind::Validation | ErrorKind::Transport => StatusCode::BAD_REQUEST,
			ErrorKind::Constraint => StatusCode::CONFLICT,
			ErrorKind::Permission => StatusCode::FORBIDDEN,
			ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
			ErrorKind::Timeout => StatusCode::REQUEST_TIMEOUT,
			ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
			ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
			ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Messages that are safe to present to the client.
	fn messages(&self) -> Vec<String> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors
						.iter()
						.map(move |error| format!("{field}: {}", error.code))
				})
				.collect(),
			Self::NotFound { entity, .. } => vec![format!("{entity} not found")],
			Self::Constraint(message) => vec![(*message).to_owned()],
			Self::Permission => vec!["you do not have permission to do that".into()],
			Self::AlreadyAuthenticated => vec!["you are already logged in".into()],
			Self::Authentication => vec!["you need to log in first".into()],
			Self::Transport(..) => vec!["malformed request".into()],
			Self::Timeout => vec!["the request took too long".into()],
			Self::Upstream(..) => vec!["the identity provider could not be reached".into()],
			Self::RateLimited(..) => vec!["too many requests".into()],
			Self::Database(..) | Self::Hash(..) | Self::Io(..) | Self::Serialize(..) => {
				vec!["something went wrong".into()]
			}
		}
	}
}

impl From<store::Error> for Error {
	fn from(error: store::Error) -> Self {
		match error {
			store::Error::NotFound { entity, id } => Self::NotFound { entity, id },
			store::Error::Validation(errors) => Self::Validation(errors),
			store::Error::Constraint(message) => Self::Constraint(message),
			store::Error::Database(error) => Self::Database(error),
		}
	}
}

macro_rules! transport_rejection {
	($($rejection:ty),* $(,)?) => {
		$(
			impl From<$rejection> for Error {
				fn from(rejection: $rejection) -> Self {
					Self::Transport(rejection.body_text())
				}
			}
		)*
	};
}

transport_rejection!(
	rejection::JsonRejection,
	rejection::FormRejection,
	rejection::QueryRejection,
	rejection::PathRejection,
	MultipartRejection,
	MultipartError,
);

impl From<axum_jsonschema::JsonSchemaRejection> for Error {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		let status = rejection.into_response().status();

		Self::Transport(format!("json body rejected with {status}"))
	}
}

impl From<reqwest::Error> for Error {
	fn from(error: reqwest::Error) -> Self {
		if error.is_timeout() {
			return Self::Timeout;
		}

		Self::Upstream(error.to_string())
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		let status = self.status();
		let kind = self.kind();

		if kind == ErrorKind::Internal {
			tracing::error!(error = %self, "request failed");
		} else {
			tracing::debug!(error = %self, "request rejected");
		}

		if let Self::AlreadyAuthenticated = self {
			return (StatusCode::SEE_OTHER, [(header::LOCATION, "/")]).into_response();
		}

		let mut response = (
			status,
			Json(ErrorResponse {
				success: false,
				errors: self.messages(),
			}),
		)
			.into_response();

		response.extensions_mut().insert(kind);
		response
	}
}

impl aide::OperationOutput for Error {
	type Inner = ErrorResponse;
}
