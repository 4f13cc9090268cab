mod session;

pub use session::{Authorized, Guest, Principal, Session};

use aide::{
	gen::GenContext,
	openapi::{self, Operation},
	OperationIo, OperationOutput,
};
use axum::{
	body::Body,
	extract::{FromRequest, FromRequestParts, Request},
	http::{header, request, Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::de;

use crate::{form::Submission, Error};

/// Extractor that deserializes a JSON body and validates it.
///
/// T must implement [`serde::de::DeserializeOwned`] and [`validator::Validate`]
/// in order to be used in an extractor.
///
/// ```rust
/// async fn route(Json(post): Json<CreatePostInput>) {
///   // ...
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
	T: serde::Serialize,
{
	fn into_response(self) -> Response<Body> {
		axum::extract::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: de::DeserializeOwned + validator::Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let result = axum_jsonschema::Json::<T>::from_request(req, state)
			.await?
			.0;

		result.validate()?;
		Ok(Self(result))
	}
}

/// A JSON body sent back with `201 Created`.
pub struct Created<T>(pub T);

impl<T> IntoResponse for Created<T>
where
	T: serde::Serialize,
{
	fn into_response(self) -> Response<Body> {
		(StatusCode::CREATED, axum::extract::Json(self.0)).into_response()
	}
}

impl<T> OperationOutput for Created<T>
where
	T: JsonSchema + serde::Serialize,
{
	type Inner = T;

	fn operation_response(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Option<openapi::Response> {
		axum_jsonschema::Json::<T>::operation_response(ctx, operation)
	}

	fn inferred_responses(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Vec<(Option<u16>, openapi::Response)> {
		Self::operation_response(ctx, operation)
			.map(|response| vec![(Some(201), response)])
			.unwrap_or_default()
	}
}

/// Extractor that deserializes a query string and validates it.
///
/// This is similar to [`Json<T>`], but does not consume the body.
///
/// ```rust
/// async fn route(Query(params): Query<PageQuery>) {
///   // ...
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum::extract::Query<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Query<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Query::<T>::from_request_parts(parts, state)
			.await?
			.0;

		result.validate()?;
		Ok(Self(result))
	}
}

/// Extractor that deserializes a path parameter and validates it.
#[derive(OperationIo)]
#[aide(
	input_with = "axum::extract::Path<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: de::DeserializeOwned + validator::Validate + Send,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Path::<T>::from_request_parts(parts, state)
			.await?
			.0;

		result.validate()?;
		Ok(Self(result))
	}
}

/// Extractor that binds a urlencoded form body and runs its validation rules.
///
/// Unlike [`Json<T>`], failing rules do not reject the request: they are
/// collected in the [`Submission`] so the form can be shown again. Only a
/// body that cannot be bound at all is rejected.
///
/// ```rust
/// async fn route(Form(submission): Form<PostForm>) {
///   if submission.has_errors() {
///     // ...
///   }
/// }
/// ```
pub struct Form<T>(pub Submission<T>);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Form<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum::extract::Form(values) = axum::extract::Form::<T>::from_request(req, state).await?;

		Ok(Self(Submission::new(values)))
	}
}

/// The representation a client asked for through its `Accept` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
	#[default]
	Html,
	Json,
}

impl Format {
	pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
		let wants_json = headers
			.get_all(header::ACCEPT)
			.into_iter()
			.filter_map(|value| value.to_str().ok())
			.any(|value| value.contains("application/json"));

		if wants_json {
			Self::Json
		} else {
			Self::Html
		}
	}
}

#[cfg(test)]
mod test {
	use axum::http::{HeaderMap, HeaderValue};

	use super::*;

	#[test]
	fn test_format_negotiation() {
		let mut headers = HeaderMap::new();

		assert_eq!(Format::from_headers(&headers), Format::Html);

		headers.insert(header::ACCEPT, HeaderValue::from_static("text/html,*/*"));

		assert_eq!(Format::from_headers(&headers), Format::Html);

		headers.insert(
			header::ACCEPT,
			HeaderValue::from_static("application/json, text/plain"),
		);

		assert_eq!(Format::from_headers(&headers), Format::Json);
	}
}
