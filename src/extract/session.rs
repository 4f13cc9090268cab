use std::marker::PhantomData;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::request,
};
use uuid::Uuid;

use crate::{
	guard::{self, Grant},
	model::User,
	openapi::SECURITY_SCHEME_SESSION,
	session,
	store::Sessions,
	Error,
};

/// Extracts the session and related user from the request.
///
/// If there is no session cookie, or it does not belong to a live session,
/// an [`Error::Authentication`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
	pub id: Uuid,
	pub user: User,
}

/// The user making the request, if any.
#[derive(Debug, Clone)]
pub struct Principal(pub Option<User>);

/// A [`Session`] whose user holds the capability named by `G`.
///
/// Checked before the body is read, so a rejected request never reaches
/// the form pipeline or the store.
#[derive(Debug)]
pub struct Authorized<G> {
	pub session: Session,
	grant: PhantomData<G>,
}

/// Only lets through visitors that are not logged in.
///
/// Logged in users are sent back to the home page.
#[derive(Debug)]
pub struct Guest;

/// Resolved once per request and shared by every extractor that needs it.
#[derive(Clone)]
struct Resolved(Option<Session>);

async fn resolve<S>(parts: &mut request::Parts, state: &S) -> Result<Option<Session>, Error>
where
	Sessions: FromRef<S>,
{
	if let Some(Resolved(session)) = parts.extensions.get::<Resolved>() {
		return Ok(session.clone());
	}

	let session = match session::read_cookie(&parts.headers, session::COOKIE_NAME)
		.and_then(|value| Uuid::parse_str(&value).ok())
	{
		Some(id) => Sessions::from_ref(state)
			.find_user(id)
			.await?
			.map(|user| Session { id, user }),
		None => None,
	};

	parts.extensions.insert(Resolved(session.clone()));
	Ok(session)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Sessions: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		resolve(parts, state).await?.ok_or(Error::Authentication)
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
	Sessions: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(Self(resolve(parts, state).await?.map(|session| session.user)))
	}
}

#[axum::async_trait]
impl<G, S> FromRequestParts<S> for Authorized<G>
where
	G: Grant,
	Sessions: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session = Session::from_request_parts(parts, state).await?;

		guard::require(&session.user, G::CAPABILITY)?;

		Ok(Self {
			session,
			grant: PhantomData,
		})
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Guest
where
	Sessions: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		match resolve(parts, state).await? {
			Some(..) => Err(Error::AlreadyAuthenticated),
			None => Ok(Self),
		}
	}
}

fn require_session(operation: &mut aide::openapi::Operation) {
	operation.security.push(
		[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
			.into_iter()
			.collect(),
	);
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		require_session(operation);
	}
}

impl<G> OperationInput for Authorized<G> {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		require_session(operation);
	}
}

impl OperationInput for Principal {}
