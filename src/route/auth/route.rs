use std::sync::Arc;

use argon2::Argon2;
use axum::{
	body::Body,
	extract::State,
	http::{header, HeaderMap, Response, StatusCode},
	response::{AppendHeaders, IntoResponse, Redirect},
};
use uuid::Uuid;

use crate::{
	config::Config,
	extract::{Form, Guest, Query, Session},
	form::Submission,
	model::{CreateUserInput, Permission},
	oauth::Identity,
	render::{Layout, Page, View},
	session,
	store::{self, Sessions, Users},
	Error,
};

use super::{find_or_create, hash_password, model, verify_password};

const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

/// Sets the session cookie and sends the browser home.
fn signed_in(session_id: Uuid, config: &Config) -> Response<Body> {
	let cookie = session::create_cookie(session_id, config.app.cookie_secure);

	(
		AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
		Redirect::to("/"),
	)
		.into_response()
}

fn login_page<F>(form: F) -> Page<(), F> {
	Page::new("login", "Log in", ())
		.layout(Layout::Auth)
		.form(form)
}

fn register_page<F>(form: F) -> Page<(), F> {
	Page::new("register", "Register", ())
		.layout(Layout::Auth)
		.form(form)
}

pub async fn login_form(_guest: Guest, view: View) -> Result<Response<Body>, Error> {
	view.render(login_page(Submission::blank(model::LoginForm::default())))
}

/// Checks an email and password, opening a session when they match.
pub async fn login(
	_guest: Guest,
	State(config): State<Arc<Config>>,
	State(users): State<Users>,
	State(sessions): State<Sessions>,
	State(hasher): State<Argon2<'static>>,
	view: View,
	Form(mut submission): Form<model::LoginForm>,
) -> Result<Response<Body>, Error> {
	if submission.has_errors() {
		return view.render(login_page(submission).status(StatusCode::UNPROCESSABLE_ENTITY));
	}

	let user = match users
		.find_by_email(&submission.values.email.trim().to_lowercase())
		.await?
	{
		Some(user) if verify_password(&hasher, &submission.values.password, &user.password)? => {
			user
		}
		_ => {
			tracing::info!("failed login attempt");

			submission.set_field_error("email", INVALID_CREDENTIALS);
			submission.set_field_error("password", INVALID_CREDENTIALS);

			return view.render(login_page(submission).status(StatusCode::UNPROCESSABLE_ENTITY));
		}
	};

	let session_id = sessions.create(user.id).await?;

	tracing::info!(user = user.id, "logged in");

	Ok(signed_in(session_id, &config))
}

pub async fn register_form(_guest: Guest, view: View) -> Result<Response<Body>, Error> {
	view.render(register_page(Submission::blank(model::RegisterForm::default())))
}

/// Creates a viewer account and logs it in.
pub async fn register(
	_guest: Guest,
	State(config): State<Arc<Config>>,
	State(users): State<Users>,
	State(sessions): State<Sessions>,
	State(hasher): State<Argon2<'static>>,
	view: View,
	Form(mut submission): Form<model::RegisterForm>,
) -> Result<Response<Body>, Error> {
	submission.verify(
		"password_confirmation",
		"Passwords do not match.",
		|values| values.password == values.password_confirmation,
	);

	if submission.has_errors() {
		return view.render(register_page(submission).status(StatusCode::UNPROCESSABLE_ENTITY));
	}

	let input = CreateUserInput {
		name: submission.values.name.trim().to_owned(),
		email: submission.values.email.trim().to_lowercase(),
		permission: Permission::Viewer,
	};
	let hash = hash_password(&hasher, &submission.values.password)?;

	let user = match users.create(input, hash).await {
		Ok(user) => user,
		Err(store::Error::Constraint(..)) => {
			submission.set_field_error("email", "This email address is already registered.");

			return view.render(register_page(submission).status(StatusCode::UNPROCESSABLE_ENTITY));
		}
		Err(error) => return Err(error.into()),
	};

	let session_id = sessions.create(user.id).await?;

	tracing::info!(user = user.id, "registered");

	Ok(signed_in(session_id, &config))
}

/// Ends the current session.
pub async fn logout(
	State(sessions): State<Sessions>,
	session: Session,
) -> Result<Response<Body>, Error> {
	sessions.delete(session.id).await?;

	tracing::info!(user = session.user.id, "logged out");

	Ok((
		AppendHeaders([(header::SET_COOKIE, session::clear_cookie().to_string())]),
		Redirect::to("/"),
	)
		.into_response())
}

/// Sends the browser to the identity provider.
pub async fn google_login(
	_guest: Guest,
	State(config): State<Arc<Config>>,
	State(identity): State<Identity>,
) -> Response<Body> {
	let state = Uuid::new_v4().simple().to_string();
	let cookie = session::create_state_cookie(&state, config.app.cookie_secure);

	(
		AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
		Redirect::to(identity.authorize_url(&state).as_str()),
	)
		.into_response()
}

/// Finishes a login started by [`google_login`].
pub async fn google_callback(
	State(config): State<Arc<Config>>,
	State(identity): State<Identity>,
	State(users): State<Users>,
	State(sessions): State<Sessions>,
	State(hasher): State<Argon2<'static>>,
	headers: HeaderMap,
	Query(callback): Query<model::CallbackQuery>,
) -> Result<Response<Body>, Error> {
	let expected = session::read_cookie(&headers, session::OAUTH_STATE_COOKIE_NAME);

	if expected.is_none() || expected != callback.state {
		tracing::warn!("oauth state mismatch");
		return Err(Error::Authentication);
	}

	if let Some(error) = callback.error {
		tracing::info!(%error, "identity provider refused the login");
		return Err(Error::Authentication);
	}

	let code = callback
		.code
		.filter(|code| !code.is_empty())
		.ok_or_else(|| Error::Transport("missing authorization code".into()))?;

	let token = identity.exchange(&code).await?;
	let profile = identity.profile(&token).await?;
	let user = find_or_create(&users, &hasher, profile).await?;
	let session_id = sessions.create(user.id).await?;

	tracing::info!(user = user.id, "logged in with google");

	let cookie = session::create_cookie(session_id, config.app.cookie_secure);

	Ok((
		AppendHeaders([
			(header::SET_COOKIE, cookie.to_string()),
			(header::SET_COOKIE, session::clear_state_cookie().to_string()),
		]),
		Redirect::to("/"),
	)
		.into_response())
}
