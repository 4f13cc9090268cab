use argon2::{
	password_hash::{self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
	Argon2,
};
use axum::{
	routing::{get, post},
	Router,
};

use crate::{
	model::{CreateUserInput, Permission, User},
	oauth::Profile,
	ratelimit::{self, Limit},
	store::{self, Users},
	AppState, Error,
};

pub mod model;
pub mod route;

pub fn routes(limit: Option<&Limit>) -> Router<AppState> {
	use route::*;

	Router::new()
		.route(
			"/user/login",
			get(login_form).merge(ratelimit::limit(post(login), limit)),
		)
		.route(
			"/user/register",
			get(register_form).merge(ratelimit::limit(post(register), limit)),
		)
		.route("/user/login_with_google", get(google_login))
		.route("/api/v1/google/callback", get(google_callback))
		.route("/logout", get(logout))
}

/// Hashes a password into a PHC string with a fresh random salt.
pub fn hash_password(hasher: &Argon2, password: &str) -> Result<String, Error> {
	let salt = SaltString::generate(&mut OsRng);

	Ok(hasher.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Checks a password against a stored PHC string.
pub fn verify_password(hasher: &Argon2, password: &str, hash: &str) -> Result<bool, Error> {
	let hash = PasswordHash::new(hash)?;

	match hasher.verify_password(password.as_bytes(), &hash) {
		Ok(()) => Ok(true),
		Err(password_hash::Error::Password) => Ok(false),
		Err(error) => Err(error.into()),
	}
}

/// Looks up the account behind a provider profile, creating a viewer
/// account on first sign-in.
pub async fn find_or_create(users: &Users, hasher: &Argon2<'_>, profile: Profile) -> Result<User, Error> {
	let email = profile.email.trim().to_lowercase();

	if let Some(user) = users.find_by_email(&email).await? {
		return Ok(user);
	}

	// Derived from public profile data, so it is a placeholder and not a secret.
	let hash = hash_password(hasher, &format!("{}{}", profile.id, email))?;
	let name = match profile.name.trim() {
		"" => email.clone(),
		name => name.to_owned(),
	};

	let input = CreateUserInput {
		name,
		email: email.clone(),
		permission: Permission::Viewer,
	};

	match users.create(input, hash).await {
		Ok(user) => {
			tracing::info!(user = user.id, "created account from identity provider");
			Ok(user)
		}
		// A concurrent callback for the same profile won the insert.
		Err(store::Error::Constraint(..)) => users
			.find_by_email(&email)
			.await?
			.ok_or(Error::Authentication),
		Err(error) => Err(error.into()),
	}
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use super::*;
	use crate::test::*;

	fn credentials<'a>(email: &'a str, password: &'a str) -> [(&'static str, &'a str); 2] {
		[("email", email), ("password", password)]
	}

	fn session_cookie(response: &axum_test::TestResponse) -> String {
		response
			.headers()
			.get_all(SET_COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.find(|value| value.starts_with("session="))
			.map(|value| value.split(';').next().unwrap().to_owned())
			.unwrap()
	}

	#[test]
	fn test_password_round_trip() {
		let hasher = hasher();
		let hash = hash_password(&hasher, "correct horse").unwrap();

		assert!(hash.starts_with("$argon2id$"));
		assert!(verify_password(&hasher, "correct horse", &hash).unwrap());
		assert!(!verify_password(&hasher, "battery staple", &hash).unwrap());
		assert!(verify_password(&hasher, "anything", "not a phc string").is_err());
	}

	#[tokio::test]
	async fn test_login_opens_a_session() {
		let app = TestApp::new();

		app.user("editor@example.com", Permission::Editor).await;

		let response = app
			.server
			.post("/user/login")
			.form(&credentials("Editor@Example.com", "hunter2"))
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header(LOCATION), "/");
		assert_eq!(app.store.session_count(), 1);

		let cookie = session_cookie(&response);
		let response = app
			.server
			.get("/")
			.add_header(ACCEPT, accept_json())
			.add_header(COOKIE, cookie.parse().unwrap())
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let page = response.json::<Value>();

		assert_eq!(page["principal"]["email"], "editor@example.com");
	}

	#[tokio::test]
	async fn test_login_failure_marks_both_fields() {
		let app = TestApp::new();

		app.user("editor@example.com", Permission::Editor).await;

		for (email, password) in [
			("editor@example.com", "wrong"),
			("nobody@example.com", "hunter2"),
		] {
			let response = app
				.server
				.post("/user/login")
				.add_header(ACCEPT, accept_json())
				.form(&credentials(email, password))
				.await;

			assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

			let page = response.json::<Value>();

			assert_eq!(
				page["form"]["errors"]["email"][0],
				"Invalid credentials. Please try again."
			);
			assert_eq!(
				page["form"]["errors"]["password"][0],
				"Invalid credentials. Please try again."
			);
			assert_eq!(page["form"]["values"]["email"], email);
			assert!(page["form"]["values"].get("password").is_none());
		}

		assert_eq!(app.store.session_count(), 0);
	}

	#[tokio::test]
	async fn test_logged_in_users_skip_guest_pages() {
		let app = TestApp::new();
		let (_, cookie) = app.login(Permission::Viewer).await;

		for path in ["/user/login", "/user/register", "/user/login_with_google"] {
			let response = app.server.get(path).add_header(COOKIE, cookie.clone()).await;

			assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
			assert_eq!(response.header(LOCATION), "/");
		}
	}

	#[tokio::test]
	async fn test_register_creates_a_viewer() {
		let app = TestApp::new();

		let response = app
			.server
			.post("/user/register")
			.form(&[
				("name", "Jane"),
				("email", "Jane@Example.com"),
				("password", "long enough"),
				("password_confirmation", "long enough"),
			])
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert!(session_cookie(&response).starts_with("session="));

		let users = app.store.users();

		assert_eq!(users.len(), 1);
		assert_eq!(users[0].email, "jane@example.com");
		assert_eq!(users[0].permission, Permission::Viewer);
		assert!(verify_password(&hasher(), "long enough", &users[0].password).unwrap());
	}

	#[tokio::test]
	async fn test_register_rejects_mismatch_and_duplicates() {
		let app = TestApp::new();

		let response = app
			.server
			.post("/user/register")
			.add_header(ACCEPT, accept_json())
			.form(&[
				("name", "Jane"),
				("email", "jane@example.com"),
				("password", "long enough"),
				("password_confirmation", "different"),
			])
			.await;

		assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(
			response.json::<Value>()["form"]["errors"]["password_confirmation"][0],
			"Passwords do not match."
		);

		app.user("jane@example.com", Permission::Viewer).await;

		let response = app
			.server
			.post("/user/register")
			.add_header(ACCEPT, accept_json())
			.form(&[
				("name", "Jane"),
				("email", "jane@example.com"),
				("password", "long enough"),
				("password_confirmation", "long enough"),
			])
			.await;

		assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
		assert!(response.json::<Value>()["form"]["errors"]["email"].is_array());
		assert_eq!(app.store.users().len(), 1);
		assert_eq!(app.store.session_count(), 0);
	}

	#[tokio::test]
	async fn test_logout_ends_the_session() {
		let app = TestApp::new();
		let (_, cookie) = app.login(Permission::Editor).await;

		let response = app.server.get("/logout").add_header(COOKIE, cookie).await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header(LOCATION), "/");
		assert!(response
			.header(SET_COOKIE)
			.to_str()
			.unwrap()
			.contains("Max-Age=0"));
		assert_eq!(app.store.session_count(), 0);

		let response = app.server.get("/logout").await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header(LOCATION), "/user/login");
	}

	/// Starts a flow and returns the state the provider would echo back.
	async fn start_flow(app: &TestApp) -> String {
		let response = app.server.get("/user/login_with_google").await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

		let location = url::Url::parse(response.header(LOCATION).to_str().unwrap()).unwrap();

		location
			.query_pairs()
			.find(|(key, _)| key == "state")
			.map(|(_, value)| value.into_owned())
			.unwrap()
	}

	#[tokio::test]
	async fn test_google_login_creates_one_account() {
		let app = TestApp::new();

		for _ in 0..2 {
			let state = start_flow(&app).await;

			let response = app
				.server
				.get("/api/v1/google/callback")
				.add_query_param("code", "abc")
				.add_query_param("state", &state)
				.add_header(COOKIE, format!("oauth_state={state}").parse().unwrap())
				.await;

			assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
			assert_eq!(response.header(LOCATION), "/");
			assert!(session_cookie(&response).starts_with("session="));
		}

		let users = app.store.users();

		assert_eq!(users.len(), 1);
		assert_eq!(users[0].email, "jane@example.com");
		assert_eq!(users[0].name, "Jane");
		assert_eq!(users[0].permission, Permission::Viewer);
		assert_eq!(app.store.session_count(), 2);
	}

	#[tokio::test]
	async fn test_google_login_reuses_existing_account() {
		let app = TestApp::new();
		let user = app.user("jane@example.com", Permission::Editor).await;
		let state = start_flow(&app).await;

		let response = app
			.server
			.get("/api/v1/google/callback")
			.add_query_param("code", "abc")
			.add_query_param("state", &state)
			.add_header(COOKIE, format!("oauth_state={state}").parse().unwrap())
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

		let users = app.store.users();

		assert_eq!(users.len(), 1);
		assert_eq!(users[0].id, user.id);
		assert_eq!(users[0].permission, Permission::Editor);
	}

	#[tokio::test]
	async fn test_google_callback_rejects_foreign_state() {
		let app = TestApp::new();
		let state = start_flow(&app).await;

		let response = app
			.server
			.get("/api/v1/google/callback")
			.add_query_param("code", "abc")
			.add_query_param("state", &state)
			.add_header(ACCEPT, accept_json())
			.add_header(COOKIE, "oauth_state=somebody-else".parse().unwrap())
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

		let response = app
			.server
			.get("/api/v1/google/callback")
			.add_query_param("code", "abc")
			.add_header(ACCEPT, accept_json())
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
		assert!(app.store.users().is_empty());
	}

	#[tokio::test]
	async fn test_google_callback_reports_provider_failure() {
		let app = TestApp::new();
		let state = start_flow(&app).await;

		*app.identity.fail.lock().unwrap() = true;

		let response = app
			.server
			.get("/api/v1/google/callback")
			.add_query_param("code", "abc")
			.add_query_param("state", &state)
			.add_header(ACCEPT, accept_json())
			.add_header(COOKIE, format!("oauth_state={state}").parse().unwrap())
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
		assert!(app.store.users().is_empty());
		assert_eq!(app.store.session_count(), 0);
	}
}
