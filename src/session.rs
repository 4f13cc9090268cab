use axum::http::{header, HeaderMap};
use cookie::{Cookie, SameSite};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";
pub const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

/// Creates a session cookie with no expiry
pub fn create_cookie(session_id: Uuid, secure: bool) -> Cookie<'static> {
	Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(secure)
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> Cookie<'static> {
	Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// Creates the cookie that binds an OAuth flow to the browser that started it.
pub fn create_state_cookie(state: &str, secure: bool) -> Cookie<'static> {
	Cookie::build((OAUTH_STATE_COOKIE_NAME, state.to_owned()))
		.secure(secure)
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.max_age(cookie::time::Duration::minutes(10))
		.into()
}

pub fn clear_state_cookie() -> Cookie<'static> {
	Cookie::build(OAUTH_STATE_COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// Reads the value of the cookie named `name` from the request headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
	headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == name)
		.map(|cookie| cookie.value().to_owned())
}

#[cfg(test)]
mod test {
	use axum::http::HeaderValue;

	use super::*;

	#[test]
	fn test_read_cookie() {
		let mut headers = HeaderMap::new();

		headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; session=abc"));
		headers.append(header::COOKIE, HeaderValue::from_static("oauth_state=xyz"));

		assert_eq!(read_cookie(&headers, COOKIE_NAME).as_deref(), Some("abc"));
		assert_eq!(
			read_cookie(&headers, OAUTH_STATE_COOKIE_NAME).as_deref(),
			Some("xyz")
		);
		assert_eq!(read_cookie(&headers, "missing"), None);
	}

	#[test]
	fn test_session_cookie_attributes() {
		let id = Uuid::new_v4();
		let cookie = create_cookie(id, true);

		assert_eq!(cookie.value(), id.to_string());
		assert_eq!(cookie.secure(), Some(true));
		assert_eq!(cookie.http_only(), Some(true));
		assert_eq!(cookie.path(), Some("/"));

		let cleared = clear_cookie();

		assert_eq!(cleared.max_age(), Some(cookie::time::Duration::ZERO));
	}
}
