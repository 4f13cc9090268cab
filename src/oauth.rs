use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::{config, Error};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const SCOPES: &str =
	"https://www.googleapis.com/auth/userinfo.profile https://www.googleapis.com/auth/userinfo.email";

pub type Identity = Arc<dyn IdentityProvider>;

/// The part of the provider's user profile the application cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
	pub id: String,
	pub email: String,
	#[serde(default)]
	pub name: String,
}

/// An OAuth2 authorization-code identity provider.
#[axum::async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Where to send the browser to start a login, carrying `state` along.
	fn authorize_url(&self, state: &str) -> Url;
	/// Trades an authorization code for an access token.
	async fn exchange(&self, code: &str) -> Result<String, Error>;
	async fn profile(&self, access_token: &str) -> Result<Profile, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
	#[error("invalid endpoint: {0}")]
	Endpoint(#[from] url::ParseError),
	#[error("failed to build http client: {0}")]
	Client(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
}

/// Google sign-in.
pub struct GoogleProvider {
	client: reqwest::Client,
	auth_url: Url,
	config: config::Google,
}

impl GoogleProvider {
	pub fn new(config: config::Google, timeout: Duration) -> Result<Self, SetupError> {
		Ok(Self {
			client: reqwest::Client::builder().timeout(timeout).build()?,
			auth_url: Url::parse(AUTH_URL)?,
			config,
		})
	}
}

#[axum::async_trait]
impl IdentityProvider for GoogleProvider {
	fn authorize_url(&self, state: &str) -> Url {
		let mut url = self.auth_url.clone();

		url.query_pairs_mut()
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", &self.config.redirect_url)
			.append_pair("response_type", "code")
			.append_pair("scope", SCOPES)
			.append_pair("access_type", "offline")
			.append_pair("prompt", "consent")
			.append_pair("state", state);

		url
	}

	#[tracing::instrument(skip_all, err)]
	async fn exchange(&self, code: &str) -> Result<String, Error> {
		let body = url::form_urlencoded::Serializer::new(String::new())
			.append_pair("code", code)
			.append_pair("client_id", &self.config.client_id)
			.append_pair("client_secret", &self.config.client_secret)
			.append_pair("redirect_uri", &self.config.redirect_url)
			.append_pair("grant_type", "authorization_code")
			.finish();

		let token = self
			.client
			.post(TOKEN_URL)
			.header(
				reqwest::header::CONTENT_TYPE,
				"application/x-www-form-urlencoded",
			)
			.body(body)
			.send()
			.await?
			.error_for_status()?
			.json::<TokenResponse>()
			.await?;

		Ok(token.access_token)
	}

	#[tracing::instrument(skip_all, err)]
	async fn profile(&self, access_token: &str) -> Result<Profile, Error> {
		let profile = self
			.client
			.get(USERINFO_URL)
			.bearer_auth(access_token)
			.send()
			.await?
			.error_for_status()?
			.json::<Profile>()
			.await?;

		if profile.email.is_empty() {
			return Err(Error::Upstream("profile has no email address".into()));
		}

		Ok(profile)
	}
}
