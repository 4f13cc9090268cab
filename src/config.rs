use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use crate::pager::DEFAULT_ITEMS_PER_PAGE;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} must be set")]
	Missing { name: &'static str },
	#[error("{name} has an invalid value: {value:?}")]
	Invalid { name: &'static str, value: String },
}

/// The environment the application runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
	#[default]
	Local,
	Test,
	Development,
	Staging,
	Qa,
	Production,
}

impl FromStr for Environment {
	type Err = ();

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Ok(match value.to_ascii_lowercase().as_str() {
			"local" => Self::Local,
			"test" => Self::Test,
			"dev" | "development" => Self::Development,
			"staging" => Self::Staging,
			"qa" => Self::Qa,
			"prod" | "production" => Self::Production,
			_ => return Err(()),
		})
	}
}

impl fmt::Display for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Local => "local",
			Self::Test => "test",
			Self::Development => "dev",
			Self::Staging => "staging",
			Self::Qa => "qa",
			Self::Production => "prod",
		})
	}
}

#[derive(Debug, Clone)]
pub struct Http {
	pub host: String,
	pub port: u16,
	/// Upper bound on the time spent handling one request, including calls
	/// made to the identity provider.
	pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct App {
	pub name: String,
	pub environment: Environment,
	pub page_size: i64,
	/// Whether cookies are only sent over HTTPS.
	pub cookie_secure: bool,
	pub rate_limit: bool,
}

#[derive(Debug, Clone)]
pub struct Database {
	pub url: String,
	pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Storage {
	/// Directory served under `prefix`; uploads land in its `uploads` child.
	pub directory: PathBuf,
	pub prefix: String,
	pub max_age: Duration,
	pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct Google {
	pub client_id: String,
	pub client_secret: String,
	pub redirect_url: String,
}

#[derive(Debug, Clone)]
pub struct Telemetry {
	pub otel: bool,
}

/// The application configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
	pub http: Http,
	pub app: App,
	pub database: Database,
	pub storage: Storage,
	pub google: Google,
	pub telemetry: Telemetry,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			http: Http {
				host: "127.0.0.1".into(),
				port: 3000,
				timeout: Duration::from_secs(20),
			},
			app: App {
				name: "Penstock".into(),
				environment: Environment::Local,
				page_size: DEFAULT_ITEMS_PER_PAGE,
				cookie_secure: false,
				rate_limit: true,
			},
			database: Database {
				url: String::new(),
				max_connections: 10,
			},
			storage: Storage {
				directory: PathBuf::from("static"),
				prefix: "/files".into(),
				max_age: Duration::from_secs(60 * 60 * 24 * 30),
				max_upload_bytes: 10 * 1024 * 1024,
			},
			google: Google {
				client_id: String::new(),
				client_secret: String::new(),
				redirect_url: "http://localhost:3000/api/v1/google/callback".into(),
			},
			telemetry: Telemetry { otel: false },
		}
	}
}

/// Reads `name` through `lookup` and parses it, keeping `default` when unset.
fn parse<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, Error>
where
	T: FromStr,
	F: Fn(&str) -> Option<String>,
{
	match lookup(name) {
		Some(value) => value.trim().parse().map_err(|_| Error::Invalid { name, value }),
		None => Ok(default),
	}
}

fn flag<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, Error>
where
	F: Fn(&str) -> Option<String>,
{
	match lookup(name) {
		Some(value) => match value.trim().to_ascii_lowercase().as_str() {
			"1" | "true" | "yes" | "on" => Ok(true),
			"0" | "false" | "no" | "off" => Ok(false),
			_ => Err(Error::Invalid { name, value }),
		},
		None => Ok(default),
	}
}

impl Config {
	/// Builds the configuration from the process environment.
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds the configuration from an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
	where
		F: Fn(&str) -> Option<String>,
	{
		let defaults = Self::default();
		let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

		let environment = match lookup("APP_ENV") {
			Some(value) => value.parse().map_err(|()| Error::Invalid {
				name: "APP_ENV",
				value,
			})?,
			None => defaults.app.environment,
		};

		let page_size = parse(&lookup, "APP_PAGE_SIZE", defaults.app.page_size)?;

		if page_size < 1 {
			return Err(Error::Invalid {
				name: "APP_PAGE_SIZE",
				value: page_size.to_string(),
			});
		}

		Ok(Self {
			http: Http {
				host: lookup("HOST").unwrap_or(defaults.http.host),
				port: parse(&lookup, "PORT", defaults.http.port)?,
				timeout: Duration::from_secs(parse(
					&lookup,
					"APP_TIMEOUT_SECS",
					defaults.http.timeout.as_secs(),
				)?),
			},
			app: App {
				name: lookup("APP_NAME").unwrap_or(defaults.app.name),
				environment,
				page_size,
				cookie_secure: flag(
					&lookup,
					"COOKIE_SECURE",
					environment == Environment::Production,
				)?,
				rate_limit: flag(&lookup, "RATE_LIMIT", defaults.app.rate_limit)?,
			},
			database: Database {
				url: lookup("DATABASE_URL").ok_or(Error::Missing {
					name: "DATABASE_URL",
				})?,
				max_connections: parse(
					&lookup,
					"DATABASE_MAX_CONNECTIONS",
					defaults.database.max_connections,
				)?,
			},
			storage: Storage {
				directory: lookup("STATIC_DIR").map_or(defaults.storage.directory, PathBuf::from),
				prefix: lookup("STATIC_PREFIX").unwrap_or(defaults.storage.prefix),
				max_age: Duration::from_secs(parse(
					&lookup,
					"STATIC_MAX_AGE_SECS",
					defaults.storage.max_age.as_secs(),
				)?),
				max_upload_bytes: parse(
					&lookup,
					"UPLOAD_MAX_BYTES",
					defaults.storage.max_upload_bytes,
				)?,
			},
			google: Google {
				client_id: lookup("GOOGLE_CLIENT_ID").unwrap_or_default(),
				client_secret: lookup("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
				redirect_url: lookup("GOOGLE_REDIRECT_URL").unwrap_or(defaults.google.redirect_url),
			},
			telemetry: Telemetry {
				otel: flag(&lookup, "OTEL_ENABLED", defaults.telemetry.otel)?,
			},
		})
	}
}
