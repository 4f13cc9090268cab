#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod form;
mod guard;
mod model;
mod oauth;
mod openapi;
mod pager;
mod ratelimit;
mod render;
mod route;
mod session;
mod store;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use argon2::Argon2;
use axum::{extract::Request, ServiceExt};
use sqlx::postgres::PgPoolOptions;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;

use config::Config;
pub use error::Error;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// Every gateway is held behind a trait object, so routes can be exercised
/// against the in-memory store in tests.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub config: Arc<Config>,
	pub posts: store::Posts,
	pub users: store::Users,
	pub contacts: store::Contacts,
	pub sessions: store::Sessions,
	pub identity: oauth::Identity,
	pub hasher: Argon2<'static>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	let config = Arc::new(Config::from_env()?);
	let _guard = trace::init_tracing_subscriber(&config)?;

	let database = PgPoolOptions::new()
		.max_connections(config.database.max_connections)
		.connect(&config.database.url)
		.await?;

	sqlx::migrate!().run(&database).await?;

	let store = Arc::new(store::PgStore::new(database));
	let identity = oauth::GoogleProvider::new(config.google.clone(), config.http.timeout)?;

	let state = State {
		config: config.clone(),
		posts: store.clone(),
		users: store.clone(),
		contacts: store.clone(),
		sessions: store,
		identity: Arc::new(identity),
		hasher: Argon2::default(),
	};

	// Trailing slashes are trimmed before routing, so it wraps the router.
	let app = NormalizePathLayer::trim_trailing_slash().layer(route::app(state));

	let listener = tokio::net::TcpListener::bind((config.http.host.as_str(), config.http.port)).await?;

	tracing::info!(
		environment = %config.app.environment,
		"listening on {}",
		listener.local_addr()?
	);

	axum::serve(
		listener,
		ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
	}

	tracing::info!("shutting down");
}
