use std::{sync::Arc, time::Duration};

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{
	body::Body,
	extract::{self, Request},
	http::{header, HeaderValue, Response},
	middleware::{self, Next},
	response::IntoResponse,
	routing::get,
	Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	services::{fs::ServeFileSystemResponseBody, ServeDir},
	set_header::SetResponseHeaderLayer,
	trace::TraceLayer,
};
use tower_governor::GovernorLayer;

use crate::{config::Config, openapi, ratelimit, render, Error, State};

pub mod auth;
pub mod contact;
pub mod docs;
pub mod home;
pub mod model;
pub mod post;
pub mod user;

/// The pages a browser navigates, with error responses turned into pages.
fn pages(config: &Arc<Config>, limit: Option<&ratelimit::Limit>) -> Router<State> {
	Router::new()
		.route("/", get(home::index))
		.merge(post::pages(config))
		.merge(user::routes())
		.merge(contact::routes(limit))
		.merge(auth::routes(limit))
		.layer(middleware::from_fn_with_state(
			config.clone(),
			render::error_pages,
		))
}

/// Serves the static directory, uploads included.
fn files(config: &Config) -> Router<State> {
	let cache_control = format!("public, max-age={}", config.storage.max_age.as_secs());

	Router::new().nest_service(
		&config.storage.prefix,
		ServiceBuilder::new()
			.layer(SetResponseHeaderLayer::overriding(
				header::CACHE_CONTROL,
				move |_: &Response<ServeFileSystemResponseBody>| {
					HeaderValue::from_str(&cache_control).ok()
				},
			))
			.service(ServeDir::new(&config.storage.directory)),
	)
}

/// Answers with [`Error::Timeout`] when the inner service runs past `limit`.
async fn timeout(
	extract::State(limit): extract::State<Duration>,
	request: Request,
	next: Next,
) -> Response<Body> {
	match tokio::time::timeout(limit, next.run(request)).await {
		Ok(response) => response,
		Err(_) => {
			tracing::warn!(?limit, "request timed out");
			Error::Timeout.into_response()
		}
	}
}

/// Builds the whole application around `state`.
pub fn app(state: State) -> Router {
	let config = state.config.clone();
	let mut api = OpenApi::default();

	let (global, secure) = if config.app.rate_limit {
		(ratelimit::default(), ratelimit::secure())
	} else {
		(None, None)
	};

	let limits = global.iter().chain(secure.iter()).collect::<Vec<_>>();

	if !limits.is_empty() {
		ratelimit::cleanup_old_limits(&limits);
	}

	let router = ApiRouter::new()
		.nest("/api/v1/posts", post::routes())
		.finish_api_with(&mut api, openapi::docs)
		.merge(docs::routes())
		.merge(pages(&config, secure.as_ref()))
		.merge(files(&config))
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(CorsLayer::permissive())
				.layer(middleware::from_fn_with_state(config.http.timeout, timeout)),
		);

	let router = match global {
		Some(config) => router.layer(GovernorLayer { config }),
		None => router,
	};

	router.with_state(state)
}
