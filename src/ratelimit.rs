use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
	routing::MethodRouter,
};
use governor::middleware::StateInformationMiddleware;
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::PeerIpKeyExtractor,
	GovernorError, GovernorLayer,
};

use crate::AppState;

/// A per-client-address request quota.
pub type Limit = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// The quota applied to every request.
pub fn default() -> Option<Limit> {
	GovernorConfigBuilder::default()
		.per_second(10)
		.burst_size(50)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

/// The quota applied to credential checks and anonymous submissions.
pub fn secure() -> Option<Limit> {
	GovernorConfigBuilder::default()
		.per_second(1)
		.burst_size(5)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	crate::Error::from(error).into_response()
}

/// Puts `route` behind `limit`, if there is one.
pub fn limit(route: MethodRouter<AppState>, limit: Option<&Limit>) -> MethodRouter<AppState> {
	match limit {
		Some(config) => route.layer(GovernorLayer {
			config: config.clone(),
		}),
		None => route,
	}
}

/// Periodically forgets clients that have not been seen for a while.
pub fn cleanup_old_limits(limits: &[&Limit]) {
	let limiters = limits
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}
