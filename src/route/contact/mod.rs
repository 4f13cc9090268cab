use axum::{
	routing::{delete, get, post},
	Router,
};

use crate::{ratelimit::Limit, AppState};

pub mod model;
pub mod route;

pub fn routes(limit: Option<&Limit>) -> Router<AppState> {
	Router::new()
		.route(
			"/contact",
			get(route::index).merge(crate::ratelimit::limit(post(route::submit), limit)),
		)
		.route("/contact/delete/:id", delete(route::delete))
}
