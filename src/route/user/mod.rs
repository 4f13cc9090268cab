use axum::{
	routing::{get, put},
	Router,
};

use crate::AppState;

pub mod model;
pub mod route;

pub fn routes() -> Router<AppState> {
	Router::new()
		.route("/users", get(route::index))
		.route("/users/update/:id", put(route::update))
}
