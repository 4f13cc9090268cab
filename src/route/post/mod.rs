use aide::axum::{routing::get_with, ApiRouter};
use axum::{
	extract::DefaultBodyLimit,
	routing::{delete, get, post},
	Router,
};

use crate::{config::Config, AppState};

pub mod model;
pub mod page;
pub mod route;

/// The documented JSON API, nested under `/api/v1/posts`.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
}

/// The browser pages for managing posts.
pub fn pages(config: &Config) -> Router<AppState> {
	Router::new()
		.route("/post/create", get(page::create_form).post(page::create))
		.route("/post/edit/:id", get(page::edit_form).put(page::update))
		.route("/post/delete/:id", delete(page::delete))
		.route(
			"/post/upload",
			post(page::upload).layer(DefaultBodyLimit::max(config.storage.max_upload_bytes)),
		)
}
