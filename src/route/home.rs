use std::sync::Arc;

use axum::{body::Body, extract::State, http::Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
	config::Config,
	extract::Query,
	model::Post,
	render::{truncate, Page, View},
	route::model::PageQuery,
	store::{Order, PostPredicate, Posts},
	Error,
};

const TITLE_LENGTH: usize = 30;
const BODY_LENGTH: usize = 80;

/// A post shortened for the front page.
#[derive(Debug, Serialize)]
pub struct PostCard {
	pub id: i64,
	pub title: String,
	pub body: String,
	pub author: String,
	pub created_at: DateTime<Utc>,
}

impl From<Post> for PostCard {
	fn from(post: Post) -> Self {
		Self {
			id: post.id,
			title: truncate(&post.title, TITLE_LENGTH),
			body: truncate(&post.body, BODY_LENGTH),
			author: post.author,
			created_at: post.created_at,
		}
	}
}

/// The front page: most recent posts first.
pub async fn index(
	State(config): State<Arc<Config>>,
	State(posts): State<Posts>,
	view: View,
	Query(query): Query<PageQuery>,
) -> Result<Response<Body>, Error> {
	let mut pager = query.pager(config.app.page_size);

	pager.set_items(posts.count(PostPredicate::default()).await?);

	let cards = posts
		.list(
			PostPredicate::default(),
			Order::Newest,
			pager.offset(),
			pager.limit(),
		)
		.await?
		.into_iter()
		.map(PostCard::from)
		.collect::<Vec<_>>();

	view.render(
		Page::new("home", "Home", cards)
			.pager(pager)
			.description("The latest posts.")
			.keywords(&["blog", "posts"]),
	)
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use crate::test::*;

	#[tokio::test]
	async fn test_home_lists_newest_first_and_truncates() {
		let app = TestApp::new();

		app.post_at("a".repeat(40).as_str(), "2024-01-01T00:00:00Z");
		app.post_at("second", "2024-01-02T00:00:00Z");

		let response = app.server.get("/").add_header(ACCEPT, accept_json()).await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let page = response.json::<serde_json::Value>();

		assert_eq!(page["name"], "home");
		assert_eq!(page["data"][0]["title"], "second");
		assert_eq!(page["data"][1]["title"], format!("{}...", "a".repeat(30)));
		assert_eq!(page["pager"]["items"], 2);
		assert!(page["principal"].is_null());
	}

	#[tokio::test]
	async fn test_home_renders_html_by_default() {
		let app = TestApp::new();
		let response = app.server.get("/").add_query_param("page", "nonsense").await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.text().contains("data-page=\"home\""));
	}

	#[tokio::test]
	async fn test_home_paginates() {
		let app = TestApp::new();

		for day in 1..=5 {
			app.post_at(&format!("post {day}"), &format!("2024-01-0{day}T00:00:00Z"));
		}

		let response = app
			.server
			.get("/")
			.add_query_param("page", 2)
			.add_header(ACCEPT, accept_json())
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let page = response.json::<serde_json::Value>();

		assert_eq!(page["pager"]["pages"], 2);
		assert_eq!(page["pager"]["is_beginning"], false);
		assert_eq!(page["pager"]["is_end"], true);
		assert_eq!(page["data"].as_array().map(Vec::len), Some(1));
		assert_eq!(page["data"][0]["title"], "post 1");
	}
}
