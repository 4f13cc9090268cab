use std::sync::Arc;

use axum::extract::State;
use macros::route;

use crate::{
	config::Config,
	extract::{Authorized, Created, Json, Path, Query},
	guard::WritePosts,
	openapi::tag,
	route::model::IdInput,
	store::Posts,
	Error,
};

use super::model;

/// Get posts
/// Returns a paginated list of posts. With a `from` or `to` day the listing is
/// limited to posts created within those days, oldest first; otherwise the
/// newest posts come first.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(config): State<Arc<Config>>,
	State(posts): State<Posts>,
	Query(window): Query<model::PostWindow>,
) -> Result<Json<model::PostListing>, Error> {
	let predicate = window.predicate();
	let mut pager = crate::pager::Pager::new(window.page, config.app.page_size);

	pager.set_items(posts.count(predicate).await?);

	let posts = posts
		.list(predicate, window.order(), pager.offset(), pager.limit())
		.await?;

	Ok(Json(model::PostListing { posts, pager }))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(posts): State<Posts>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<model::Post>, Error> {
	Ok(Json(posts.get(id).await?))
}

/// Create post
/// Creates a new post written by the authenticated editor.
#[route(tag = tag::POST, response(status = 201, description = "The post was created.", shape = "Json<model::Post>"))]
pub async fn create_post(
	State(posts): State<Posts>,
	editor: Authorized<WritePosts>,
	Json(input): Json<model::CreatePostInput>,
) -> Result<Created<model::Post>, Error> {
	let input = model::CreatePostInput {
		title: input.title.trim().to_owned(),
		body: input.body.trim().to_owned(),
	};

	let post = posts.create(&editor.session.user.email, input).await?;

	tracing::info!(post = post.id, author = %post.author, "post created");

	Ok(Created(post))
}

/// Update post
/// Updates an existing post by its unique id. Fields left out are kept.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(posts): State<Posts>,
	_editor: Authorized<WritePosts>,
	Path(IdInput { id }): Path<IdInput>,
	Json(patch): Json<model::UpdatePostInput>,
) -> Result<Json<model::Post>, Error> {
	Ok(Json(posts.update(id, model::trim_patch(patch)).await?))
}

/// Delete post
/// Deletes an existing post by its unique id.
#[route(tag = tag::POST)]
pub async fn delete_post(
	State(posts): State<Posts>,
	_editor: Authorized<WritePosts>,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<(), Error> {
	posts.delete(id).await?;

	tracing::info!(post = id, "post deleted");

	Ok(())
}
