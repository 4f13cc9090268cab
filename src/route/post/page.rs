use std::sync::Arc;

use axum::{
	body::Body,
	extract::{
		multipart::{Multipart, MultipartRejection},
		State,
	},
	http::{Response, StatusCode},
	response::{IntoResponse, Redirect},
};

use crate::{
	config::Config,
	extract::{Authorized, Form, Json, Path, Query, Session},
	form::Submission,
	guard::{UploadFiles, WritePosts},
	render::{Page, View},
	route::model::{IdInput, PageQuery},
	store::Posts,
	Error,
};

use super::model::{self, EditTarget, PostForm};

/// Shows the form for a new post.
pub async fn create_form(_session: Session, view: View) -> Result<Response<Body>, Error> {
	view.render(
		Page::new("post-create", "Create a post", ()).form(Submission::blank(PostForm::default())),
	)
}

pub async fn create(
	editor: Authorized<WritePosts>,
	State(posts): State<Posts>,
	view: View,
	Form(submission): Form<PostForm>,
) -> Result<Response<Body>, Error> {
	if submission.has_errors() {
		return view.render(
			Page::new("post-create", "Create a post", ())
				.form(submission)
				.status(StatusCode::UNPROCESSABLE_ENTITY),
		);
	}

	let post = posts
		.create(&editor.session.user.email, submission.values.into_input())
		.await?;

	tracing::info!(post = post.id, author = %post.author, "post created");

	Ok(Redirect::to("/").into_response())
}

pub async fn edit_form(
	_editor: Authorized<WritePosts>,
	State(posts): State<Posts>,
	view: View,
	Path(IdInput { id }): Path<IdInput>,
	Query(query): Query<PageQuery>,
) -> Result<Response<Body>, Error> {
	let post = posts.get(id).await?;

	view.render(
		Page::new(
			"post-edit",
			"Edit post",
			EditTarget {
				id,
				page: query.page,
			},
		)
		.form(Submission::blank(PostForm::from(post))),
	)
}

pub async fn update(
	_editor: Authorized<WritePosts>,
	State(posts): State<Posts>,
	view: View,
	Path(IdInput { id }): Path<IdInput>,
	Query(query): Query<PageQuery>,
	Form(submission): Form<PostForm>,
) -> Result<Response<Body>, Error> {
	if submission.has_errors() {
		return view.render(
			Page::new(
				"post-edit",
				"Edit post",
				EditTarget {
					id,
					page: query.page,
				},
			)
			.form(submission)
			.status(StatusCode::UNPROCESSABLE_ENTITY),
		);
	}

	posts.update(id, submission.values.into_patch()).await?;

	tracing::info!(post = id, "post updated");

	Ok(query.back_to("/").into_response())
}

pub async fn delete(
	_editor: Authorized<WritePosts>,
	State(posts): State<Posts>,
	Path(IdInput { id }): Path<IdInput>,
	Query(query): Query<PageQuery>,
) -> Result<Redirect, Error> {
	posts.delete(id).await?;

	tracing::info!(post = id, "post deleted");

	Ok(query.back_to("/"))
}

/// Stores the `upload` field of a multipart body in the upload directory.
///
/// An existing file with the same name is replaced.
pub async fn upload(
	_editor: Authorized<UploadFiles>,
	State(config): State<Arc<Config>>,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<model::Upload>, Error> {
	let mut multipart = multipart?;

	while let Some(field) = multipart.next_field().await? {
		if field.name() != Some("upload") {
			continue;
		}

		let name = field
			.file_name()
			.and_then(model::file_name)
			.ok_or_else(|| Error::Transport("upload has no usable file name".into()))?
			.to_owned();

		let bytes = field.bytes().await?;
		let directory = config.storage.directory.join("uploads");

		tokio::fs::create_dir_all(&directory).await?;
		tokio::fs::write(directory.join(&name), &bytes).await?;

		tracing::info!(file = %name, size = bytes.len(), "file uploaded");

		return Ok(Json(model::Upload {
			uploaded: 1,
			url: format!("{}/uploads/{name}", config.storage.prefix),
			file_name: name,
		}));
	}

	Err(Error::Transport("missing upload field".into()))
}
