use std::sync::Arc;

use axum::{
	body::Body,
	extract::State,
	http::{Response, StatusCode},
	response::IntoResponse,
};

use crate::{
	config::Config,
	extract::{Authorized, Form, Path, Query},
	form::Submission,
	guard::{ManageUsers, ReadContent},
	model::UpdateUserInput,
	pager::Pager,
	render::{Page, View},
	route::model::{IdInput, PageQuery},
	store::{Order, Users},
	Error,
};

use super::model::{PermissionForm, UserRow};

async fn listing(users: &Users, pager: &mut Pager) -> Result<Vec<UserRow>, Error> {
	pager.set_items(users.count().await?);

	Ok(users
		.list(Order::Newest, pager.offset(), pager.limit())
		.await?
		.into_iter()
		.map(UserRow::from)
		.collect())
}

/// Lists every user along with their permission.
pub async fn index(
	_viewer: Authorized<ReadContent>,
	State(config): State<Arc<Config>>,
	State(users): State<Users>,
	view: View,
	Query(query): Query<PageQuery>,
) -> Result<Response<Body>, Error> {
	let mut pager = query.pager(config.app.page_size);
	let rows = listing(&users, &mut pager).await?;

	view.render(
		Page::new("users", "Users", rows)
			.pager(pager)
			.form(Submission::blank(PermissionForm::default())),
	)
}

/// Changes the permission of a user.
pub async fn update(
	editor: Authorized<ManageUsers>,
	State(config): State<Arc<Config>>,
	State(users): State<Users>,
	view: View,
	Path(IdInput { id }): Path<IdInput>,
	Query(query): Query<PageQuery>,
	Form(submission): Form<PermissionForm>,
) -> Result<Response<Body>, Error> {
	let Some(permission) = submission.values.permission().filter(|_| !submission.has_errors())
	else {
		let mut pager = query.pager(config.app.page_size);
		let rows = listing(&users, &mut pager).await?;

		return view.render(
			Page::new("users", "Users", rows)
				.pager(pager)
				.form(submission)
				.status(StatusCode::UNPROCESSABLE_ENTITY),
		);
	};

	users
		.update(
			id,
			UpdateUserInput {
				name: None,
				email: None,
				permission: Some(permission),
			},
		)
		.await?;

	tracing::info!(
		user = id,
		?permission,
		by = editor.session.user.id,
		"permission changed"
	);

	Ok(query.back_to("/users").into_response())
}
