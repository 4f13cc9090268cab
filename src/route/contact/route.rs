use std::sync::Arc;

use axum::{
	body::Body,
	extract::State,
	http::{Response, StatusCode},
	response::{IntoResponse, Redirect},
};

use crate::{
	config::Config,
	extract::{Authorized, Created, Form, Format, Path, Query},
	form::Submission,
	guard::ManageContacts,
	model::{Contact, CreateContactInput},
	pager::Pager,
	render::{Page, View},
	route::model::{IdInput, PageQuery},
	store::{Contacts, Order},
	Error,
};

use super::model::ContactForm;

async fn listing(contacts: &Contacts, pager: &mut Pager) -> Result<Vec<Contact>, Error> {
	pager.set_items(contacts.count().await?);

	Ok(contacts
		.list(Order::Newest, pager.offset(), pager.limit())
		.await?)
}

/// Shows the contact form and the messages left so far.
pub async fn index(
	State(config): State<Arc<Config>>,
	State(contacts): State<Contacts>,
	view: View,
	Query(query): Query<PageQuery>,
) -> Result<Response<Body>, Error> {
	let mut pager = query.pager(config.app.page_size);
	let messages = listing(&contacts, &mut pager).await?;

	view.render(
		Page::new("contact", "Contact us", messages)
			.pager(pager)
			.description("Get in touch.")
			.form(Submission::blank(ContactForm::default())),
	)
}

/// Stores a message left through the contact form.
pub async fn submit(
	State(config): State<Arc<Config>>,
	State(contacts): State<Contacts>,
	view: View,
	Query(query): Query<PageQuery>,
	Form(submission): Form<ContactForm>,
) -> Result<Response<Body>, Error> {
	if submission.has_errors() {
		let mut pager = query.pager(config.app.page_size);
		let messages = listing(&contacts, &mut pager).await?;

		return view.render(
			Page::new("contact", "Contact us", messages)
				.pager(pager)
				.form(submission)
				.status(StatusCode::UNPROCESSABLE_ENTITY),
		);
	}

	let contact = contacts
		.create(CreateContactInput::from(submission.values))
		.await?;

	tracing::info!(contact = contact.id, kind = %contact.kind, "contact message received");

	Ok(match view.format {
		Format::Json => Created(contact).into_response(),
		Format::Html => Redirect::to("/contact").into_response(),
	})
}

pub async fn delete(
	_editor: Authorized<ManageContacts>,
	State(contacts): State<Contacts>,
	Path(IdInput { id }): Path<IdInput>,
	Query(query): Query<PageQuery>,
) -> Result<Redirect, Error> {
	contacts.delete(id).await?;

	tracing::info!(contact = id, "contact message deleted");

	Ok(query.back_to("/contact"))
}
