use std::sync::Arc;

use axum::{
	body::Body,
	extract::{FromRef, FromRequestParts, Request, State},
	http::{header, request, Response, StatusCode},
	middleware::Next,
	response::{Html, IntoResponse},
	Json,
};
use serde::Serialize;

use crate::{
	config::Config,
	error::ErrorKind,
	extract::{Format, Principal},
	model::User,
	pager::Pager,
	store::Sessions,
	Error,
};

/// The outer document a page is placed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
	#[default]
	Main,
	/// Narrow layout used by the login and registration forms.
	Auth,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Metatags {
	pub description: String,
	pub keywords: Vec<String>,
}

/// Everything needed to show one page, either as HTML or as JSON.
#[derive(Debug, Serialize)]
pub struct Page<D, F = ()> {
	pub layout: Layout,
	pub name: &'static str,
	pub title: String,
	pub metatags: Metatags,
	pub pager: Option<Pager>,
	pub form: Option<F>,
	pub data: D,
	pub principal: Option<User>,
	#[serde(skip)]
	pub status: StatusCode,
}

impl<D> Page<D> {
	pub fn new(name: &'static str, title: impl Into<String>, data: D) -> Self {
		Self {
			layout: Layout::Main,
			name,
			title: title.into(),
			metatags: Metatags::default(),
			pager: None,
			form: None,
			data,
			principal: None,
			status: StatusCode::OK,
		}
	}
}

impl<D, F> Page<D, F> {
	#[must_use]
	pub fn layout(mut self, layout: Layout) -> Self {
		self.layout = layout;
		self
	}

	#[must_use]
	pub fn pager(mut self, pager: Pager) -> Self {
		self.pager = Some(pager);
		self
	}

	#[must_use]
	pub fn status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	#[must_use]
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.metatags.description = description.into();
		self
	}

	#[must_use]
	pub fn keywords(mut self, keywords: &[&str]) -> Self {
		self.metatags.keywords = keywords.iter().map(|&k| k.to_owned()).collect();
		self
	}

	pub fn form<T>(self, form: T) -> Page<D, T> {
		Page {
			layout: self.layout,
			name: self.name,
			title: self.title,
			metatags: self.metatags,
			pager: self.pager,
			form: Some(form),
			data: self.data,
			principal: self.principal,
			status: self.status,
		}
	}
}

/// Shortens `value` to at most `max` characters, marking the cut with `...`.
pub fn truncate(value: &str, max: usize) -> String {
	match value.char_indices().nth(max) {
		Some((end, _)) => format!("{}...", &value[..end]),
		None => value.to_owned(),
	}
}

fn escape_html(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());

	for c in value.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}

	escaped
}

/// Makes serialized JSON safe to embed in a `<script>` element.
fn escape_script(json: &str) -> String {
	json.replace('<', "\\u003c")
		.replace('>', "\\u003e")
		.replace('&', "\\u0026")
}

/// Builds the HTML document for a page. The page model is embedded as JSON
/// for the client-side templates to pick up.
fn document<D, F>(page: &Page<D, F>, app: &str, assets: &str) -> Result<String, Error>
where
	D: Serialize,
	F: Serialize,
{
	let model = escape_script(&serde_json::to_string(page)?);
	let html = format!(
		concat!(
			"<!DOCTYPE html>\n",
			"<html lang=\"en\">\n",
			"<head>\n",
			"<meta charset=\"utf-8\">\n",
			"<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
			"<title>{title} | {app}</title>\n",
			"<meta name=\"description\" content=\"{description}\">\n",
			"<meta name=\"keywords\" content=\"{keywords}\">\n",
			"<link rel=\"stylesheet\" href=\"{assets}/css/app.css\">\n",
			"</head>\n",
			"<body data-layout=\"{layout}\" data-page=\"{name}\">\n",
			"<main id=\"app\"></main>\n",
			"<script id=\"page-model\" type=\"application/json\">{model}</script>\n",
			"<script src=\"{assets}/js/app.js\" defer></script>\n",
			"</body>\n",
			"</html>\n",
		),
		title = escape_html(&page.title),
		app = escape_html(app),
		description = escape_html(&page.metatags.description),
		keywords = escape_html(&page.metatags.keywords.join(", ")),
		assets = escape_html(assets),
		layout = match page.layout {
			Layout::Main => "main",
			Layout::Auth => "auth",
		},
		name = escape_html(page.name),
		model = model,
	);

	Ok(html)
}

/// Renders pages in the representation the client asked for.
pub struct View {
	pub format: Format,
	pub principal: Option<User>,
	config: Arc<Config>,
}

impl View {
	pub fn render<D, F>(&self, mut page: Page<D, F>) -> Result<Response<Body>, Error>
	where
		D: Serialize,
		F: Serialize,
	{
		page.principal.clone_from(&self.principal);

		let status = page.status;

		Ok(match self.format {
			Format::Json => (status, Json(page)).into_response(),
			Format::Html => (
				status,
				Html(document(
					&page,
					&self.config.app.name,
					&self.config.storage.prefix,
				)?),
			)
				.into_response(),
		})
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for View
where
	Arc<Config>: FromRef<S>,
	Sessions: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let format = Format::from_headers(&parts.headers);
		let Principal(principal) = Principal::from_request_parts(parts, state).await?;

		Ok(Self {
			format,
			principal,
			config: Arc::<Config>::from_ref(state),
		})
	}
}

#[derive(Debug, Serialize)]
struct ErrorPage {
	status: u16,
	errors: Vec<String>,
}

/// Turns error responses of browser requests into error pages.
///
/// JSON clients keep the JSON error body. Browsers that are not logged in are
/// sent to the login page instead.
pub async fn error_pages(
	State(config): State<Arc<Config>>,
	request: Request,
	next: Next,
) -> Response<Body> {
	let format = Format::from_headers(request.headers());
	let response = next.run(request).await;

	let Some(kind) = response.extensions().get::<ErrorKind>().copied() else {
		return response;
	};

	if format == Format::Json {
		return response;
	}

	if kind == ErrorKind::Authentication {
		return (StatusCode::SEE_OTHER, [(header::LOCATION, "/user/login")]).into_response();
	}

	let status = response.status();
	let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
		.await
		.unwrap_or_default();
	let errors = serde_json::from_slice::<crate::error::ErrorResponse>(&body)
		.map(|response| response.errors)
		.unwrap_or_default();

	let title = status.canonical_reason().unwrap_or("Error");
	let page = Page::new(
		"error",
		title,
		ErrorPage {
			status: status.as_u16(),
			errors,
		},
	)
	.status(status);

	match document(&page, &config.app.name, &config.storage.prefix) {
		Ok(html) => (status, Html(html)).into_response(),
		Err(error) => {
			tracing::error!(%error, "failed to render error page");
			status.into_response()
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_truncate() {
		assert_eq!(truncate("short", 30), "short");
		assert_eq!(truncate("abcdef", 3), "abc...");
		assert_eq!(truncate("abc", 3), "abc");
		assert_eq!(truncate("héllo wörld", 4), "héll...");
	}

	#[test]
	fn test_document_escapes_model() {
		let page = Page::new("home", "<Home>", "</script><script>alert(1)</script>");
		let html = document(&page, "Blog", "/files").unwrap();

		assert!(html.contains("<title>&lt;Home&gt; | Blog</title>"));
		assert!(!html.contains("</script><script>alert"));
		assert!(html.contains("data-page=\"home\""));
	}

	#[test]
	fn test_page_model_serialization() {
		let page = Page::new("posts", "Posts", vec![1, 2])
			.pager(Pager::new(Some(2), 4))
			.form("draft")
			.status(StatusCode::UNPROCESSABLE_ENTITY);
		let value = serde_json::to_value(&page).unwrap();

		assert_eq!(value["name"], "posts");
		assert_eq!(value["layout"], "main");
		assert_eq!(value["pager"]["page"], 2);
		assert_eq!(value["form"], "draft");
		assert!(value.get("status").is_none());
	}
}
