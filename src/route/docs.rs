use std::sync::Arc;

use aide::openapi::OpenApi;
use axum::{
	response::{IntoResponse, Response},
	routing::get,
	Extension, Router,
};

use crate::AppState;

pub fn routes() -> Router<AppState> {
	Router::new().route("/docs/api.json", get(serve_docs))
}

/// Serves the generated OpenAPI document.
async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> Response {
	axum::Json(&*api).into_response()
}
