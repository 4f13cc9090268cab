use axum::response::Redirect;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::pager::Pager;

/// Accepts any value, keeping it only when it parses as an integer.
pub(crate) fn lenient_page<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<String>::deserialize(deserializer)?.and_then(|value| value.trim().parse().ok()))
}

/// The page of a listing to show.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct PageQuery {
	/// The page number to return (1-indexed). Values below 1 or that are not
	/// numbers are treated as 1.
	#[serde(default, deserialize_with = "lenient_page")]
	pub page: Option<i64>,
}

impl PageQuery {
	pub fn pager(&self, items_per_page: i64) -> Pager {
		Pager::new(self.page, items_per_page)
	}

	/// Redirects to `path`, keeping the page the request came from.
	pub fn back_to(&self, path: &str) -> Redirect {
		match self.page {
			Some(page) => Redirect::to(&format!("{path}?page={page}")),
			None => Redirect::to(path),
		}
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: i64,
}
