pub use crate::model::{CreatePostInput, Post, UpdatePostInput};

use chrono::{NaiveDate, NaiveTime};
use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::{
	model::not_blank,
	pager::Pager,
	route::model::lenient_page,
	store::{Order, PostPredicate},
};

/// The post form as typed into the browser.
#[derive(Debug, Default, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct PostForm {
	#[validate(custom(function = "not_blank"))]
	pub title: String,
	#[validate(custom(function = "not_blank"))]
	pub body: String,
}

impl PostForm {
	pub fn into_input(self) -> CreatePostInput {
		CreatePostInput {
			title: self.title.trim().to_owned(),
			body: self.body.trim().to_owned(),
		}
	}

	pub fn into_patch(self) -> UpdatePostInput {
		let CreatePostInput { title, body } = self.into_input();

		UpdatePostInput {
			title: Some(title),
			body: Some(body),
		}
	}
}

impl From<Post> for PostForm {
	fn from(post: Post) -> Self {
		Self {
			title: post.title,
			body: post.body,
		}
	}
}

/// Trims the fields present in a patch.
pub fn trim_patch(patch: UpdatePostInput) -> UpdatePostInput {
	UpdatePostInput {
		title: patch.title.map(|title| title.trim().to_owned()),
		body: patch.body.map(|body| body.trim().to_owned()),
	}
}

/// The post being edited, and the page of the listing to go back to.
#[derive(Debug, Serialize)]
pub struct EditTarget {
	pub id: i64,
	pub page: Option<i64>,
}

/// Reads a `YYYY-MM-DD` day, treating a blank value as no day at all.
fn optional_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
		None | Some("") => Ok(None),
		Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d")
			.map(Some)
			.map_err(de::Error::custom),
	}
}

/// Filters the post listing to a range of days.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct PostWindow {
	/// Only include posts created on or after this day (`YYYY-MM-DD`).
	#[serde(default, deserialize_with = "optional_day")]
	pub from: Option<NaiveDate>,
	/// Only include posts created on or before this day (`YYYY-MM-DD`).
	#[serde(default, deserialize_with = "optional_day")]
	pub to: Option<NaiveDate>,
	/// The page number to return (1-indexed).
	#[serde(default, deserialize_with = "lenient_page")]
	pub page: Option<i64>,
}

impl PostWindow {
	/// Both days are inclusive, so the upper bound is the start of the day
	/// after `to`.
	pub fn predicate(&self) -> PostPredicate {
		PostPredicate {
			created_from: self.from.map(|day| day.and_time(NaiveTime::MIN).and_utc()),
			created_before: self
				.to
				.and_then(|day| day.succ_opt())
				.map(|day| day.and_time(NaiveTime::MIN).and_utc()),
		}
	}

	/// Filtered listings read in the order posts were written.
	pub fn order(&self) -> Order {
		if self.from.is_some() || self.to.is_some() {
			Order::IdAscending
		} else {
			Order::Newest
		}
	}
}

/// A page of posts.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostListing {
	pub posts: Vec<Post>,
	pub pager: Pager,
}

/// The answer given to the editor after an upload.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
	pub uploaded: u8,
	pub file_name: String,
	pub url: String,
}

/// Reduces a client-supplied file name to its final path component.
pub fn file_name(raw: &str) -> Option<&str> {
	let name = raw.rsplit(['/', '\\']).next()?.trim();

	match name {
		"" | "." | ".." => None,
		name => Some(name),
	}
}
