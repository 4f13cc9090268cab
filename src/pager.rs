use schemars::JsonSchema;
use serde::Serialize;

/// Page size used by every listing unless configured otherwise.
pub const DEFAULT_ITEMS_PER_PAGE: i64 = 4;

/// Offset and page-count bookkeeping for a paginated listing.
///
/// The requested page is clamped to at least 1 on construction. The total
/// item count is only known after a separate count query, so it is set with
/// [`Pager::set_items`] once available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Pager {
	/// The current page (1-indexed).
	pub page: i64,
	/// The number of items shown on each page.
	pub items_per_page: i64,
	/// The total number of items.
	pub items: i64,
	/// The total number of pages.
	pub pages: i64,
	/// Whether the current page is the first one.
	pub is_beginning: bool,
	/// Whether the current page is the last one, or past it.
	pub is_end: bool,
}

impl Pager {
	pub fn new(requested: Option<i64>, items_per_page: i64) -> Self {
		let page = requested.filter(|page| *page > 0).unwrap_or(1);

		Self {
			page,
			items_per_page: items_per_page.max(1),
			items: 0,
			pages: 0,
			is_beginning: page <= 1,
			is_end: true,
		}
	}

	/// Stores the total item count and derives the page count from it.
	///
	/// The current page is left as is, even when it lies past the last page.
	pub fn set_items(&mut self, items: i64) {
		self.items = items.max(0);
		self.pages = self.items / self.items_per_page + i64::from(self.items % self.items_per_page != 0);
		self.is_end = self.page >= self.pages;
	}

	pub fn offset(&self) -> i64 {
		self.page
			.saturating_sub(1)
			.saturating_mul(self.items_per_page)
			.max(0)
	}

	pub fn limit(&self) -> i64 {
		self.items_per_page
	}
}

#[cfg(test)]
mod test {
	use super::Pager;

	#[test]
	fn test_pager_offset() {
		let mut pager = Pager::new(Some(1), 10);

		assert_eq!(pager.offset(), 0);

		pager.page = 2;

		assert_eq!(pager.offset(), 10);

		let pager = Pager::new(Some(3), 5);

		assert_eq!(pager.offset(), 10);
		assert_eq!(pager.limit(), 5);
	}

	#[test]
	fn test_pager_clamps_requested_page() {
		for requested in [None, Some(0), Some(-1), Some(i64::MIN)] {
			let pager = Pager::new(requested, 4);

			assert_eq!(pager.page, 1);
			assert_eq!(pager.offset(), Pager::new(Some(1), 4).offset());
		}
	}

	#[test]
	fn test_pager_offset_is_floored() {
		let mut pager = Pager::new(None, 4);

		pager.page = 0;

		assert_eq!(pager.offset(), 0);
	}

	#[test]
	fn test_pager_pages_is_ceiling() {
		for size in 1..=7 {
			for total in 0..=50 {
				let mut pager = Pager::new(None, size);

				pager.set_items(total);

				let expected = (total as f64 / size as f64).ceil() as i64;

				assert_eq!(pager.pages, expected, "total {total}, size {size}");
				assert_eq!(pager.offset(), 0);
			}
		}
	}

	#[test]
	fn test_pager_empty_listing() {
		let mut pager = Pager::new(Some(3), 4);

		pager.set_items(0);

		assert_eq!(pager.pages, 0);
		assert_eq!(pager.page, 3);
		assert!(!pager.is_beginning);
		assert!(pager.is_end);
	}

	#[test]
	fn test_pager_boundaries() {
		let mut pager = Pager::new(Some(1), 4);

		pager.set_items(9);

		assert!(pager.is_beginning);
		assert!(!pager.is_end);

		let mut pager = Pager::new(Some(3), 4);

		pager.set_items(9);

		assert!(!pager.is_beginning);
		assert!(pager.is_end);

		let value = serde_json::to_value(&pager).unwrap();

		assert_eq!(value["is_beginning"], false);
		assert_eq!(value["is_end"], true);
	}
}
