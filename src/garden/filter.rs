use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::Post;

/// Categories offered by the editor. Any other value is accepted as well.
pub const CATEGORY_SUGGESTIONS: [&str; 5] = ["Catatan", "Penelitian", "Bahasan", "Jurnal", "Proyek"];

/// Subcategories offered by the editor before any post has introduced its own.
pub const SUBCATEGORY_SUGGESTIONS: [&str; 8] = [
	"Agama",
	"Sains",
	"Filsafat",
	"Teknologi",
	"Umum",
	"Android",
	"Water Treatment",
	"HSE",
];

/// A listing tab.
///
/// The category-backed tabs also accept the category name itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
	#[default]
	#[serde(alias = "All")]
	All,
	#[serde(alias = "Catatan")]
	Notes,
	#[serde(alias = "Penelitian")]
	Research,
	#[serde(alias = "Bahasan")]
	Discussion,
	/// Only drafts. Empty for anyone but an admin.
	#[serde(alias = "Drafts")]
	Drafts,
}

impl Tab {
	/// The category a tab narrows the listing to, if any.
	pub fn category(self) -> Option<&'static str> {
		match self {
			Self::Notes => Some("Catatan"),
			Self::Research => Some("Penelitian"),
			Self::Discussion => Some("Bahasan"),
			Self::All | Self::Drafts => None,
		}
	}
}

/// Listing order: pinned posts first, then newest first.
///
/// Equal keys compare as equal so that stable sorts keep fetch order.
pub fn listing_order(a: &Post, b: &Post) -> Ordering {
	b.is_pinned
		.cmp(&a.is_pinned)
		.then_with(|| b.created_at.cmp(&a.created_at))
}

/// What a viewer asked to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
	is_admin: bool,
	tab: Tab,
	/// Lowercased and trimmed search query; empty means no search.
	needle: String,
}

impl Filter {
	pub fn new(is_admin: bool, tab: Tab, query: &str) -> Self {
		Self {
			is_admin,
			tab,
			needle: query.trim().to_lowercase(),
		}
	}

	pub fn is_admin(&self) -> bool {
		self.is_admin
	}

	pub fn tab(&self) -> Tab {
		self.tab
	}

	pub fn accepts(&self, post: &Post) -> bool {
		if !post.is_visible_to(self.is_admin) {
			return false;
		}

		let in_tab = match self.tab {
			Tab::All => true,
			Tab::Drafts => post.is_draft(),
			tab => tab.category() == Some(post.category.as_str()),
		};

		in_tab && (self.needle.is_empty() || post.matches(&self.needle))
	}

	/// Keeps the accepted posts, preserving their relative order.
	pub fn apply<'p>(&self, posts: impl IntoIterator<Item = &'p Post>) -> Vec<&'p Post> {
		posts.into_iter().filter(|post| self.accepts(post)).collect()
	}
}
