pub use crate::{
	garden::{Stats, Tab},
	model::{CreatePostInput, LikeState, Post, Status, UpdatePostInput},
	route::model::IdInput,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ListInput {
	/// The listing tab. Category names are accepted as well.
	#[serde(default)]
	pub tab: Tab,
	/// Case-insensitive text matched against title, excerpt, category and subcategory.
	#[validate(length(max = 200))]
	pub q: Option<String>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct DeleteInput {
	/// Must be `true` to actually delete. Without it the confirmation dialog is returned.
	#[serde(default)]
	pub confirm: bool,
}

/// A post as shown on its own page.
#[derive(Serialize, JsonSchema)]
pub struct PostDetail {
	#[serde(flatten)]
	pub post: Post,
	/// Estimated reading time in minutes.
	pub reading_minutes: usize,
	/// Whether this browser has liked the post.
	pub liked: bool,
}

/// The new state of a toggled flag, with the author's listing re-derived after the change.
#[derive(Serialize, JsonSchema)]
pub struct Moderated {
	pub enabled: bool,
	pub posts: Vec<Post>,
}

#[derive(Serialize, JsonSchema)]
pub struct ViewCount {
	/// Whether this request incremented the counter.
	pub counted: bool,
	pub view_count: i64,
}

#[derive(Serialize, JsonSchema)]
pub struct Suggestions {
	pub categories: Vec<String>,
	/// The fixed suggestions followed by any other subcategory already in use.
	pub subcategories: Vec<String>,
}
