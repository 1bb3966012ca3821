//! Gateway to the durable source of truth.
//!
//! The traits in here are stateless from the caller's point of view: every call
//! goes to the backing store and nothing is remembered between calls.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::{LikeState, Post, Session, Status, UpdatePostInput, User};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("no post with id {0}")]
	UnknownPost(Uuid),
	#[error("unique constraint {0} violated")]
	Conflict(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A column posts can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
	CreatedAt,
	UpdatedAt,
	IsPinned,
	ViewCount,
	Likes,
}

impl OrderField {
	pub fn column(self) -> &'static str {
		match self {
			Self::CreatedAt => "created_at",
			Self::UpdatedAt => "updated_at",
			Self::IsPinned => "is_pinned",
			Self::ViewCount => "view_count",
			Self::Likes => "likes",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Ascending,
	Descending,
}

/// A record query: equality filters, ordering and an optional limit.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
	pub category: Option<String>,
	pub is_public: Option<bool>,
	pub status: Option<Status>,
	pub exclude: Option<Uuid>,
	pub order: Vec<(OrderField, Direction)>,
	pub limit: Option<i64>,
}

impl PostQuery {
	/// Every post, newest first.
	pub fn newest() -> Self {
		Self::default().order_by(OrderField::CreatedAt, Direction::Descending)
	}

	pub fn category(mut self, category: impl Into<String>) -> Self {
		self.category = Some(category.into());
		self
	}

	pub fn public(mut self, is_public: bool) -> Self {
		self.is_public = Some(is_public);
		self
	}

	pub fn status(mut self, status: Status) -> Self {
		self.status = Some(status);
		self
	}

	pub fn exclude(mut self, id: Uuid) -> Self {
		self.exclude = Some(id);
		self
	}

	pub fn order_by(mut self, field: OrderField, direction: Direction) -> Self {
		self.order.push((field, direction));
		self
	}

	pub fn limit(mut self, limit: i64) -> Self {
		self.limit = Some(limit);
		self
	}

	/// Whether a post passes the equality filters of this query.
	pub fn accepts(&self, post: &Post) -> bool {
		self.category.as_ref().map_or(true, |c| &post.category == c)
			&& self.is_public.map_or(true, |p| post.is_public == p)
			&& self.status.map_or(true, |s| post.status == s)
			&& self.exclude.map_or(true, |id| post.id != id)
	}
}

/// Fields needed to insert a post. Everything else is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
	pub author_id: Uuid,
	pub title: String,
	pub content: String,
	pub excerpt: Option<String>,
	pub category: String,
	pub subcategory: Option<String>,
	pub status: Status,
	pub is_public: bool,
}

/// A partial update. Counters are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPatch {
	pub title: Option<String>,
	pub content: Option<String>,
	pub excerpt: Option<Option<String>>,
	pub category: Option<String>,
	pub subcategory: Option<Option<String>>,
	pub status: Option<Status>,
	pub is_public: Option<bool>,
	pub is_pinned: Option<bool>,
}

impl PostPatch {
	pub fn visibility(is_public: bool) -> Self {
		Self {
			is_public: Some(is_public),
			..Self::default()
		}
	}

	pub fn pinned(is_pinned: bool) -> Self {
		Self {
			is_pinned: Some(is_pinned),
			..Self::default()
		}
	}

	/// Whether the patch edits authored content, which bumps `updated_at`.
	///
	/// Moderation flags alone (visibility, pin) leave the timestamp untouched.
	pub fn touches_content(&self) -> bool {
		self.title.is_some()
			|| self.content.is_some()
			|| self.excerpt.is_some()
			|| self.category.is_some()
			|| self.subcategory.is_some()
			|| self.status.is_some()
	}

	/// Applies the patch to a local copy of a post.
	pub fn apply(self, post: &mut Post) {
		if let Some(title) = self.title {
			post.title = title;
		}
		if let Some(content) = self.content {
			post.content = content;
		}
		if let Some(excerpt) = self.excerpt {
			post.excerpt = excerpt;
		}
		if let Some(category) = self.category {
			post.category = category;
		}
		if let Some(subcategory) = self.subcategory {
			post.subcategory = subcategory;
		}
		if let Some(status) = self.status {
			post.status = status;
		}
		if let Some(is_public) = self.is_public {
			post.is_public = is_public;
		}
		if let Some(is_pinned) = self.is_pinned {
			post.is_pinned = is_pinned;
		}
	}
}

/// Trims optional text, treating a blank value as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
	value
		.map(|text| text.trim().to_owned())
		.filter(|text| !text.is_empty())
}

/// A blank `excerpt` or `subcategory` clears it. JSON `null` is the same as
/// leaving the field out.
impl From<UpdatePostInput> for PostPatch {
	fn from(input: UpdatePostInput) -> Self {
		Self {
			title: input.title.map(|title| title.trim().to_owned()),
			content: input.content,
			excerpt: input.excerpt.map(optional_text),
			category: input.category.map(|category| category.trim().to_owned()),
			subcategory: input.subcategory.map(optional_text),
			status: input.status,
			is_public: input.is_public,
			is_pinned: None,
		}
	}
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub email: String,
	pub username: String,
	pub password: Vec<u8>,
}

/// Post records.
#[async_trait]
pub trait PostStore: Send + Sync {
	async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>>;
	async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;
	async fn insert_post(&self, post: NewPost) -> Result<Post>;
	/// Applies a partial update, returning the updated post or `None` if it does not exist.
	async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>>;
	/// Permanently deletes a post, returning whether it existed.
	async fn delete_post(&self, id: Uuid) -> Result<bool>;
}

/// Atomic counters. Each call is a single remote operation.
#[async_trait]
pub trait CounterStore: Send + Sync {
	/// Increments the view counter, returning the new count.
	async fn increment_views(&self, post_id: Uuid) -> Result<i64>;
	/// Likes the post for the client, or removes an existing like.
	async fn toggle_like(&self, post_id: Uuid, client_id: &str) -> Result<LikeState>;
	async fn has_liked(&self, post_id: Uuid, client_id: &str) -> Result<bool>;
	/// Increments the visit counter of the given day, returning the new count.
	async fn increment_visits(&self, day: NaiveDate) -> Result<i64>;
}

/// Accounts and sign-in sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
	async fn create_user(&self, user: NewUser) -> Result<User>;
	async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
	async fn create_session(&self, user_id: Uuid) -> Result<Session>;
	async fn delete_session(&self, id: Uuid) -> Result<()>;
	async fn session_user(&self, id: Uuid) -> Result<Option<User>>;
}

/// Everything the service needs from its backing store.
pub trait Store: PostStore + CounterStore + SessionStore {}

impl<T: PostStore + CounterStore + SessionStore> Store for T {}

pub type Database = Arc<dyn Store>;
