use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Average reading speed used to estimate reading time.
pub const WORDS_PER_MINUTE: usize = 200;

/// Number of content characters used when a post has no excerpt.
pub const SUMMARY_LENGTH: usize = 120;

fn not_blank(value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(ValidationError::new("must not be blank"));
	}

	Ok(())
}

/// Publication state of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
	#[default]
	Published,
	Draft,
}

impl Status {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Published => "published",
			Self::Draft => "draft",
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
#[error("unknown post status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
	type Err = UnknownStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"published" => Ok(Self::Published),
			"draft" => Ok(Self::Draft),
			other => Err(UnknownStatus(other.to_owned())),
		}
	}
}

/// A single post, written by an author through the editor.
///
/// Counters and the pinned flag are skipped on deserialization, so the
/// generated [`CreatePostInput`] and [`UpdatePostInput`] cannot touch them.
#[model]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The title of the post.
	#[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
	pub title: String,
	/// The content of the post in Markdown format.
	pub content: String,
	/// A short teaser shown in listings and share cards. A blank value clears it.
	pub excerpt: Option<String>,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	/// The time of the last content edit.
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
	/// Whether the post is visible to anonymous readers.
	pub is_public: bool,
	/// Whether the post sorts before all others.
	#[serde(skip_deserializing)]
	pub is_pinned: bool,
	/// Whether the post is published or still a draft.
	#[serde(default)]
	pub status: Status,
	/// The number of counted views.
	#[serde(skip_deserializing)]
	pub view_count: i64,
	/// The number of likes.
	#[serde(skip_deserializing)]
	pub likes: i64,
	/// The user that wrote the post.
	#[serde(skip_deserializing)]
	pub author_id: Uuid,
	/// Free-form category, usually one of the suggested ones.
	#[serde(default)]
	#[validate(length(max = 64))]
	pub category: String,
	/// Free-form subcategory. A blank value clears it.
	pub subcategory: Option<String>,
}

impl Post {
	/// Whether a viewer with the given admin flag may see this post.
	///
	/// Drafts and private posts are admin-only; draft wins over the public flag.
	pub fn is_visible_to(&self, is_admin: bool) -> bool {
		is_admin || (self.is_public && self.status == Status::Published)
	}

	pub fn is_draft(&self) -> bool {
		self.status == Status::Draft
	}

	/// Case-insensitive substring match against title, excerpt, category and subcategory.
	///
	/// `needle` must already be lowercase.
	pub fn matches(&self, needle: &str) -> bool {
		let contains = |value: &str| value.to_lowercase().contains(needle);

		contains(&self.title)
			|| self.excerpt.as_deref().is_some_and(contains)
			|| contains(&self.category)
			|| self.subcategory.as_deref().is_some_and(contains)
	}

	/// Estimated reading time in whole minutes, never less than one.
	pub fn reading_minutes(&self) -> usize {
		self.content
			.split_whitespace()
			.count()
			.div_ceil(WORDS_PER_MINUTE)
			.max(1)
	}

	/// The excerpt, or the start of the content stripped of markdown markers.
	pub fn summary(&self) -> String {
		if let Some(excerpt) = self.excerpt.as_deref().filter(|e| !e.trim().is_empty()) {
			return excerpt.to_owned();
		}

		let start = self
			.content
			.chars()
			.take(SUMMARY_LENGTH)
			.filter(|c| !matches!(c, '#' | '*' | '`'))
			.collect::<String>();

		format!("{}...", start.trim())
	}

	/// Renders the post as a standalone markdown document.
	pub fn to_markdown(&self, author: &str, link: &str) -> String {
		let mut out = format!(
			"# {}\n\nAuthor: {}\nDate: {}\nLink: {}\n\n---\n\n",
			self.title,
			author,
			self.created_at.format("%Y-%m-%d"),
			link,
		);

		if let Some(excerpt) = self.excerpt.as_deref().filter(|e| !e.is_empty()) {
			out.push_str("> ");
			out.push_str(excerpt);
			out.push_str("\n\n");
		}

		out.push_str(&self.content);
		out
	}
}

/// A single user. Every user is an author with moderation rights.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The email address used for logging in.
	#[serde(skip_serializing)]
	pub email: String,
	/// The hashed password, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The name displayed to the public.
	pub username: String,
	/// The creation time of the user.
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Session {
	/// The session id.
	#[serde(rename = "session_id")]
	pub id: Uuid,
	/// The user that owns the session.
	#[serde(skip)]
	pub user_id: Uuid,
	/// The creation time of the session.
	pub created_at: DateTime<Utc>,
}

/// Like state of a post for one visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct LikeState {
	/// Whether the visitor currently likes the post.
	pub liked: bool,
	/// The like count after the operation.
	pub likes: i64,
}
