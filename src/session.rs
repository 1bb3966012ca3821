//! Cookies identifying a browser: its sign-in session, its visitor id and the
//! per-visit view and visit flags.
//!
//! The visitor cookies are advisory. A client that drops them is counted again.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use cookie::{time::Duration, Cookie, SameSite};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";
pub const VISITOR_COOKIE: &str = "visitor";
pub const VIEWED_COOKIE: &str = "viewed";
pub const VISITED_COOKIE: &str = "visited";

/// Most post ids remembered in the `viewed` cookie.
pub const MAX_VIEWED: usize = 64;

const VIEWED_SEPARATOR: char = '.';

/// Creates a session cookie with no expiry
pub fn create_cookie(session_id: Uuid) -> Cookie<'static> {
	Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> Cookie<'static> {
	Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(Duration::ZERO)
		.into()
}

/// Creates the long-lived cookie holding a visitor id.
pub fn visitor_cookie(visitor_id: &str) -> Cookie<'static> {
	Cookie::build((VISITOR_COOKIE, visitor_id.to_owned()))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.max_age(Duration::days(365))
		.into()
}

/// Creates the visit-scoped cookie remembering which posts were viewed.
pub fn viewed_cookie(viewed: &ViewedPosts) -> Cookie<'static> {
	Cookie::build((VIEWED_COOKIE, viewed.to_string()))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates the visit-scoped cookie remembering the day of the last counted visit.
pub fn visited_cookie(day: NaiveDate) -> Cookie<'static> {
	Cookie::build((VISITED_COOKIE, day.to_string()))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Post ids already counted as viewed during this visit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewedPosts(BTreeSet<Uuid>);

impl ViewedPosts {
	/// Parses a cookie value, skipping anything that is not a post id.
	pub fn parse(value: &str) -> Self {
		Self(
			value
				.split(VIEWED_SEPARATOR)
				.filter_map(|id| Uuid::parse_str(id).ok())
				.take(MAX_VIEWED)
				.collect(),
		)
	}

	pub fn contains(&self, id: Uuid) -> bool {
		self.0.contains(&id)
	}

	/// Remembers a post, returning `false` if it was already remembered.
	///
	/// When full, an arbitrary older id is forgotten to make room.
	pub fn insert(&mut self, id: Uuid) -> bool {
		if self.0.contains(&id) {
			return false;
		}

		if self.0.len() >= MAX_VIEWED {
			self.0.pop_first();
		}

		self.0.insert(id)
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.0.len()
	}
}

impl std::fmt::Display for ViewedPosts {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (i, id) in self.0.iter().enumerate() {
			if i > 0 {
				write!(f, "{VIEWED_SEPARATOR}")?;
			}

			write!(f, "{id}")?;
		}

		Ok(())
	}
}
