use std::convert::Infallible;

use aide::OperationInput;
use axum::{extract::FromRequestParts, http::request};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::session::{self, ViewedPosts};

/// The anonymous id of the browser, used to remember its likes.
///
/// A new id is minted when the request carries none; the handler must then
/// send [`Visitor::cookie`] back so the id sticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
	pub id: String,
	pub is_new: bool,
}

impl Visitor {
	pub fn cookie(&self) -> cookie::Cookie<'static> {
		session::visitor_cookie(&self.id)
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Visitor
where
	S: Sync + Send,
{
	type Rejection = Infallible;

	async fn from_request_parts(
		parts: &mut request::Parts,
		_state: &S,
	) -> Result<Self, Self::Rejection> {
		let existing = super::cookie(&parts.headers, session::VISITOR_COOKIE)
			.map(|cookie| cookie.value().trim().to_owned())
			.filter(|id| !id.is_empty() && id.len() <= 64);

		Ok(match existing {
			Some(id) => Self { id, is_new: false },
			None => Self {
				id: Uuid::new_v4().simple().to_string(),
				is_new: true,
			},
		})
	}
}

impl OperationInput for Visitor {}

/// Posts already counted as viewed during this visit.
#[derive(Debug, Default)]
pub struct Viewed(pub ViewedPosts);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Viewed
where
	S: Sync + Send,
{
	type Rejection = Infallible;

	async fn from_request_parts(
		parts: &mut request::Parts,
		_state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(Self(
			super::cookie(&parts.headers, session::VIEWED_COOKIE)
				.map(|cookie| ViewedPosts::parse(cookie.value()))
				.unwrap_or_default(),
		))
	}
}

impl OperationInput for Viewed {}

/// The day of the last counted visit, if this visit was counted already.
#[derive(Debug, Default)]
pub struct LastVisit(pub Option<NaiveDate>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for LastVisit
where
	S: Sync + Send,
{
	type Rejection = Infallible;

	async fn from_request_parts(
		parts: &mut request::Parts,
		_state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(Self(
			super::cookie(&parts.headers, session::VISITED_COOKIE)
				.and_then(|cookie| cookie.value().parse().ok()),
		))
	}
}

impl OperationInput for LastVisit {}
