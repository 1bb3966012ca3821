use std::convert::Infallible;

use aide::OperationInput;
use axum::{extract::FromRequestParts, http::request};

use crate::preferences::Preferences;

#[axum::async_trait]
impl<S> FromRequestParts<S> for Preferences
where
	S: Sync + Send,
{
	type Rejection = Infallible;

	async fn from_request_parts(
		parts: &mut request::Parts,
		_state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(Self::from_cookies(super::cookies(&parts.headers)))
	}
}

impl OperationInput for Preferences {}
