use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::{http::StatusCode, routing::get};
use tokio::sync::broadcast;

use crate::{error, AppState};

pub mod model;
pub mod route;

pub use route::ensure_user;

/// Capacity of the session event channel. Slow subscribers skip older events.
pub const EVENT_CAPACITY: usize = 32;

/// Publishes sign-in and sign-out events to every open event stream.
pub type Events = broadcast::Sender<model::SessionEvent>;

pub fn channel() -> Events {
	broadcast::channel(EVENT_CAPACITY).0
}

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid_credentials")]
	InvalidCredentials { email: String },
	#[error("password_hashing")]
	Argon(#[from] argon2::Error),
	#[error("no_session_cookie")]
	NoSessionCookie,
	#[error("invalid_session_cookie")]
	InvalidSessionCookie,
}

pub type RouteError = error::RouteError<Error>;

/// Routes that are worth rate limiting strictly.
pub fn login_routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new().api_route("/login", post_with(login, login_docs))
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
		.route("/events", get(stream_events))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidCredentials { .. } | Self::NoSessionCookie | Self::InvalidSessionCookie => {
				StatusCode::UNAUTHORIZED
			}
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::InvalidCredentials { email } => message
				.content(format!(
					"Failed to sign in as '{email}'. If your account uses a different email, enter the full email address."
				))
				.detail("email", email),
			Self::Argon(error) => {
				tracing::error!(%error, "password hashing failed");

				message.content("Your password could not be checked. Try again later.")
			}
			Self::NoSessionCookie => message.content("You need to sign in first."),
			Self::InvalidSessionCookie => {
				message.content("Your session has expired. Sign in again.")
			}
		}
		.into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_login_flow() {
		let (server, _) = app().await;

		let response = server.get("/auth/me").await;
		assert_eq!(response.status_code(), 401);

		let response = server
			.post("/auth/login")
			.json(&json!({
				"login": ADMIN_EMAIL,
				"password": ADMIN_PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = server.get("/auth/me").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["username"], ADMIN_USERNAME);
		assert!(response.json::<Value>().get("email").is_none());

		let response = server.get("/auth/logout").await;
		assert_eq!(response.status_code(), 204);

		let response = server.get("/auth/me").await;
		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_shorthand_login_resolves_domain() {
		let (server, _) = app().await;

		let response = server
			.post("/auth/login")
			.json(&json!({
				"login": "admin",
				"password": ADMIN_PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[tokio::test]
	async fn test_wrong_password_mentions_email() {
		let (server, _) = app().await;

		let response = server
			.post("/auth/login")
			.json(&json!({
				"login": "someone",
				"password": "not the password",
			}))
			.await;

		assert_eq!(response.status_code(), 401);

		let body = response.json::<Value>();
		assert_eq!(body["errors"][0]["code"], "invalid_credentials");
		assert_eq!(body["errors"][0]["details"]["email"], "someone@garden.test");
	}

	#[tokio::test]
	async fn test_login_publishes_event() {
		let (server, state) = app().await;
		let mut events = state.events.subscribe();

		login(&server).await;

		let event = events.try_recv().unwrap();
		assert_eq!(event.kind, super::model::SessionEventKind::SignedIn);
		assert_eq!(event.username, ADMIN_USERNAME);
	}
}
