use std::convert::Infallible;

use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
	response::{
		sse::{Event, KeepAlive},
		Sse,
	},
};
use macros::route;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use uuid::Uuid;

use crate::{
	config::AdminAccount,
	extract::{Json, Session},
	openapi::tag,
	session, store,
	store::{Database, NewUser},
	AppState,
};

use super::{
	model::{self, SessionEvent, SessionEventKind},
	Error, Events, RouteError,
};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
	#[error("failed to hash the account password: {0}")]
	Argon(#[from] argon2::Error),
	#[error(transparent)]
	Store(#[from] store::Error),
}

/// Creates the configured account unless a user with its email exists already.
pub async fn ensure_user(
	database: &Database,
	hasher: &Argon2<'_>,
	account: &AdminAccount,
) -> Result<model::User, SetupError> {
	if let Some(user) = database.user_by_email(&account.email).await? {
		return Ok(user);
	}

	let id = Uuid::new_v4();
	let password = hash_password(hasher, &account.password, &id)?;
	let user = database
		.create_user(NewUser {
			id,
			email: account.email.clone(),
			username: account.username.clone(),
			password: password.to_vec(),
		})
		.await?;

	tracing::info!(user = %user.id, username = %user.username, "created admin account");

	Ok(user)
}

/// Log in
/// Signs in with an email address (or a username on the login domain), returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::Session>"))]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let email = state.config.resolve_login(&input.login);

	let Some(user) = state.database.user_by_email(&email).await? else {
		tracing::info!(%email, "sign-in with unknown email");

		return Err(Error::InvalidCredentials { email }.into());
	};

	let hashed = hash_password(&state.hasher, &input.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		tracing::info!(%email, "sign-in with wrong password");

		return Err(Error::InvalidCredentials { email }.into());
	}

	let session = state.database.create_session(user.id).await?;

	tracing::info!(user = %user.id, "signed in");

	// Nobody listening is fine
	let _ = state
		.events
		.send(SessionEvent::new(SessionEventKind::SignedIn, &user));

	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Log out
/// Ends the current session and clears its cookie.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(state): State<AppState>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	state.database.delete_session(session.id).await?;

	tracing::info!(user = %session.user.id, "signed out");

	let _ = state
		.events
		.send(SessionEvent::new(SessionEventKind::SignedOut, &session.user));

	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	))
}

/// Get user
/// Returns the signed-in user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

/// Streams sign-in and sign-out events as server-sent events, so open editor
/// pages notice when the author signs in or out elsewhere.
pub async fn stream_events(
	_session: Session,
	State(events): State<Events>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	let stream = BroadcastStream::new(events.subscribe())
		// Lagged receivers skip the events they missed
		.filter_map(Result::ok)
		.filter_map(|event| {
			Event::default()
				.event(event.kind.as_str())
				.json_data(&event)
				.ok()
		})
		.map(Ok::<_, Infallible>);

	Sse::new(stream).keep_alive(KeepAlive::default())
}
