use aide::{
	gen::GenContext,
	openapi::{Operation, SecurityRequirement},
	OperationInput,
};
use axum::{
	extract::{FromRef, FromRequestParts},
	http::request,
};
use uuid::Uuid;

use crate::{
	error::{AppError, RouteError},
	model::User,
	openapi::SECURITY_SCHEME_SESSION,
	route::auth,
	session,
	store::Database,
};

fn session_id(parts: &request::Parts) -> Result<Uuid, auth::Error> {
	let cookie =
		super::cookie(&parts.headers, session::COOKIE_NAME).ok_or(auth::Error::NoSessionCookie)?;

	Uuid::parse_str(cookie.value()).map_err(|_| auth::Error::InvalidSessionCookie)
}

fn session_requirement() -> SecurityRequirement {
	[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
		.into_iter()
		.collect()
}

/// Extracts the session and related user from the request.
///
/// If it does not exist, a [`auth::Error::NoSessionCookie`] is returned.
/// If the session is invalid, a [`auth::Error::InvalidSessionCookie`] is returned.
///
/// Every signed-in user is an admin, so this also guards admin-only routes.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let id = session_id(parts)?;
		let database = Database::from_ref(state);
		let user = database
			.session_user(id)
			.await?
			.ok_or(auth::Error::InvalidSessionCookie)?;

		Ok(Self { id, user })
	}
}

impl OperationInput for Session {
	/// This adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut GenContext, operation: &mut Operation) {
		operation.security.push(session_requirement());
	}
}

/// The signed-in user, if any.
///
/// Unlike [`Session`], a missing or stale cookie is not an error: the request
/// is simply treated as anonymous.
#[derive(Debug, Default)]
pub struct Viewer(pub Option<User>);

impl Viewer {
	pub fn is_admin(&self) -> bool {
		self.0.is_some()
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Viewer
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let Ok(id) = session_id(parts) else {
			return Ok(Self(None));
		};

		let database = Database::from_ref(state);

		Ok(Self(database.session_user(id).await?))
	}
}

impl OperationInput for Viewer {
	/// The session cookie is optional, so anonymous access is listed as well.
	fn operation_input(_ctx: &mut GenContext, operation: &mut Operation) {
		operation
			.security
			.extend([session_requirement(), SecurityRequirement::default()]);
	}
}
