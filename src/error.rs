use std::borrow::Cow;

use aide::{
	gen::GenContext,
	openapi::{Operation, Response as ApiResponse},
	OperationOutput,
};
use axum::{
	extract::rejection::{PathRejection, QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use tower_governor::GovernorError;

use crate::store;

pub type Map = serde_json::Map<String, Value>;

/// A single error message sent to the client.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A stable, machine-readable error code.
	pub code: Cow<'a, str>,
	/// A human-readable description of the error.
	pub content: Cow<'a, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Extra structured information about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	/// Creates a message whose content defaults to its code.
	pub fn new(code: impl Into<Cow<'a, str>>) -> Self {
		let code = code.into();

		Self {
			content: code.clone(),
			code,
			field: None,
			details: None,
		}
	}

	pub fn content(mut self, content: impl Into<Cow<'a, str>>) -> Self {
		self.content = content.into();
		self
	}

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	/// Always `false`.
	pub success: bool,
	pub errors: Vec<Message<'static>>,
}

impl ErrorResponse {
	pub fn new(errors: Vec<Message<'static>>) -> Self {
		Self {
			success: false,
			errors,
		}
	}
}

/// An error specific to a group of routes.
///
/// The [`std::fmt::Display`] implementation is used for the error code, so it must
/// not contain sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;
	fn into_errors(self) -> Vec<Message<'static>>;
}

/// Errors shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	/// The JSON body was rejected before validation. Holds the rejection response.
	#[error("json rejection")]
	Json(Response),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("rate limited: {0}")]
	RateLimit(#[from] GovernorError),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
}

fn respond(status: StatusCode, errors: Vec<Message<'static>>) -> Response {
	(status, Json(ErrorResponse::new(errors))).into_response()
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		match self {
			Self::Validation(errors) => respond(
				StatusCode::BAD_REQUEST,
				errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| {
							let message = Message::new(error.code.to_string()).field(field.to_string());

							match &error.message {
								Some(content) => message.content(content.to_string()),
								None => message,
							}
						})
					})
					.collect(),
			),
			Self::Json(response) => response,
			Self::Query(rejection) => respond(
				rejection.status(),
				Message::new("invalid_query")
					.content(rejection.body_text())
					.into_vec(),
			),
			Self::Path(rejection) => respond(
				rejection.status(),
				Message::new("invalid_path")
					.content(rejection.body_text())
					.into_vec(),
			),
			Self::RateLimit(error) => match error {
				GovernorError::TooManyRequests { wait_time, headers } => {
					let mut response = respond(
						StatusCode::TOO_MANY_REQUESTS,
						Message::new("too_many_requests")
							.content("You are sending requests too quickly.")
							.detail("wait_time", wait_time)
							.into_vec(),
					);

					if let Some(headers) = headers {
						response.headers_mut().extend(headers);
					}

					response
				}
				GovernorError::UnableToExtractKey => {
					tracing::error!("rate limiter could not extract a key from the request");

					respond(
						StatusCode::INTERNAL_SERVER_ERROR,
						Message::new("internal_error").into_vec(),
					)
				}
				GovernorError::Other { code, msg, .. } => respond(
					code,
					Message::new("rate_limit")
						.content(msg.unwrap_or_default())
						.into_vec(),
				),
			},
			Self::Store(store::Error::UnknownPost(id)) => respond(
				StatusCode::NOT_FOUND,
				Message::new("unknown_post")
					.content("The post you requested does not exist.")
					.detail("post", id.to_string())
					.into_vec(),
			),
			Self::Store(store::Error::Conflict(constraint)) => respond(
				StatusCode::CONFLICT,
				Message::new("conflict").detail("constraint", constraint).into_vec(),
			),
			Self::Store(error) => {
				tracing::error!(%error, "store failure");

				respond(
					StatusCode::INTERNAL_SERVER_ERROR,
					Message::new("internal_error")
						.content("The request could not be completed. Try again later.")
						.into_vec(),
				)
			}
		}
	}
}

/// Error returned by a route: either a shared [`AppError`] or one of the
/// route group's own errors.
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<store::Error> for RouteError<E> {
	fn from(error: store::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => respond(error.status(), error.into_errors()),
		}
	}
}

impl OperationOutput for AppError {
	type Inner = ErrorResponse;

	fn operation_response(ctx: &mut GenContext, operation: &mut Operation) -> Option<ApiResponse> {
		Json::<ErrorResponse>::operation_response(ctx, operation)
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = ErrorResponse;

	fn operation_response(ctx: &mut GenContext, operation: &mut Operation) -> Option<ApiResponse> {
		Json::<ErrorResponse>::operation_response(ctx, operation)
	}
}
