use aide::axum::{routing::get_with, ApiRouter, IntoApiResponse};
use axum::{
	http::header,
	response::{AppendHeaders, IntoResponse},
};
use macros::route;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::{
	error::AppError,
	extract::Json,
	openapi::tag,
	preferences::{Language, Preferences, Theme},
	AppState,
};

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().api_route(
		"/",
		get_with(get_preferences, get_preferences_docs)
			.put_with(update_preferences, update_preferences_docs),
	)
}

/// Omitted fields keep their current value.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdatePreferencesInput {
	pub theme: Option<Theme>,
	pub language: Option<Language>,
	/// Between 12 and 24 pixels.
	#[validate(range(min = 12, max = 24))]
	pub font_size: Option<u8>,
}

/// Get preferences
/// Returns the display preferences stored in this browser's cookies.
#[route(tag = tag::PREFERENCES)]
pub async fn get_preferences(preferences: Preferences) -> Json<Preferences> {
	Json(preferences)
}

/// Update preferences
/// Stores theme, language and font size in long-lived cookies.
#[route(tag = tag::PREFERENCES, response(status = 200, shape = "Json<Preferences>"))]
pub async fn update_preferences(
	mut preferences: Preferences,
	Json(input): Json<UpdatePreferencesInput>,
) -> Result<impl IntoApiResponse, AppError> {
	if let Some(theme) = input.theme {
		preferences.theme = theme;
	}
	if let Some(language) = input.language {
		preferences.language = language;
	}
	if let Some(font_size) = input.font_size {
		preferences.font_size = font_size;
	}

	let cookies = preferences
		.cookies()
		.map(|cookie| (header::SET_COOKIE, cookie.to_string()));

	Ok((AppendHeaders(cookies), Json(preferences)).into_response())
}
