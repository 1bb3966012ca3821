use std::sync::Arc;

use aide::axum::{routing::post_with, ApiRouter, IntoApiResponse};
use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
};
use macros::route;
use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
	card::{self, AspectRatio, Card},
	config::Config,
	error,
	extract::{Json, Viewer},
	openapi::tag,
	preferences::{Preferences, Theme},
	store::Database,
	AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown_post")]
	UnknownPost(Uuid),
	#[error("render_failed")]
	Render(#[from] card::Error),
}

type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().api_route("/", post_with(create_card, create_card_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::Render(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownPost(id) => message
				.content("The post you requested does not exist.")
				.detail("post", id.to_string()),
			Self::Render(error) => {
				tracing::error!(%error, "failed to render share card");

				message.content("The card could not be rendered. Try again later.")
			}
		}
		.into_vec()
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CardInput {
	/// The post to summarize. Without one, a profile card is rendered.
	pub post: Option<Uuid>,
	/// Caption under the title. Post cards default to the post's summary and
	/// profile cards to the site title.
	#[validate(length(max = 500))]
	pub caption: Option<String>,
	/// Defaults to the theme preference.
	pub theme: Option<Theme>,
	#[serde(default)]
	pub aspect_ratio: AspectRatio,
}

fn host(site_url: &str) -> &str {
	site_url
		.split_once("://")
		.map_or(site_url, |(_, rest)| rest)
}

/// Create share card
/// Renders a PNG card summarizing a post, or the author's profile, for downloading or sharing.
#[route(tag = tag::CARD, response(status = 200, description = "The PNG image.", shape = "Vec<u8>"))]
pub async fn create_card(
	State(database): State<Database>,
	State(config): State<Arc<Config>>,
	viewer: Viewer,
	preferences: Preferences,
	Json(input): Json<CardInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let site = host(&config.site_url);

	let card = match input.post {
		Some(id) => {
			let post = database
				.get_post(id)
				.await?
				.filter(|post| post.is_visible_to(viewer.is_admin()))
				.ok_or(Error::UnknownPost(id))?;

			Card {
				caption: input
					.caption
					.filter(|caption| !caption.trim().is_empty())
					.unwrap_or_else(|| post.summary()),
				footer: format!("{site} - {} min read", post.reading_minutes()),
				title: post.title,
			}
		}
		None => Card {
			title: config.site_author.clone(),
			caption: input.caption.unwrap_or_else(|| config.site_title.clone()),
			footer: site.to_owned(),
		},
	};

	let theme = input.theme.unwrap_or(preferences.theme);
	let png = card::render_png(card, theme, input.aspect_ratio)
		.await
		.map_err(Error::Render)?;

	Ok((
		[
			(header::CONTENT_TYPE, "image/png"),
			(
				header::CONTENT_DISPOSITION,
				"attachment; filename=\"garden-card.png\"",
			),
		],
		png,
	)
		.into_response())
}
