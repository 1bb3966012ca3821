use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const STATS: &str = "Stats";
	pub const ASSISTANT: &str = "Assistant";
	pub const CARD: &str = "Card";
	pub const PREFERENCES: &str = "Preferences";
}

fn tag(name: &str, description: &str) -> Tag {
	Tag {
		name: name.into(),
		description: Some(description.into()),
		..Default::default()
	}
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Digital Garden API")
		.summary("Posts, moderation, counters, share cards and an assistant")
		.description(include_str!("../README.md"))
		.tag(tag(tag::AUTH, "Author sign-in"))
		.tag(tag(tag::POST, "Post browsing, editing and moderation"))
		.tag(tag(tag::STATS, "View, like and visit counters"))
		.tag(tag(tag::ASSISTANT, "Questions answered by a generative model"))
		.tag(tag(tag::CARD, "Share card images"))
		.tag(tag(tag::PREFERENCES, "Reader display preferences"))
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("An author session cookie".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse::new(
				error::Message::new("error_code")
					.content("error message")
					.field("optional field")
					.detail("key", "value")
					.into_vec(),
			))
		})
}
