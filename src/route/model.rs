use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

/// Turns a title into a file name: lowercase ASCII letters and digits joined by dashes.
pub fn slug(title: &str) -> String {
	let slug = title
		.split(|c: char| !c.is_ascii_alphanumeric())
		.filter(|part| !part.is_empty())
		.map(str::to_ascii_lowercase)
		.collect::<Vec<_>>()
		.join("-");

	if slug.is_empty() {
		"post".into()
	} else {
		slug
	}
}
