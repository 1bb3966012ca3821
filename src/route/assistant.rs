use aide::axum::{routing::post_with, ApiRouter};
use axum::extract::State;
use macros::route;
use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

use crate::{
	assistant::{Answer, Assistant},
	error::AppError,
	extract::Json,
	openapi::tag,
	AppState,
};

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().api_route("/", post_with(ask, ask_docs))
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct AskInput {
	/// The reader's question.
	#[validate(length(min = 1, max = 2000))]
	pub question: String,
	/// Text of the page the reader is looking at, if any.
	#[validate(length(max = 20000))]
	pub context: Option<String>,
}

/// Ask the assistant
/// Answers a question about the author and their writing, optionally about the current page.
/// When the model cannot answer, a fallback message is returned instead of an error.
#[route(tag = tag::ASSISTANT)]
pub async fn ask(
	State(assistant): State<Assistant>,
	Json(input): Json<AskInput>,
) -> Result<Json<Answer>, AppError> {
	let answer = assistant
		.ask(&input.question, input.context.as_deref())
		.await;

	Ok(Json(answer))
}
