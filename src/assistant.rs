//! Answers reader questions with a hosted generative model.
//!
//! The assistant never fails towards its caller: any error from the model is
//! turned into one of a few [`Fallback`] messages.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const TIMEOUT: Duration = Duration::from_secs(30);
const PLACEHOLDER_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
	#[error("no usable api key is configured")]
	Misconfigured,
	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("model api answered {status}: {message}")]
	Api { status: u16, message: String },
	#[error("the model returned no candidate")]
	NoCandidate,
}

/// Turns a prompt into text.
#[async_trait]
pub trait Generator: Send + Sync {
	async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
	contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
	parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
	text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
	#[serde(default)]
	candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
	content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
	#[serde(default)]
	parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
	text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
	error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
	message: String,
}

impl GenerateResponse {
	/// Text of the first candidate, or `None` if it has none.
	fn into_text(self) -> Option<String> {
		let text = self
			.candidates
			.into_iter()
			.next()?
			.content?
			.parts
			.into_iter()
			.filter_map(|part| part.text)
			.collect::<String>();

		(!text.is_empty()).then_some(text)
	}
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
	http: reqwest::Client,
	api_key: Option<String>,
	model: String,
	base_url: String,
}

impl GeminiClient {
	pub fn new(
		api_key: Option<String>,
		model: impl Into<String>,
		base_url: impl Into<String>,
	) -> reqwest::Result<Self> {
		Ok(Self {
			http: reqwest::Client::builder().timeout(TIMEOUT).build()?,
			api_key,
			model: model.into(),
			base_url: base_url.into(),
		})
	}

	fn api_key(&self) -> Option<&str> {
		self.api_key
			.as_deref()
			.map(str::trim)
			.filter(|key| !key.is_empty() && !key.contains(PLACEHOLDER_KEY))
	}
}

#[async_trait]
impl Generator for GeminiClient {
	async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
		let api_key = self.api_key().ok_or(GenerateError::Misconfigured)?;
		let url = format!(
			"{}/v1beta/models/{}:generateContent",
			self.base_url.trim_end_matches('/'),
			self.model
		);

		let response = self
			.http
			.post(url)
			.header("x-goog-api-key", api_key)
			.json(&GenerateRequest {
				contents: [RequestContent {
					parts: [RequestPart { text: prompt }],
				}],
			})
			.send()
			.await?;

		let status = response.status();

		if !status.is_success() {
			let message = match response.json::<ApiErrorBody>().await {
				Ok(body) => body.error.message,
				Err(_) => status.to_string(),
			};

			return Err(GenerateError::Api {
				status: status.as_u16(),
				message,
			});
		}

		response
			.json::<GenerateResponse>()
			.await?
			.into_text()
			.ok_or(GenerateError::NoCandidate)
	}
}

/// Why the assistant could not answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
	Misconfigured,
	InvalidKey,
	Network,
	Safety,
	Unavailable,
}

impl Fallback {
	pub fn classify(error: &GenerateError) -> Self {
		match error {
			GenerateError::Misconfigured => Self::Misconfigured,
			GenerateError::Request(error) if error.is_connect() || error.is_timeout() => Self::Network,
			GenerateError::Api { message, .. } if message.contains("API key") => Self::InvalidKey,
			GenerateError::Api { message, .. } if message.contains("candidate") => Self::Safety,
			GenerateError::NoCandidate => Self::Safety,
			GenerateError::Request(..) | GenerateError::Api { .. } => Self::Unavailable,
		}
	}

	/// The text shown to the reader instead of an answer.
	pub fn message(self) -> &'static str {
		match self {
			Self::Misconfigured => {
				"AI Configuration Error: the assistant has no API key. Please check the GEMINI_API_KEY setting."
			}
			Self::InvalidKey => "Error: The provided API Key is invalid or expired.",
			Self::Network => {
				"Network Error: Could not connect to the AI service. Please check your internet connection."
			}
			Self::Safety => {
				"I apologize, but I cannot answer that specific query due to safety filters."
			}
			Self::Unavailable => {
				"I apologize, but I am currently unable to process your request. Please try again later."
			}
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Answer {
	/// The answer, or a fallback message.
	pub text: String,
	/// Set when `text` is a fallback message.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub fallback: Option<Fallback>,
}

/// Standing instructions given to the model before every question.
pub fn instructions(site_title: &str, author: &str) -> String {
	format!(
		"You are the assistant of \"{site_title}\", a digital garden and portfolio belonging to {author}.\n\
		\n\
		YOUR ROLE:\n\
		- Answer questions about {author} and their writing.\n\
		- Help readers explore the posts in the garden.\n\
		- Be polite, concise and professional, with a low profile but helpful tone.\n\
		- If asked about a specific post, summarize the page context when it is provided.\n\
		\n\
		IMPORTANT:\n\
		- Politely decline questions about site statistics or private data.\n\
		- Keep answers under three paragraphs unless asked for details."
	)
}

#[derive(Clone)]
pub struct Assistant {
	generator: Arc<dyn Generator>,
	instructions: Arc<str>,
}

impl Assistant {
	pub fn new(generator: Arc<dyn Generator>, instructions: impl Into<Arc<str>>) -> Self {
		Self {
			generator,
			instructions: instructions.into(),
		}
	}

	/// Builds the full prompt: instructions, page context when present, then the question.
	pub fn compose(&self, question: &str, context: Option<&str>) -> String {
		let mut prompt = String::from(&*self.instructions);

		if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
			prompt.push_str("\n\nCURRENT PAGE CONTEXT: ");
			prompt.push_str(context);
		}

		prompt.push_str("\n\nUSER QUESTION: ");
		prompt.push_str(question.trim());
		prompt
	}

	pub async fn ask(&self, question: &str, context: Option<&str>) -> Answer {
		let prompt = self.compose(question, context);

		match self.generator.generate(&prompt).await {
			Ok(text) => Answer {
				text,
				fallback: None,
			},
			Err(error) => {
				let fallback = Fallback::classify(&error);

				tracing::warn!(%error, ?fallback, "assistant answered with a fallback");

				Answer {
					text: fallback.message().to_owned(),
					fallback: Some(fallback),
				}
			}
		}
	}
}

#[cfg(test)]
pub mod fake {
	use std::sync::Mutex;

	use async_trait::async_trait;

	use super::{GenerateError, Generator};

	/// Answers every prompt by echoing it, or fails when built with `failing`.
	#[derive(Default)]
	pub struct FakeGenerator {
		pub fail_with: Option<String>,
		pub prompts: Mutex<Vec<String>>,
	}

	impl FakeGenerator {
		pub fn failing(message: &str) -> Self {
			Self {
				fail_with: Some(message.into()),
				prompts: Mutex::default(),
			}
		}
	}

	#[async_trait]
	impl Generator for FakeGenerator {
		async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
			self.prompts.lock().unwrap().push(prompt.to_owned());

			match &self.fail_with {
				Some(message) => Err(GenerateError::Api {
					status: 400,
					message: message.clone(),
				}),
				None => Ok(format!("echo: {}", prompt.len())),
			}
		}
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use axum::{http::StatusCode, routing::post, Json, Router};
	use serde_json::json;

	use super::{fake::FakeGenerator, Assistant, Fallback, GeminiClient, GenerateError, Generator};

	/// Serves a canned `generateContent` answer on a random local port.
	async fn serve(status: StatusCode, body: serde_json::Value) -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let address = listener.local_addr().unwrap();
		let app = Router::new().route(
			"/v1beta/models/:model",
			post(move || {
				let body = body.clone();
				async move { (status, Json(body)) }
			}),
		);

		tokio::spawn(async move { axum::serve(listener, app).await });

		format!("http://{address}")
	}

	#[test]
	fn test_compose_order() {
		let assistant = Assistant::new(Arc::new(FakeGenerator::default()), "RULES");

		assert_eq!(
			assistant.compose("  Who? ", Some("Post body")),
			"RULES\n\nCURRENT PAGE CONTEXT: Post body\n\nUSER QUESTION: Who?"
		);
		assert_eq!(assistant.compose("Who?", Some("   ")), "RULES\n\nUSER QUESTION: Who?");
		assert_eq!(assistant.compose("Who?", None), "RULES\n\nUSER QUESTION: Who?");
	}

	#[test]
	fn test_classify() {
		let api = |message: &str| GenerateError::Api {
			status: 400,
			message: message.into(),
		};

		assert_eq!(Fallback::classify(&GenerateError::Misconfigured), Fallback::Misconfigured);
		assert_eq!(Fallback::classify(&api("API key not valid")), Fallback::InvalidKey);
		assert_eq!(Fallback::classify(&api("blocked candidate")), Fallback::Safety);
		assert_eq!(Fallback::classify(&GenerateError::NoCandidate), Fallback::Safety);
		assert_eq!(Fallback::classify(&api("quota exceeded")), Fallback::Unavailable);
	}

	#[tokio::test]
	async fn test_ask_never_fails() {
		let generator = Arc::new(FakeGenerator::failing("API key expired"));
		let assistant = Assistant::new(generator.clone(), "RULES");

		let answer = assistant.ask("hello", None).await;

		assert_eq!(answer.fallback, Some(Fallback::InvalidKey));
		assert_eq!(answer.text, Fallback::InvalidKey.message());
		assert_eq!(generator.prompts.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_placeholder_key_is_misconfigured() {
		for key in [None, Some(String::new()), Some("YOUR_API_KEY_HERE".to_owned())] {
			let client = GeminiClient::new(key, "model", "http://127.0.0.1:9").unwrap();

			assert!(matches!(client.generate("hi").await, Err(GenerateError::Misconfigured)));
		}
	}

	#[tokio::test]
	async fn test_gemini_joins_candidate_parts() {
		let base = serve(
			StatusCode::OK,
			json!({
				"candidates": [
					{ "content": { "parts": [{ "text": "Hello, " }, { "text": "reader." }] } },
					{ "content": { "parts": [{ "text": "ignored" }] } }
				]
			}),
		)
		.await;

		let client = GeminiClient::new(Some("key".into()), "gemini", base).unwrap();

		assert_eq!(client.generate("hi").await.unwrap(), "Hello, reader.");
	}

	#[tokio::test]
	async fn test_gemini_errors_are_classified() {
		let base = serve(
			StatusCode::BAD_REQUEST,
			json!({ "error": { "message": "API key not valid. Please pass a valid API key." } }),
		)
		.await;
		let client = GeminiClient::new(Some("key".into()), "gemini", base).unwrap();
		let error = client.generate("hi").await.unwrap_err();

		assert_eq!(Fallback::classify(&error), Fallback::InvalidKey);

		let base = serve(StatusCode::OK, json!({ "candidates": [] })).await;
		let client = GeminiClient::new(Some("key".into()), "gemini", base).unwrap();
		let error = client.generate("hi").await.unwrap_err();

		assert_eq!(Fallback::classify(&error), Fallback::Safety);
	}

	#[tokio::test]
	async fn test_unreachable_service_is_a_network_error() {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let address = listener.local_addr().unwrap();
		drop(listener);

		let client = GeminiClient::new(Some("key".into()), "gemini", format!("http://{address}")).unwrap();
		let error = client.generate("hi").await.unwrap_err();

		assert_eq!(Fallback::classify(&error), Fallback::Network);

		let assistant = Assistant::new(Arc::new(client), "RULES");
		let answer = assistant.ask("hello", None).await;

		assert_eq!(answer.fallback, Some(Fallback::Network));
	}
}
