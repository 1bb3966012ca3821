use aide::axum::{routing::post_with, ApiRouter, IntoApiResponse};
use axum::{extract::State, http::header, response::IntoResponse};
use chrono::Utc;
use macros::route;
use schemars::JsonSchema;
use serde::Serialize;

use crate::{
	error::AppError,
	extract::{Json, LastVisit},
	openapi::tag,
	session,
	store::Database,
	AppState,
};

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().api_route("/", post_with(count_visit, count_visit_docs))
}

#[derive(Serialize, JsonSchema)]
pub struct VisitCount {
	/// Whether this request incremented the counter.
	pub counted: bool,
	/// Visits counted today, known only when this request was counted.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub today: Option<i64>,
}

/// Count visit
/// Counts a site visit, at most once per visit and day.
#[route(tag = tag::STATS, response(status = 200, shape = "Json<VisitCount>"))]
pub async fn count_visit(
	State(database): State<Database>,
	LastVisit(last): LastVisit,
) -> Result<impl IntoApiResponse, AppError> {
	let today = Utc::now().date_naive();

	if last == Some(today) {
		return Ok(Json(VisitCount {
			counted: false,
			today: None,
		})
		.into_response());
	}

	let count = database.increment_visits(today).await?;

	tracing::debug!(%today, count, "counted visit");

	Ok((
		[(header::SET_COOKIE, session::visited_cookie(today).to_string())],
		Json(VisitCount {
			counted: true,
			today: Some(count),
		}),
	)
		.into_response())
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_visit_is_counted_once() {
		let (server, _) = app().await;

		let first = server.post("/visits").await.json::<Value>();
		assert_eq!(first, json!({ "counted": true, "today": 1 }));

		let second = server.post("/visits").await.json::<Value>();
		assert_eq!(second, json!({ "counted": false }));
	}

	#[tokio::test]
	async fn test_stale_visit_cookie_is_counted() {
		let (server, _) = app().await;

		let response = server
			.post("/visits")
			.add_cookie(cookie::Cookie::new("visited", "2001-01-01"))
			.await
			.json::<Value>();

		assert_eq!(response["counted"], true);
	}
}
