use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	error,
	garden::{moderation, ConfirmDialog},
	AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown_post")]
	UnknownPost(Uuid),
	#[error("confirmation_required")]
	ConfirmationRequired(ConfirmDialog),
	#[error("empty_update")]
	EmptyUpdate,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route("/stats", get_with(get_stats, get_stats_docs))
		.api_route("/suggestions", get_with(get_suggestions, get_suggestions_docs))
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route(
			"/:id/visibility",
			post_with(toggle_visibility, toggle_visibility_docs),
		)
		.api_route("/:id/pin", post_with(toggle_pin, toggle_pin_docs))
		.api_route("/:id/view", post_with(view_post, view_post_docs))
		.api_route("/:id/like", post_with(like_post, like_post_docs))
		.api_route("/:id/related", get_with(get_related, get_related_docs))
		.api_route("/:id/markdown", get_with(export_markdown, export_markdown_docs))
}

impl From<moderation::Error> for RouteError {
	fn from(error: moderation::Error) -> Self {
		match error {
			moderation::Error::UnknownPost(id) => Error::UnknownPost(id).into(),
			moderation::Error::Store(error) => error.into(),
		}
	}
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::ConfirmationRequired(..) => StatusCode::PRECONDITION_REQUIRED,
			Self::EmptyUpdate => StatusCode::BAD_REQUEST,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownPost(id) => message
				.content("The post you requested does not exist.")
				.detail("post", id.to_string()),
			Self::ConfirmationRequired(dialog) => {
				let content = dialog.message.clone();

				message
					.content(content)
					.detail("dialog", serde_json::to_value(dialog).unwrap_or_default())
			}
			Self::EmptyUpdate => message.content("The update does not change any field."),
		}
		.into_vec()
	}
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use crate::test::*;

	async fn seed(server: &TestServer) -> Vec<Value> {
		login(server).await;

		let notes = create_post(
			server,
			json!({ "title": "Garden notes", "content": "Seeds and soil", "category": "Catatan", "is_public": true }),
		)
		.await;
		let research = create_post(
			server,
			json!({ "title": "Filtration study", "content": "Sand filters", "category": "Penelitian", "subcategory": "Water Treatment", "is_public": false }),
		)
		.await;
		let draft = create_post(
			server,
			json!({ "title": "Unfinished", "content": "", "category": "Catatan", "is_public": true, "status": "draft" }),
		)
		.await;

		vec![notes, research, draft]
	}

	fn titles(response: &Value) -> Vec<&str> {
		response
			.as_array()
			.unwrap()
			.iter()
			.map(|post| post["title"].as_str().unwrap())
			.collect()
	}

	#[tokio::test]
	async fn test_listing_hides_private_and_drafts() {
		let (server, _) = app().await;
		seed(&server).await;

		let admin = server.get("/posts").await.json::<Value>();
		assert_eq!(titles(&admin), ["Unfinished", "Filtration study", "Garden notes"]);

		server.get("/auth/logout").await;

		let anonymous = server.get("/posts").await.json::<Value>();
		assert_eq!(titles(&anonymous), ["Garden notes"]);

		let drafts = server
			.get("/posts")
			.add_query_param("tab", "drafts")
			.await
			.json::<Value>();
		assert!(drafts.as_array().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_listing_tabs_and_search() {
		let (server, _) = app().await;
		seed(&server).await;

		let research = server
			.get("/posts")
			.add_query_param("tab", "research")
			.await
			.json::<Value>();
		assert_eq!(titles(&research), ["Filtration study"]);

		let drafts = server
			.get("/posts")
			.add_query_param("tab", "drafts")
			.await
			.json::<Value>();
		assert_eq!(titles(&drafts), ["Unfinished"]);

		let search = server
			.get("/posts")
			.add_query_param("q", "WATER")
			.await
			.json::<Value>();
		assert_eq!(titles(&search), ["Filtration study"]);

		let blank = server
			.get("/posts")
			.add_query_param("q", "   ")
			.await
			.json::<Value>();
		assert_eq!(titles(&blank).len(), 3);
	}

	#[tokio::test]
	async fn test_editing_requires_session() {
		let (server, _) = app().await;

		let response = server
			.post("/posts")
			.json(&json!({ "title": "Nope", "content": "", "is_public": true }))
			.await;
		assert_eq!(response.status_code(), 401);

		let response = server.get("/posts/stats").await;
		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_create_ignores_counters() {
		let (server, _) = app().await;
		login(&server).await;

		let post = create_post(
			&server,
			json!({ "title": "Counted", "content": "", "is_public": true, "view_count": 99, "likes": 7, "is_pinned": true }),
		)
		.await;

		assert_eq!(post["view_count"], 0);
		assert_eq!(post["likes"], 0);
		assert_eq!(post["is_pinned"], false);
		assert_eq!(post["status"], "published");
	}

	#[tokio::test]
	async fn test_blank_title_is_rejected() {
		let (server, _) = app().await;
		login(&server).await;

		let response = server
			.post("/posts")
			.json(&json!({ "title": "   ", "content": "", "is_public": true }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "title");
	}

	#[tokio::test]
	async fn test_private_post_is_not_found_for_readers() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let research = posts[1]["id"].as_str().unwrap();

		let response = server.get(&format!("/posts/{research}")).await;
		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["liked"], false);

		server.get("/auth/logout").await;

		let response = server.get(&format!("/posts/{research}")).await;
		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<Value>()["errors"][0]["code"], "unknown_post");
	}

	#[tokio::test]
	async fn test_update_post() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let id = posts[0]["id"].as_str().unwrap();

		let response = server.put(&format!("/posts/{id}")).json(&json!({})).await;
		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["errors"][0]["code"], "empty_update");

		let response = server
			.put(&format!("/posts/{id}"))
			.json(&json!({ "title": "Garden notes, revised", "excerpt": "Now with compost" }))
			.await;
		assert_eq!(response.status_code(), 200);

		let post = response.json::<Value>();
		assert_eq!(post["title"], "Garden notes, revised");
		assert_eq!(post["excerpt"], "Now with compost");
		assert_eq!(post["content"], "Seeds and soil");

		let response = server
			.put(&format!("/posts/{}", Uuid::nil()))
			.json(&json!({ "title": "Ghost" }))
			.await;
		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_update_trims_and_clears_text() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let id = posts[1]["id"].as_str().unwrap();

		let response = server
			.put(&format!("/posts/{id}"))
			.json(&json!({ "title": "  Filtration, part two ", "category": " Penelitian ", "excerpt": "Sand" }))
			.await;
		assert_eq!(response.status_code(), 200);

		let post = response.json::<Value>();
		assert_eq!(post["title"], "Filtration, part two");
		assert_eq!(post["category"], "Penelitian");
		assert_eq!(post["excerpt"], "Sand");

		let post = server
			.put(&format!("/posts/{id}"))
			.json(&json!({ "excerpt": "", "subcategory": "  " }))
			.await
			.json::<Value>();
		assert_eq!(post["excerpt"], Value::Null);
		assert_eq!(post["subcategory"], Value::Null);
		assert_eq!(post["title"], "Filtration, part two");
	}

	#[tokio::test]
	async fn test_delete_requires_confirmation() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let id = posts[0]["id"].as_str().unwrap();

		let response = server
			.delete(&format!("/posts/{id}"))
			.add_cookie(cookie::Cookie::new("lang", "id"))
			.await;
		assert_eq!(response.status_code(), 428);

		let dialog = &response.json::<Value>()["errors"][0]["details"]["dialog"];
		assert_eq!(dialog["confirm_text"], "Hapus");
		assert_eq!(dialog["kind"], "danger");

		assert_eq!(server.get(&format!("/posts/{id}")).await.status_code(), 200);

		let response = server
			.delete(&format!("/posts/{id}"))
			.add_query_param("confirm", true)
			.await;
		assert_eq!(response.status_code(), 204);

		assert_eq!(server.get(&format!("/posts/{id}")).await.status_code(), 404);

		let response = server
			.delete(&format!("/posts/{id}"))
			.add_query_param("confirm", true)
			.await;
		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_toggle_pin_reorders_listing() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let notes = posts[0]["id"].as_str().unwrap();

		let response = server.post(&format!("/posts/{notes}/pin")).await;
		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();
		assert_eq!(body["enabled"], true);
		assert_eq!(
			titles(&body["posts"]),
			["Garden notes", "Unfinished", "Filtration study"]
		);

		let body = server
			.post(&format!("/posts/{notes}/pin"))
			.await
			.json::<Value>();
		assert_eq!(body["enabled"], false);
		assert_eq!(
			titles(&body["posts"]),
			["Unfinished", "Filtration study", "Garden notes"]
		);
	}

	#[tokio::test]
	async fn test_toggle_visibility() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let research = posts[1]["id"].as_str().unwrap();

		let body = server
			.post(&format!("/posts/{research}/visibility"))
			.await
			.json::<Value>();
		assert_eq!(body["enabled"], true);

		server.get("/auth/logout").await;

		let anonymous = server.get("/posts").await.json::<Value>();
		assert_eq!(titles(&anonymous), ["Filtration study", "Garden notes"]);
	}

	#[tokio::test]
	async fn test_views_are_counted_once_per_visit() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let id = posts[0]["id"].as_str().unwrap();

		let first = server.post(&format!("/posts/{id}/view")).await.json::<Value>();
		assert_eq!(first["counted"], true);
		assert_eq!(first["view_count"], 1);

		let second = server.post(&format!("/posts/{id}/view")).await.json::<Value>();
		assert_eq!(second["counted"], false);
		assert_eq!(second["view_count"], 1);

		let response = server.post(&format!("/posts/{}/view", Uuid::nil())).await;
		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_like_toggles_for_visitor() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let id = posts[0]["id"].as_str().unwrap();

		let response = server.post(&format!("/posts/{id}/like")).await;
		assert!(response.maybe_cookie("visitor").is_some());
		assert_eq!(response.json::<Value>(), json!({ "liked": true, "likes": 1 }));

		let post = server.get(&format!("/posts/{id}")).await.json::<Value>();
		assert_eq!(post["liked"], true);

		let response = server.post(&format!("/posts/{id}/like")).await;
		assert_eq!(response.json::<Value>(), json!({ "liked": false, "likes": 0 }));
	}

	#[tokio::test]
	async fn test_hidden_posts_cannot_be_counted_by_readers() {
		let (server, _) = app().await;
		let posts = seed(&server).await;

		server.get("/auth/logout").await;

		for post in &posts[1..] {
			let id = post["id"].as_str().unwrap();

			let response = server.post(&format!("/posts/{id}/view")).await;
			assert_eq!(response.status_code(), 404);

			let response = server.post(&format!("/posts/{id}/like")).await;
			assert_eq!(response.status_code(), 404);
		}

		login(&server).await;

		let id = posts[2]["id"].as_str().unwrap();
		let post = server.get(&format!("/posts/{id}")).await.json::<Value>();
		assert_eq!(post["view_count"], 0);
		assert_eq!(post["likes"], 0);
	}

	#[tokio::test]
	async fn test_related_posts() {
		let (server, _) = app().await;
		login(&server).await;

		let mut ids = Vec::new();

		for n in 0..5 {
			let post = create_post(
				&server,
				json!({ "title": format!("Note {n}"), "content": "", "category": "Catatan", "is_public": n != 1 }),
			)
			.await;

			ids.push(post["id"].as_str().unwrap().to_owned());
		}

		let related = server
			.get(&format!("/posts/{}/related", ids[0]))
			.await
			.json::<Value>();

		assert_eq!(titles(&related), ["Note 4", "Note 3", "Note 2"]);
	}

	#[tokio::test]
	async fn test_stats_and_suggestions() {
		let (server, _) = app().await;
		seed(&server).await;

		let stats = server.get("/posts/stats").await.json::<Value>();
		assert_eq!(
			stats,
			json!({ "total": 3, "public": 2, "drafts": 1, "notes": 2, "research": 1 })
		);

		let suggestions = server.get("/posts/suggestions").await.json::<Value>();
		assert_eq!(suggestions["categories"][0], "Catatan");

		let subcategories = suggestions["subcategories"].as_array().unwrap();
		assert_eq!(
			subcategories
				.iter()
				.filter(|sub| *sub == "Water Treatment")
				.count(),
			1
		);
	}

	#[tokio::test]
	async fn test_markdown_export() {
		let (server, _) = app().await;
		let posts = seed(&server).await;
		let id = posts[0]["id"].as_str().unwrap();

		let response = server.get(&format!("/posts/{id}/markdown")).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.header("content-disposition"),
			"attachment; filename=\"garden-notes.md\""
		);
		assert!(response.text().starts_with("# Garden notes\n\nAuthor: Tester\n"));
		assert!(response.text().ends_with("Seeds and soil"));
	}
}
