use aide::axum::IntoApiResponse;
use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
};
use macros::route;

use crate::{
	config::Config,
	extract::{Json, Path, Query, Session, Viewed, Viewer, Visitor},
	garden::{
		filter::{CATEGORY_SUGGESTIONS, SUBCATEGORY_SUGGESTIONS},
		Deletion, Filter, Moderator, PostCollection, Tab,
	},
	openapi::tag,
	preferences::Preferences,
	route::model::slug,
	session,
	store::{optional_text, Database, Direction, NewPost, OrderField, PostPatch, PostQuery},
	AppState,
};

use super::{model, Error, RouteError};

/// Most posts returned by the related posts route.
pub const RELATED_LIMIT: i64 = 3;

/// Fetches a post the viewer is allowed to see.
async fn visible_post(
	database: &Database,
	viewer: &Viewer,
	id: uuid::Uuid,
) -> Result<model::Post, RouteError> {
	match database.get_post(id).await? {
		Some(post) if post.is_visible_to(viewer.is_admin()) => Ok(post),
		_ => Err(Error::UnknownPost(id).into()),
	}
}

/// The author's view of a collection, after a moderation action.
fn moderated(posts: &PostCollection, enabled: bool) -> Json<model::Moderated> {
	let filter = Filter::new(true, Tab::All, "");

	Json(model::Moderated {
		enabled,
		posts: posts.view(&filter).into_iter().cloned().collect(),
	})
}

/// List posts
/// Returns the posts of a tab matching an optional search query, pinned posts first and then newest first.
/// Private posts and drafts are only listed for the signed-in author.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(database): State<Database>,
	viewer: Viewer,
	Query(input): Query<model::ListInput>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let posts = PostCollection::fetch(&*database).await?;
	let filter = Filter::new(
		viewer.is_admin(),
		input.tab,
		input.q.as_deref().unwrap_or_default(),
	);

	Ok(Json(posts.view(&filter).into_iter().cloned().collect()))
}

/// Create post
/// Creates a new post written by the signed-in author.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = database
		.insert_post(NewPost {
			author_id: session.user.id,
			title: input.title.trim().to_owned(),
			content: input.content,
			excerpt: optional_text(input.excerpt),
			category: input.category.trim().to_owned(),
			subcategory: optional_text(input.subcategory),
			status: input.status,
			is_public: input.is_public,
		})
		.await?;

	tracing::info!(post = %post.id, status = %post.status, "created post");

	Ok(Json(post))
}

/// Get dashboard stats
/// Counts all posts, public posts, drafts, notes and research posts.
#[route(tag = tag::POST)]
pub async fn get_stats(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<model::Stats>, RouteError> {
	let posts = PostCollection::fetch(&*database).await?;

	Ok(Json(posts.stats()))
}

/// Get editor suggestions
/// Returns the categories and subcategories offered by the editor. Any other value is accepted too.
#[route(tag = tag::POST)]
pub async fn get_suggestions(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<model::Suggestions>, RouteError> {
	let posts = PostCollection::fetch(&*database).await?;
	let mut subcategories = SUBCATEGORY_SUGGESTIONS.map(String::from).to_vec();

	for sub in posts.subcategories() {
		if !SUBCATEGORY_SUGGESTIONS.contains(&sub) {
			subcategories.push(sub.to_owned());
		}
	}

	Ok(Json(model::Suggestions {
		categories: CATEGORY_SUGGESTIONS.map(String::from).to_vec(),
		subcategories,
	}))
}

/// Get single post
/// Returns a post with its reading time and whether this browser liked it.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	viewer: Viewer,
	visitor: Visitor,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::PostDetail>, RouteError> {
	let post = visible_post(&database, &viewer, path.id).await?;
	let liked = !visitor.is_new && database.has_liked(post.id, &visitor.id).await?;

	Ok(Json(model::PostDetail {
		reading_minutes: post.reading_minutes(),
		liked,
		post,
	}))
}

/// Update post
/// Partially updates a post. Omitted fields are left unchanged and counters cannot be changed.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(database): State<Database>,
	_session: Session,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::UpdatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	if input.is_empty() {
		return Err(Error::EmptyUpdate.into());
	}

	let post = database
		.update_post(path.id, PostPatch::from(input))
		.await?
		.ok_or(Error::UnknownPost(path.id))?;

	tracing::info!(post = %post.id, "updated post");

	Ok(Json(post))
}

/// Delete post
/// Permanently deletes a post. Without `confirm=true` nothing is deleted and the
/// localized confirmation dialog is returned with status 428.
#[route(tag = tag::POST, response(status = 204, description = "The post was deleted."))]
pub async fn delete_post(
	State(database): State<Database>,
	_session: Session,
	preferences: Preferences,
	Path(path): Path<model::IdInput>,
	Query(input): Query<model::DeleteInput>,
) -> Result<StatusCode, RouteError> {
	let mut posts = PostCollection::fetch(&*database).await?;
	let moderator = Moderator::new(&*database, preferences.language);

	match moderator.delete(&mut posts, path.id, &input.confirm).await? {
		Deletion::Deleted(..) => Ok(StatusCode::NO_CONTENT),
		Deletion::Cancelled(dialog) => Err(Error::ConfirmationRequired(dialog).into()),
	}
}

/// Toggle visibility
/// Makes a public post private or a private post public.
#[route(tag = tag::POST)]
pub async fn toggle_visibility(
	State(database): State<Database>,
	_session: Session,
	preferences: Preferences,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Moderated>, RouteError> {
	let mut posts = PostCollection::fetch(&*database).await?;
	let is_public = Moderator::new(&*database, preferences.language)
		.toggle_visibility(&mut posts, path.id)
		.await?;

	Ok(moderated(&posts, is_public))
}

/// Toggle pin
/// Pins a post above all others, or unpins it.
#[route(tag = tag::POST)]
pub async fn toggle_pin(
	State(database): State<Database>,
	_session: Session,
	preferences: Preferences,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Moderated>, RouteError> {
	let mut posts = PostCollection::fetch(&*database).await?;
	let is_pinned = Moderator::new(&*database, preferences.language)
		.toggle_pin(&mut posts, path.id)
		.await?;

	Ok(moderated(&posts, is_pinned))
}

/// Count view
/// Counts a view of a post, at most once per post and visit.
#[route(tag = tag::STATS, response(status = 200, shape = "Json<model::ViewCount>"))]
pub async fn view_post(
	State(database): State<Database>,
	viewer: Viewer,
	Viewed(mut viewed): Viewed,
	Path(path): Path<model::IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = visible_post(&database, &viewer, path.id).await?;

	if viewed.contains(path.id) {
		return Ok(Json(model::ViewCount {
			counted: false,
			view_count: post.view_count,
		})
		.into_response());
	}

	let view_count = database.increment_views(path.id).await?;
	viewed.insert(path.id);

	Ok((
		[(header::SET_COOKIE, session::viewed_cookie(&viewed).to_string())],
		Json(model::ViewCount {
			counted: true,
			view_count,
		}),
	)
		.into_response())
}

/// Toggle like
/// Likes a post for this browser, or takes an existing like back.
#[route(tag = tag::STATS, response(status = 200, shape = "Json<model::LikeState>"))]
pub async fn like_post(
	State(database): State<Database>,
	viewer: Viewer,
	visitor: Visitor,
	Path(path): Path<model::IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	visible_post(&database, &viewer, path.id).await?;

	let state = database.toggle_like(path.id, &visitor.id).await?;

	if visitor.is_new {
		return Ok((
			[(header::SET_COOKIE, visitor.cookie().to_string())],
			Json(state),
		)
			.into_response());
	}

	Ok(Json(state).into_response())
}

/// Get related posts
/// Returns up to three public posts of the same category, newest first.
#[route(tag = tag::POST)]
pub async fn get_related(
	State(database): State<Database>,
	viewer: Viewer,
	Path(path): Path<model::IdInput>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let post = visible_post(&database, &viewer, path.id).await?;
	let query = PostQuery::default()
		.category(post.category)
		.public(true)
		.status(model::Status::Published)
		.exclude(post.id)
		.order_by(OrderField::CreatedAt, Direction::Descending)
		.limit(RELATED_LIMIT);

	Ok(Json(database.list_posts(&query).await?))
}

/// Export markdown
/// Downloads a post as a markdown document with a title, author, date and link header.
#[route(tag = tag::POST, response(status = 200, description = "The markdown document.", shape = "String"))]
pub async fn export_markdown(
	State(database): State<Database>,
	State(config): State<std::sync::Arc<Config>>,
	viewer: Viewer,
	Path(path): Path<model::IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = visible_post(&database, &viewer, path.id).await?;
	let body = post.to_markdown(&config.site_author, &config.post_url(post.id));

	Ok((
		[
			(header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_owned()),
			(
				header::CONTENT_DISPOSITION,
				format!("attachment; filename=\"{}.md\"", slug(&post.title)),
			),
		],
		body,
	)
		.into_response())
}
