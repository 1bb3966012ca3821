use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
	CounterStore, Direction, Error, NewPost, NewUser, OrderField, PostPatch, PostQuery, PostStore,
	Result, SessionStore,
};
use crate::model::{LikeState, Post, Session, User};

#[derive(Default)]
struct Tables {
	/// Insertion order is kept so that unordered queries are deterministic.
	posts: Vec<Post>,
	likes: HashSet<(Uuid, String)>,
	visits: HashMap<NaiveDate, i64>,
	users: Vec<User>,
	sessions: HashMap<Uuid, Session>,
}

/// A store that keeps everything in process memory.
///
/// Used when no database is configured and as the backing store in tests.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

fn compare(a: &Post, b: &Post, field: OrderField) -> Ordering {
	match field {
		OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
		OrderField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
		OrderField::IsPinned => a.is_pinned.cmp(&b.is_pinned),
		OrderField::ViewCount => a.view_count.cmp(&b.view_count),
		OrderField::Likes => a.likes.cmp(&b.likes),
	}
}

#[async_trait]
impl PostStore for MemoryStore {
	async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
		let tables = self.tables.read().await;

		let mut posts = tables
			.posts
			.iter()
			.filter(|post| query.accepts(post))
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| {
			query
				.order
				.iter()
				.map(|&(field, direction)| match direction {
					Direction::Ascending => compare(a, b, field),
					Direction::Descending => compare(b, a, field),
				})
				.find(|ordering| ordering.is_ne())
				.unwrap_or(Ordering::Equal)
		});

		if let Some(limit) = query.limit {
			posts.truncate(usize::try_from(limit).unwrap_or(0));
		}

		Ok(posts)
	}

	async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
		let tables = self.tables.read().await;

		Ok(tables.posts.iter().find(|post| post.id == id).cloned())
	}

	async fn insert_post(&self, post: NewPost) -> Result<Post> {
		let now = Utc::now();
		let post = Post {
			id: Uuid::new_v4(),
			title: post.title,
			content: post.content,
			excerpt: post.excerpt,
			created_at: now,
			updated_at: now,
			is_public: post.is_public,
			is_pinned: false,
			status: post.status,
			view_count: 0,
			likes: 0,
			author_id: post.author_id,
			category: post.category,
			subcategory: post.subcategory,
		};

		self.tables.write().await.posts.push(post.clone());

		Ok(post)
	}

	async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>> {
		let mut tables = self.tables.write().await;

		let Some(post) = tables.posts.iter_mut().find(|post| post.id == id) else {
			return Ok(None);
		};

		if patch.touches_content() {
			post.updated_at = Utc::now();
		}

		patch.apply(post);

		Ok(Some(post.clone()))
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool> {
		let mut tables = self.tables.write().await;
		let before = tables.posts.len();

		tables.posts.retain(|post| post.id != id);
		tables.likes.retain(|(post_id, _)| *post_id != id);

		Ok(tables.posts.len() != before)
	}
}

#[async_trait]
impl CounterStore for MemoryStore {
	async fn increment_views(&self, post_id: Uuid) -> Result<i64> {
		let mut tables = self.tables.write().await;
		let post = tables
			.posts
			.iter_mut()
			.find(|post| post.id == post_id)
			.ok_or(Error::UnknownPost(post_id))?;

		post.view_count += 1;

		Ok(post.view_count)
	}

	async fn toggle_like(&self, post_id: Uuid, client_id: &str) -> Result<LikeState> {
		let mut tables = self.tables.write().await;
		let Tables { posts, likes, .. } = &mut *tables;

		let post = posts
			.iter_mut()
			.find(|post| post.id == post_id)
			.ok_or(Error::UnknownPost(post_id))?;

		let key = (post_id, client_id.to_owned());
		let liked = if likes.remove(&key) {
			post.likes = (post.likes - 1).max(0);
			false
		} else {
			likes.insert(key);
			post.likes += 1;
			true
		};

		Ok(LikeState {
			liked,
			likes: post.likes,
		})
	}

	async fn has_liked(&self, post_id: Uuid, client_id: &str) -> Result<bool> {
		let tables = self.tables.read().await;

		Ok(tables.likes.contains(&(post_id, client_id.to_owned())))
	}

	async fn increment_visits(&self, day: NaiveDate) -> Result<i64> {
		let mut tables = self.tables.write().await;
		let count = tables.visits.entry(day).or_insert(0);

		*count += 1;

		Ok(*count)
	}
}

#[async_trait]
impl SessionStore for MemoryStore {
	async fn create_user(&self, user: NewUser) -> Result<User> {
		let mut tables = self.tables.write().await;

		if tables.users.iter().any(|u| u.email == user.email) {
			return Err(Error::Conflict("user_email_key"));
		}

		if tables.users.iter().any(|u| u.username == user.username) {
			return Err(Error::Conflict("user_username_key"));
		}

		let user = User {
			id: user.id,
			email: user.email,
			password: user.password,
			username: user.username,
			created_at: Utc::now(),
		};

		tables.users.push(user.clone());

		Ok(user)
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables.users.iter().find(|u| u.email == email).cloned())
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session> {
		let session = Session {
			id: Uuid::new_v4(),
			user_id,
			created_at: Utc::now(),
		};

		self.tables
			.write()
			.await
			.sessions
			.insert(session.id, session.clone());

		Ok(session)
	}

	async fn delete_session(&self, id: Uuid) -> Result<()> {
		self.tables.write().await.sessions.remove(&id);

		Ok(())
	}

	async fn session_user(&self, id: Uuid) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables
			.sessions
			.get(&id)
			.and_then(|session| tables.users.iter().find(|u| u.id == session.user_id))
			.cloned())
	}
}

#[cfg(test)]
mod test {
	use chrono::NaiveDate;
	use uuid::Uuid;

	use super::MemoryStore;
	use crate::{
		model::Status,
		store::{CounterStore, NewPost, PostPatch, PostQuery, PostStore},
	};

	fn new_post(title: &str, category: &str, is_public: bool) -> NewPost {
		NewPost {
			author_id: Uuid::nil(),
			title: title.into(),
			content: "content".into(),
			excerpt: None,
			category: category.into(),
			subcategory: None,
			status: Status::Published,
			is_public,
		}
	}

	#[tokio::test]
	async fn test_query_filters_and_limit() {
		let store = MemoryStore::new();

		store.insert_post(new_post("a", "Catatan", true)).await.unwrap();
		store.insert_post(new_post("b", "Catatan", false)).await.unwrap();
		store.insert_post(new_post("c", "Catatan", true)).await.unwrap();
		store.insert_post(new_post("d", "Bahasan", true)).await.unwrap();

		let posts = store
			.list_posts(&PostQuery::default().category("Catatan").public(true))
			.await
			.unwrap();
		let titles = posts.iter().map(|p| p.title.as_str()).collect::<Vec<_>>();

		assert_eq!(titles, ["a", "c"]);

		let posts = store
			.list_posts(&PostQuery::default().limit(1))
			.await
			.unwrap();

		assert_eq!(posts.len(), 1);
	}

	#[tokio::test]
	async fn test_update_keeps_counters() {
		let store = MemoryStore::new();
		let post = store.insert_post(new_post("a", "", true)).await.unwrap();

		store.increment_views(post.id).await.unwrap();

		let updated = store
			.update_post(post.id, PostPatch::pinned(true))
			.await
			.unwrap()
			.unwrap();

		assert!(updated.is_pinned);
		assert_eq!(updated.view_count, 1);
		assert_eq!(updated.updated_at, post.updated_at);
	}

	#[tokio::test]
	async fn test_like_toggle_never_negative() {
		let store = MemoryStore::new();
		let post = store.insert_post(new_post("a", "", true)).await.unwrap();

		let state = store.toggle_like(post.id, "client").await.unwrap();
		assert!(state.liked);
		assert_eq!(state.likes, 1);
		assert!(store.has_liked(post.id, "client").await.unwrap());

		let state = store.toggle_like(post.id, "client").await.unwrap();
		assert!(!state.liked);
		assert_eq!(state.likes, 0);
		assert!(!store.has_liked(post.id, "client").await.unwrap());
	}

	#[tokio::test]
	async fn test_visits_count_per_day() {
		let store = MemoryStore::new();
		let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
		let next = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

		assert_eq!(store.increment_visits(day).await.unwrap(), 1);
		assert_eq!(store.increment_visits(day).await.unwrap(), 2);
		assert_eq!(store.increment_visits(next).await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_delete_reports_existence() {
		let store = MemoryStore::new();
		let post = store.insert_post(new_post("a", "", true)).await.unwrap();

		assert!(store.delete_post(post.id).await.unwrap());
		assert!(!store.delete_post(post.id).await.unwrap());
		assert!(store.get_post(post.id).await.unwrap().is_none());
	}
}
