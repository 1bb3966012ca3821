use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{
	CounterStore, Direction, Error, NewPost, NewUser, PostPatch, PostQuery, PostStore, Result,
	SessionStore,
};
use crate::model::{LikeState, Post, Session, Status, UnknownStatus, User};

/// A store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	/// Connects to the database and applies pending migrations.
	pub async fn connect(url: &str) -> Result<Self> {
		let pool = PgPool::connect(url).await?;

		sqlx::migrate!().run(&pool).await?;

		Ok(Self { pool })
	}
}

impl<'r> FromRow<'r, PgRow> for Post {
	fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
		let status = row
			.try_get::<&str, _>("status")?
			.parse::<Status>()
			.map_err(|e: UnknownStatus| sqlx::Error::ColumnDecode {
				index: "status".into(),
				source: Box::new(e),
			})?;

		Ok(Self {
			id: row.try_get("id")?,
			title: row.try_get("title")?,
			content: row.try_get("content")?,
			excerpt: row.try_get("excerpt")?,
			created_at: row.try_get("created_at")?,
			updated_at: row.try_get("updated_at")?,
			is_public: row.try_get("is_public")?,
			is_pinned: row.try_get("is_pinned")?,
			status,
			view_count: row.try_get("view_count")?,
			likes: row.try_get("likes")?,
			author_id: row.try_get("author_id")?,
			category: row.try_get("category")?,
			subcategory: row.try_get("subcategory")?,
		})
	}
}

#[async_trait]
impl PostStore for PgStore {
	async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
		let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM post WHERE TRUE");

		if let Some(category) = &query.category {
			builder.push(" AND category = ").push_bind(category.as_str());
		}

		if let Some(is_public) = query.is_public {
			builder.push(" AND is_public = ").push_bind(is_public);
		}

		if let Some(status) = query.status {
			builder.push(" AND status = ").push_bind(status.as_str());
		}

		if let Some(id) = query.exclude {
			builder.push(" AND id <> ").push_bind(id);
		}

		if !query.order.is_empty() {
			builder.push(" ORDER BY ");

			let mut columns = builder.separated(", ");
			for (field, direction) in &query.order {
				let direction = match direction {
					Direction::Ascending => "ASC",
					Direction::Descending => "DESC",
				};

				columns.push(format!("{} {direction}", field.column()));
			}
		}

		if let Some(limit) = query.limit {
			builder.push(" LIMIT ").push_bind(limit);
		}

		let posts = builder
			.build_query_as::<Post>()
			.fetch_all(&self.pool)
			.await?;

		Ok(posts)
	}

	async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post)
	}

	async fn insert_post(&self, post: NewPost) -> Result<Post> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (author_id, title, content, excerpt, category, subcategory, status, is_public)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
				RETURNING *
			"#,
		)
		.bind(post.author_id)
		.bind(post.title)
		.bind(post.content)
		.bind(post.excerpt)
		.bind(post.category)
		.bind(post.subcategory)
		.bind(post.status.as_str())
		.bind(post.is_public)
		.fetch_one(&self.pool)
		.await?;

		Ok(post)
	}

	async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>> {
		let touches_content = patch.touches_content();

		let post = sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET title = COALESCE($1, title),
					content = COALESCE($2, content),
					excerpt = CASE WHEN $3 THEN $4 ELSE excerpt END,
					category = COALESCE($5, category),
					subcategory = CASE WHEN $6 THEN $7 ELSE subcategory END,
					status = COALESCE($8, status),
					is_public = COALESCE($9, is_public),
					is_pinned = COALESCE($10, is_pinned),
					updated_at = CASE WHEN $11 THEN now() ELSE updated_at END
				WHERE id = $12
				RETURNING *
			"#,
		)
		.bind(patch.title)
		.bind(patch.content)
		.bind(patch.excerpt.is_some())
		.bind(patch.excerpt.flatten())
		.bind(patch.category)
		.bind(patch.subcategory.is_some())
		.bind(patch.subcategory.flatten())
		.bind(patch.status.map(Status::as_str))
		.bind(patch.is_public)
		.bind(patch.is_pinned)
		.bind(touches_content)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(post)
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool> {
		let status = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}
}

#[async_trait]
impl CounterStore for PgStore {
	async fn increment_views(&self, post_id: Uuid) -> Result<i64> {
		let count = sqlx::query_scalar::<_, i64>(
			"UPDATE post SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
		)
		.bind(post_id)
		.fetch_optional(&self.pool)
		.await?;

		count.ok_or(Error::UnknownPost(post_id))
	}

	async fn toggle_like(&self, post_id: Uuid, client_id: &str) -> Result<LikeState> {
		let mut tx = self.pool.begin().await?;

		// Concurrent toggles of one post queue here, so the like log and the
		// counter are always read after the previous toggle committed
		sqlx::query("SELECT 1 FROM post WHERE id = $1 FOR UPDATE")
			.bind(post_id)
			.fetch_optional(&mut *tx)
			.await?
			.ok_or(Error::UnknownPost(post_id))?;

		let removed = sqlx::query("DELETE FROM post_like WHERE post_id = $1 AND client_id = $2")
			.bind(post_id)
			.bind(client_id)
			.execute(&mut *tx)
			.await?
			.rows_affected()
			> 0;

		let likes = if removed {
			sqlx::query_scalar::<_, i64>(
				"UPDATE post SET likes = GREATEST(likes - 1, 0) WHERE id = $1 RETURNING likes",
			)
			.bind(post_id)
			.fetch_optional(&mut *tx)
			.await?
		} else {
			let likes = sqlx::query_scalar::<_, i64>(
				"UPDATE post SET likes = likes + 1 WHERE id = $1 RETURNING likes",
			)
			.bind(post_id)
			.fetch_optional(&mut *tx)
			.await?;

			if likes.is_some() {
				sqlx::query(
					"INSERT INTO post_like (post_id, client_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
				)
				.bind(post_id)
				.bind(client_id)
				.execute(&mut *tx)
				.await?;
			}

			likes
		};

		// Dropping the transaction rolls it back
		let likes = likes.ok_or(Error::UnknownPost(post_id))?;

		tx.commit().await?;

		Ok(LikeState {
			liked: !removed,
			likes,
		})
	}

	async fn has_liked(&self, post_id: Uuid, client_id: &str) -> Result<bool> {
		let liked = sqlx::query_scalar::<_, bool>(
			"SELECT EXISTS (SELECT 1 FROM post_like WHERE post_id = $1 AND client_id = $2)",
		)
		.bind(post_id)
		.bind(client_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(liked)
	}

	async fn increment_visits(&self, day: NaiveDate) -> Result<i64> {
		let count = sqlx::query_scalar::<_, i64>(
			r#"
				INSERT INTO daily_visit (day, count) VALUES ($1, 1)
				ON CONFLICT (day) DO UPDATE SET count = daily_visit.count + 1
				RETURNING count
			"#,
		)
		.bind(day)
		.fetch_one(&self.pool)
		.await?;

		Ok(count)
	}
}

#[async_trait]
impl SessionStore for PgStore {
	async fn create_user(&self, user: NewUser) -> Result<User> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, email, username, password) VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(user.email)
		.bind(user.username)
		.bind(user.password)
		.fetch_one(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d) => match d.constraint() {
				Some("user_email_key") => Error::Conflict("user_email_key"),
				Some("user_username_key") => Error::Conflict("user_username_key"),
				_ => Error::from(e),
			},
			e => Error::from(e),
		})
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		Ok(user)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session> {
		let session =
			sqlx::query_as::<_, Session>("INSERT INTO session (user_id) VALUES ($1) RETURNING *")
				.bind(user_id)
				.fetch_one(&self.pool)
				.await?;

		Ok(session)
	}

	async fn delete_session(&self, id: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn session_user(&self, id: Uuid) -> Result<Option<User>> {
		let user = sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(user)
	}
}
