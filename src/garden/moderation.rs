use uuid::Uuid;

use super::{
	collection::PostCollection,
	dialog::{Confirm, ConfirmDialog},
};
use crate::{
	model::Post,
	preferences::Language,
	store::{self, PostPatch, PostStore},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The post is not part of the fetched collection.
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error(transparent)]
	Store(#[from] store::Error),
}

/// Outcome of a delete request.
#[derive(Debug)]
pub enum Deletion {
	Deleted(Post),
	/// The prompt was declined; nothing changed.
	Cancelled(ConfirmDialog),
}

/// Applies admin actions to a fetched collection, optimistically.
///
/// Every mutation is applied locally first and then sent to the store. If the
/// store rejects it, the collection is put back exactly as it was.
pub struct Moderator<'s, S: ?Sized> {
	store: &'s S,
	language: Language,
}

impl<'s, S> Moderator<'s, S>
where
	S: PostStore + ?Sized,
{
	pub fn new(store: &'s S, language: Language) -> Self {
		Self { store, language }
	}

	async fn commit(&self, id: Uuid, patch: PostPatch) -> Result<(), Error> {
		match self.store.update_post(id, patch).await? {
			Some(_) => Ok(()),
			None => Err(Error::UnknownPost(id)),
		}
	}

	/// Flips the public flag, returning the new value.
	pub async fn toggle_visibility(
		&self,
		posts: &mut PostCollection,
		id: Uuid,
	) -> Result<bool, Error> {
		let post = posts.get_mut(id).ok_or(Error::UnknownPost(id))?;
		let snapshot = post.clone();

		post.is_public = !post.is_public;
		let is_public = post.is_public;

		if let Err(error) = self.commit(id, PostPatch::visibility(is_public)).await {
			tracing::warn!(%id, %error, "reverting visibility change");

			posts.restore(snapshot);
			return Err(error);
		}

		tracing::info!(%id, is_public, "changed post visibility");

		Ok(is_public)
	}

	/// Flips the pinned flag and re-sorts the collection, returning the new value.
	pub async fn toggle_pin(&self, posts: &mut PostCollection, id: Uuid) -> Result<bool, Error> {
		if posts.get(id).is_none() {
			return Err(Error::UnknownPost(id));
		}

		let snapshot = posts.clone();
		let post = posts.get_mut(id).ok_or(Error::UnknownPost(id))?;

		post.is_pinned = !post.is_pinned;
		let is_pinned = post.is_pinned;

		posts.sort();

		if let Err(error) = self.commit(id, PostPatch::pinned(is_pinned)).await {
			tracing::warn!(%id, %error, "reverting pin change");

			*posts = snapshot;
			return Err(error);
		}

		tracing::info!(%id, is_pinned, "changed post pin");

		Ok(is_pinned)
	}

	/// Permanently deletes a post once `confirm` accepts the prompt.
	///
	/// The post leaves the collection only after the store has deleted it.
	pub async fn delete<C>(
		&self,
		posts: &mut PostCollection,
		id: Uuid,
		confirm: &C,
	) -> Result<Deletion, Error>
	where
		C: Confirm + ?Sized,
	{
		let post = posts.get(id).ok_or(Error::UnknownPost(id))?;
		let dialog = ConfirmDialog::delete_post(self.language, &post.title);

		if !confirm.confirm(&dialog).await {
			return Ok(Deletion::Cancelled(dialog));
		}

		if !self.store.delete_post(id).await? {
			tracing::warn!(%id, "post was already gone from the store");
		}

		let post = posts.remove(id).ok_or(Error::UnknownPost(id))?;

		tracing::info!(%id, "deleted post");

		Ok(Deletion::Deleted(post))
	}
}

#[cfg(test)]
mod test {
	use std::sync::atomic::{AtomicBool, Ordering};

	use async_trait::async_trait;
	use uuid::Uuid;

	use super::{Deletion, Error, Moderator};
	use crate::{
		garden::{
			collection::PostCollection,
			dialog::{Confirm, ConfirmDialog},
			filter::{Filter, Tab},
		},
		model::{Post, Status},
		preferences::Language,
		store::{self, MemoryStore, NewPost, PostPatch, PostQuery, PostStore},
	};

	/// A store that refuses every write.
	struct FailingStore(MemoryStore);

	#[async_trait]
	impl PostStore for FailingStore {
		async fn list_posts(&self, query: &PostQuery) -> store::Result<Vec<Post>> {
			self.0.list_posts(query).await
		}

		async fn get_post(&self, id: Uuid) -> store::Result<Option<Post>> {
			self.0.get_post(id).await
		}

		async fn insert_post(&self, post: NewPost) -> store::Result<Post> {
			self.0.insert_post(post).await
		}

		async fn update_post(&self, _: Uuid, _: PostPatch) -> store::Result<Option<Post>> {
			Err(sqlx::Error::PoolTimedOut.into())
		}

		async fn delete_post(&self, _: Uuid) -> store::Result<bool> {
			Err(sqlx::Error::PoolTimedOut.into())
		}
	}

	/// Records whether it was asked, then answers with a fixed value.
	struct Prompt {
		answer: bool,
		asked: AtomicBool,
	}

	impl Prompt {
		fn new(answer: bool) -> Self {
			Self {
				answer,
				asked: AtomicBool::new(false),
			}
		}
	}

	#[async_trait]
	impl Confirm for Prompt {
		async fn confirm(&self, _dialog: &ConfirmDialog) -> bool {
			self.asked.store(true, Ordering::SeqCst);
			self.answer
		}
	}

	async fn seed(store: &MemoryStore) -> Vec<Post> {
		let mut posts = Vec::new();

		for (title, category) in [("first", "Catatan"), ("second", "Penelitian"), ("third", "Bahasan")] {
			posts.push(
				store
					.insert_post(NewPost {
						author_id: Uuid::nil(),
						title: title.into(),
						content: String::new(),
						excerpt: None,
						category: category.into(),
						subcategory: None,
						status: Status::Published,
						is_public: true,
					})
					.await
					.unwrap(),
			);

			// Distinct creation times keep the expected order independent of ties
			tokio::time::sleep(std::time::Duration::from_millis(2)).await;
		}

		posts
	}

	fn order(posts: &PostCollection) -> Vec<(Uuid, bool, bool)> {
		posts
			.iter()
			.map(|p| (p.id, p.is_pinned, p.is_public))
			.collect()
	}

	#[tokio::test]
	async fn test_toggle_visibility_persists() {
		let store = MemoryStore::new();
		let seeded = seed(&store).await;
		let mut posts = PostCollection::fetch(&store).await.unwrap();
		let moderator = Moderator::new(&store, Language::En);

		let is_public = moderator
			.toggle_visibility(&mut posts, seeded[0].id)
			.await
			.unwrap();

		assert!(!is_public);
		assert!(!posts.get(seeded[0].id).unwrap().is_public);
		assert!(!store.get_post(seeded[0].id).await.unwrap().unwrap().is_public);

		let public = posts.view(&Filter::new(false, Tab::All, ""));
		assert!(public.iter().all(|p| p.id != seeded[0].id));
	}

	#[tokio::test]
	async fn test_toggle_pin_twice_is_identity() {
		let store = MemoryStore::new();
		let seeded = seed(&store).await;
		let mut posts = PostCollection::fetch(&store).await.unwrap();
		let before = order(&posts);
		let moderator = Moderator::new(&store, Language::En);

		assert!(moderator.toggle_pin(&mut posts, seeded[0].id).await.unwrap());
		assert_eq!(posts.iter().next().unwrap().id, seeded[0].id);

		assert!(!moderator.toggle_pin(&mut posts, seeded[0].id).await.unwrap());
		assert_eq!(order(&posts), before);
	}

	#[tokio::test]
	async fn test_failed_writes_roll_back() {
		let inner = MemoryStore::new();
		let seeded = seed(&inner).await;
		let store = FailingStore(inner);
		let mut posts = PostCollection::fetch(&store).await.unwrap();
		let before = order(&posts);
		let moderator = Moderator::new(&store, Language::En);

		let result = moderator.toggle_visibility(&mut posts, seeded[1].id).await;
		assert!(matches!(result, Err(Error::Store(..))));
		assert_eq!(order(&posts), before);

		let result = moderator.toggle_pin(&mut posts, seeded[0].id).await;
		assert!(matches!(result, Err(Error::Store(..))));
		assert_eq!(order(&posts), before);

		let result = moderator
			.delete(&mut posts, seeded[2].id, &true)
			.await;
		assert!(matches!(result, Err(Error::Store(..))));
		assert_eq!(order(&posts), before);
	}

	#[tokio::test]
	async fn test_delete_requires_confirmation() {
		let store = MemoryStore::new();
		let seeded = seed(&store).await;
		let mut posts = PostCollection::fetch(&store).await.unwrap();
		let moderator = Moderator::new(&store, Language::Id);

		let declined = Prompt::new(false);
		let result = moderator
			.delete(&mut posts, seeded[0].id, &declined)
			.await
			.unwrap();

		let Deletion::Cancelled(dialog) = result else {
			panic!("expected the deletion to be cancelled");
		};
		assert_eq!(dialog.confirm_text, "Hapus");
		assert!(declined.asked.load(Ordering::SeqCst));
		assert_eq!(posts.len(), 3);

		let accepted = Prompt::new(true);
		let result = moderator
			.delete(&mut posts, seeded[0].id, &accepted)
			.await
			.unwrap();

		assert!(matches!(result, Deletion::Deleted(post) if post.id == seeded[0].id));
		assert!(posts.get(seeded[0].id).is_none());
		assert!(store.get_post(seeded[0].id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_delete_of_missing_post_never_prompts() {
		let store = MemoryStore::new();
		let seeded = seed(&store).await;
		let mut posts = PostCollection::fetch(&store).await.unwrap();
		let moderator = Moderator::new(&store, Language::En);

		moderator
			.delete(&mut posts, seeded[0].id, &true)
			.await
			.unwrap();

		let prompt = Prompt::new(true);
		let result = moderator.delete(&mut posts, seeded[0].id, &prompt).await;

		assert!(matches!(result, Err(Error::UnknownPost(id)) if id == seeded[0].id));
		assert!(!prompt.asked.load(Ordering::SeqCst));
	}
}
