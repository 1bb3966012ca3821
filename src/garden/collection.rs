use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

use super::filter::{listing_order, Filter, Tab};
use crate::{
	model::Post,
	store::{self, PostQuery, PostStore},
};

#[derive(Debug, Clone)]
struct Entry {
	post: Post,
	/// Position in the fetch result, used to break ordering ties.
	seq: usize,
}

/// The posts fetched for one page visit.
///
/// Always kept in listing order, so every view derived from it is ordered too.
#[derive(Debug, Clone, Default)]
pub struct PostCollection {
	entries: Vec<Entry>,
}

/// Dashboard numbers over the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Stats {
	pub total: usize,
	pub public: usize,
	pub drafts: usize,
	pub notes: usize,
	pub research: usize,
}

impl PostCollection {
	/// Fetches every post from the store, replacing nothing but itself.
	pub async fn fetch<S>(store: &S) -> store::Result<Self>
	where
		S: PostStore + ?Sized,
	{
		let posts = store.list_posts(&PostQuery::newest()).await?;

		tracing::debug!(count = posts.len(), "fetched post collection");

		Ok(Self::from_posts(posts))
	}

	pub fn from_posts(posts: Vec<Post>) -> Self {
		let mut collection = Self {
			entries: posts
				.into_iter()
				.enumerate()
				.map(|(seq, post)| Entry { post, seq })
				.collect(),
		};

		collection.sort();
		collection
	}

	/// Restores listing order after a change to a pinned flag.
	pub(super) fn sort(&mut self) {
		self.entries
			.sort_by(|a, b| listing_order(&a.post, &b.post).then(a.seq.cmp(&b.seq)));
	}

	pub fn view(&self, filter: &Filter) -> Vec<&Post> {
		filter.apply(self.iter())
	}

	pub fn iter(&self) -> impl Iterator<Item = &Post> {
		self.entries.iter().map(|entry| &entry.post)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, id: Uuid) -> Option<&Post> {
		self.iter().find(|post| post.id == id)
	}

	/// Position of a post in the unfiltered listing.
	pub fn position(&self, id: Uuid) -> Option<usize> {
		self.iter().position(|post| post.id == id)
	}

	pub(super) fn get_mut(&mut self, id: Uuid) -> Option<&mut Post> {
		self.entries
			.iter_mut()
			.map(|entry| &mut entry.post)
			.find(|post| post.id == id)
	}

	/// Puts back a copy of a post taken before a failed mutation.
	pub(super) fn restore(&mut self, snapshot: Post) {
		if let Some(post) = self.get_mut(snapshot.id) {
			*post = snapshot;
		}
	}

	pub(super) fn remove(&mut self, id: Uuid) -> Option<Post> {
		let index = self.position(id)?;

		Some(self.entries.remove(index).post)
	}

	pub fn stats(&self) -> Stats {
		let count = |predicate: &dyn Fn(&Post) -> bool| self.iter().filter(|p| predicate(p)).count();
		let in_tab = |tab: Tab| move |post: &Post| tab.category() == Some(post.category.as_str());

		Stats {
			total: self.len(),
			public: count(&|post| post.is_public),
			drafts: count(&Post::is_draft),
			notes: count(&in_tab(Tab::Notes)),
			research: count(&in_tab(Tab::Research)),
		}
	}

	/// Distinct non-empty subcategories in use, sorted.
	pub fn subcategories(&self) -> BTreeSet<&str> {
		self.iter()
			.filter_map(|post| post.subcategory.as_deref())
			.map(str::trim)
			.filter(|sub| !sub.is_empty())
			.collect()
	}
}
