//! The post listing and its moderation.
//!
//! A [`PostCollection`] is fetched once per request, narrowed to a view with a
//! [`Filter`] and mutated through a [`Moderator`].

pub mod collection;
pub mod dialog;
pub mod filter;
pub mod moderation;

pub use collection::{PostCollection, Stats};
pub use dialog::ConfirmDialog;
pub use filter::{Filter, Tab};
pub use moderation::{Deletion, Moderator};
