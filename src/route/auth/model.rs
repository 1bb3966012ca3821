pub use crate::model::{Session, User};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	/// An email address, or a username on the configured login domain.
	#[validate(length(min = 1, max = 254))]
	pub login: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
	SignedIn,
	SignedOut,
}

impl SessionEventKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::SignedIn => "signed_in",
			Self::SignedOut => "signed_out",
		}
	}
}

/// A change of sign-in state, streamed to open admin pages.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SessionEvent {
	pub kind: SessionEventKind,
	pub user_id: Uuid,
	pub username: String,
	pub at: DateTime<Utc>,
}

impl SessionEvent {
	pub fn new(kind: SessionEventKind, user: &User) -> Self {
		Self {
			kind,
			user_id: user.id,
			username: user.username.clone(),
			at: Utc::now(),
		}
	}
}
