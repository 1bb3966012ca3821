use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;

use crate::preferences::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
	Danger,
}

/// A confirmation prompt shown before an irreversible action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ConfirmDialog {
	pub kind: DialogKind,
	pub title: String,
	pub message: String,
	pub confirm_text: String,
	pub cancel_text: String,
}

impl ConfirmDialog {
	/// The prompt shown before permanently deleting the post titled `title`.
	pub fn delete_post(language: Language, title: &str) -> Self {
		match language {
			Language::En => Self {
				kind: DialogKind::Danger,
				title: "Delete post?".into(),
				message: format!("\"{title}\" will be permanently deleted. This cannot be undone."),
				confirm_text: "Delete".into(),
				cancel_text: "Cancel".into(),
			},
			Language::Id => Self {
				kind: DialogKind::Danger,
				title: "Hapus tulisan?".into(),
				message: format!(
					"\"{title}\" akan dihapus secara permanen. Tindakan ini tidak dapat dibatalkan."
				),
				confirm_text: "Hapus".into(),
				cancel_text: "Batal".into(),
			},
		}
	}
}

/// Answers a confirmation prompt.
#[async_trait]
pub trait Confirm: Send + Sync {
	async fn confirm(&self, dialog: &ConfirmDialog) -> bool;
}

/// A confirmation given up front, such as the `confirm` flag of a request.
#[async_trait]
impl Confirm for bool {
	async fn confirm(&self, _dialog: &ConfirmDialog) -> bool {
		*self
	}
}

#[cfg(test)]
mod test {
	use super::{ConfirmDialog, DialogKind};
	use crate::preferences::Language;

	#[test]
	fn test_delete_dialog_is_localized() {
		let en = ConfirmDialog::delete_post(Language::En, "Hello");
		let id = ConfirmDialog::delete_post(Language::Id, "Hello");

		assert_eq!(en.kind, DialogKind::Danger);
		assert_eq!(en.confirm_text, "Delete");
		assert!(en.message.contains("\"Hello\""));
		assert_eq!(id.confirm_text, "Hapus");
		assert_eq!(id.cancel_text, "Batal");
		assert_ne!(en.title, id.title);
	}
}
