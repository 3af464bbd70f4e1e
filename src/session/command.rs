use serde_json::Value;

use crate::geometry::coords::Frame;
use crate::layers::model::{ImageRef, LayerId};
use crate::layers::stack::TextBoxInit;
use crate::snap::engine::SnapSettings;

/// Every mutation an editor front end can request.
///
/// Destructive commands carry a `confirmed` flag and are refused without it.
#[derive(Clone, Debug)]
pub enum EditorCommand {
    OpenTemplate { category: String, index: u32 },
    SetOption { key: String, value: String },
    AddTextBox(TextBoxInit),
    DeleteLayer { id: LayerId, confirmed: bool },
    DuplicateTextBox(LayerId),
    Reorder { from: LayerId, to: LayerId },
    MoveUp(LayerId),
    MoveDown(LayerId),
    MoveToTop(LayerId),
    MoveToBottom(LayerId),
    Select(LayerId),
    Deselect,
    SetVisible { id: LayerId, visible: bool },
    SetLocked { id: LayerId, locked: bool },
    UpdateProperty { id: LayerId, path: String, value: Value },
    SetFrame { id: LayerId, frame: Frame },
    SetRotation { id: LayerId, degrees: f64 },
    SetImage { id: LayerId, image: ImageRef },
    ClearImage(LayerId),
    Undo,
    Redo,
    SaveLayout,
    ResetLayout { confirmed: bool },
    SetSnapSettings(SnapSettings),
    ImportCategories(String),
    ImportOverride(String),
    DeleteCategory { key: String, confirmed: bool },
    ClearOverride { confirmed: bool },
}

impl EditorCommand {
    /// History label of a committing command; `None` for commands that take no snapshot.
    pub fn history_label(&self) -> Option<&'static str> {
        Some(match self {
            Self::SetOption { .. } => "Edit option",
            Self::AddTextBox(_) => "Add text",
            Self::DeleteLayer { .. } => "Delete layer",
            Self::DuplicateTextBox(_) => "Duplicate text",
            Self::Reorder { .. }
            | Self::MoveUp(_)
            | Self::MoveDown(_)
            | Self::MoveToTop(_)
            | Self::MoveToBottom(_) => "Reorder layers",
            Self::SetVisible { .. } => "Toggle visibility",
            Self::SetLocked { .. } => "Toggle lock",
            Self::UpdateProperty { .. } => "Edit property",
            Self::SetFrame { .. } => "Move layer",
            Self::SetRotation { .. } => "Rotate layer",
            Self::SetImage { .. } => "Set image",
            Self::ClearImage(_) => "Clear image",
            Self::ResetLayout { .. } => "Reset layout",
            Self::OpenTemplate { .. }
            | Self::Select(_)
            | Self::Deselect
            | Self::Undo
            | Self::Redo
            | Self::SaveLayout
            | Self::SetSnapSettings(_)
            | Self::ImportCategories(_)
            | Self::ImportOverride(_)
            | Self::DeleteCategory { .. }
            | Self::ClearOverride { .. } => return None,
        })
    }

    /// Whether the command can change what is drawn.
    pub fn affects_render(&self) -> bool {
        !matches!(
            self,
            Self::SaveLayout
                | Self::SetSnapSettings(_)
                | Self::ImportCategories(_)
                | Self::ImportOverride(_)
                | Self::DeleteCategory { .. }
                | Self::ClearOverride { .. }
        )
    }
}
