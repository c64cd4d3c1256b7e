//! Context menu model for page surfaces.
//!
//! The menu is built from a snapshot of what was under the pointer and
//! relayed to the UI, which renders it and sends back the chosen
//! [`MenuAction`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditFlags {
    pub can_cut: bool,
    pub can_copy: bool,
    pub can_paste: bool,
}

/// What the page reported at the moment the menu was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextMenuParams {
    pub x: i32,
    pub y: i32,
    pub link_url: String,
    pub page_url: String,
    pub selection_text: String,
    pub is_editable: bool,
    pub edit_flags: EditFlags,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditCommand {
    Cut,
    Copy,
    Paste,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuAction {
    Back,
    Forward,
    Reload,
    Cut,
    Copy,
    Paste,
    OpenLinkInNewTab,
    OpenLinkExternally,
    CopyLinkAddress,
    ViewSource,
    InspectElement,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Back => "Back",
            Self::Forward => "Forward",
            Self::Reload => "Reload",
            Self::Cut => "Cut",
            Self::Copy => "Copy",
            Self::Paste => "Paste",
            Self::OpenLinkInNewTab => "Open Link in New Tab",
            Self::OpenLinkExternally => "Open Link in External Browser",
            Self::CopyLinkAddress => "Copy Link Address",
            Self::ViewSource => "View Page Source",
            Self::InspectElement => "Inspect Element",
        }
    }

    pub fn edit_command(self) -> Option<EditCommand> {
        match self {
            Self::Cut => Some(EditCommand::Cut),
            Self::Copy => Some(EditCommand::Copy),
            Self::Paste => Some(EditCommand::Paste),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MenuItem {
    Action {
        action: MenuAction,
        label: String,
        enabled: bool,
    },
    Separator,
}

impl MenuItem {
    fn action(action: MenuAction, enabled: bool) -> Self {
        Self::Action {
            action,
            label: action.label().to_string(),
            enabled,
        }
    }

    pub fn as_action(&self) -> Option<(MenuAction, bool)> {
        match self {
            Self::Action { action, enabled, .. } => Some((*action, *enabled)),
            Self::Separator => None,
        }
    }
}

pub fn build_menu(params: &ContextMenuParams) -> Vec<MenuItem> {
    let mut items = vec![
        MenuItem::action(MenuAction::Back, params.can_go_back),
        MenuItem::action(MenuAction::Forward, params.can_go_forward),
        MenuItem::action(MenuAction::Reload, true),
        MenuItem::Separator,
    ];

    if params.is_editable {
        let flags = params.edit_flags;
        items.extend([
            MenuItem::action(MenuAction::Cut, flags.can_cut),
            MenuItem::action(MenuAction::Copy, flags.can_copy),
            MenuItem::action(MenuAction::Paste, flags.can_paste),
            MenuItem::Separator,
        ]);
    }

    if !params.link_url.is_empty() {
        items.extend([
            MenuItem::action(MenuAction::OpenLinkInNewTab, true),
            MenuItem::action(MenuAction::OpenLinkExternally, true),
            MenuItem::action(MenuAction::CopyLinkAddress, true),
            MenuItem::Separator,
        ]);
    }

    items.extend([
        MenuItem::action(MenuAction::ViewSource, !params.page_url.is_empty()),
        MenuItem::action(MenuAction::InspectElement, true),
    ]);
    items
}

/// Whether `action` appears, enabled, in the menu built for `params`.
pub fn is_offered(params: &ContextMenuParams, action: MenuAction) -> bool {
    build_menu(params)
        .iter()
        .filter_map(MenuItem::as_action)
        .any(|(a, enabled)| a == action && enabled)
}

pub fn view_source_url(page_url: &str) -> String {
    format!("view-source:{page_url}")
}
