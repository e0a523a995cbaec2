//! Shell state owned by the root coordinator
//!
//! Connectivity and theme are passed down explicitly instead of living in
//! ambient globals. None of it feeds the access decision.

use serde::{Deserialize, Serialize};

/// Network reachability as reported by the connectivity collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    #[default]
    Online,
    Offline,
}

/// Resolved color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Inputs that decide the theme
#[derive(Debug, Clone, Default)]
pub struct ThemeSignals {
    /// Root document already carries the dark class
    pub document_dark: bool,

    /// System color scheme preference
    pub prefers_dark: bool,

    /// Persisted user preference, if any
    pub stored_preference: Option<String>,
}

impl Theme {
    /// Any dark signal wins
    pub fn resolve(signals: &ThemeSignals) -> Self {
        if signals.document_dark
            || signals.prefers_dark
            || signals.stored_preference.as_deref() == Some("dark")
        {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Cross-cutting state for one render tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellState {
    pub connectivity: Connectivity,
    pub theme: Theme,
}

impl ShellState {
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn is_offline(&self) -> bool {
        self.connectivity == Connectivity::Offline
    }
}

/// What the layout renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderContent {
    /// Render nothing until mounted
    Nothing,

    /// Render the page
    Children,
}

/// Layout render instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    pub content: RenderContent,
    pub offline_banner: bool,
    pub theme: Theme,
}
