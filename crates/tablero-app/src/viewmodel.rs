// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! View-models for the three query-builder regions. Each one is a plain
//! snapshot of the card plus region-local state, rebuilt from the
//! controller every time that region is published; nothing here is owned
//! state, so a region can never drift from the card between renders. The
//! callback half of the original view-models is the controller's command
//! surface.

use crate::metadata::MarkedUpTable;
use crate::model::{Database, DatasetQuery, DisplayType, PublicPerms, QueryMode, QueryResult, Table};
use crate::settings::VisualizationSettings;

/// The three independently published display regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRegion {
    Header,
    Editor,
    Visualization,
}

impl RenderRegion {
    pub const ALL: [Self; 3] = [Self::Header, Self::Editor, Self::Visualization];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Editor => "editor",
            Self::Visualization => "visualization",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderModel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub public_perms: PublicPerms,
    /// Whether the card has a saved identity (controls save-vs-update).
    pub is_saved: bool,
    /// Set after clone or legacy derivation: the card can be saved as-is.
    pub save_ready: bool,
    /// CSV export path; absent until a result has been computed.
    pub download_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorModel {
    /// Databases for the current organization; unset until the fetch
    /// resolves non-empty. The editor is unusable without them.
    pub databases: Option<Vec<Database>>,
    /// The dataset query as it was when the card finished loading.
    pub initial_query: Option<DatasetQuery>,
    pub mode: Option<QueryMode>,
    pub tables: Option<Vec<Table>>,
    pub table_metadata: Option<MarkedUpTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationModel {
    pub display: DisplayType,
    pub settings: VisualizationSettings,
    pub result: Option<QueryResult>,
}
