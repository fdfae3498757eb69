// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::ids::*;
use crate::settings::VisualizationSettings;

/// Server-side list filter for the card collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    All,
    Fav,
}

impl FilterMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Fav => "fav",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "fav" => Some(Self::Fav),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::All => Self::Fav,
            Self::Fav => Self::All,
        }
    }

    /// One-time startup selection from the location-hash hint. Anything
    /// other than `fav` means the full listing.
    pub fn from_hash(hash: Option<&str>) -> Self {
        match hash {
            Some("fav") => Self::Fav,
            _ => Self::All,
        }
    }
}

/// Card visibility level, stored as an integer on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PublicPerms {
    #[default]
    Private,
    ReadOnly,
    ReadWrite,
}

impl PublicPerms {
    pub const ALL: [Self; 3] = [Self::Private, Self::ReadOnly, Self::ReadWrite];

    pub const fn as_int(self) -> i64 {
        match self {
            Self::Private => 0,
            Self::ReadOnly => 1,
            Self::ReadWrite => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::ReadOnly => "public read-only",
            Self::ReadWrite => "public read-write",
        }
    }
}

impl TryFrom<i64> for PublicPerms {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Private),
            1 => Ok(Self::ReadOnly),
            2 => Ok(Self::ReadWrite),
            other => Err(format!("unknown permission level {other}")),
        }
    }
}

impl From<PublicPerms> for i64 {
    fn from(value: PublicPerms) -> Self {
        value.as_int()
    }
}

/// How a card's result is displayed. Stored as a string tag on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    #[default]
    Table,
    Scalar,
    Line,
    Bar,
    Area,
    Pie,
}

impl DisplayType {
    pub const ALL: [Self; 6] = [
        Self::Table,
        Self::Scalar,
        Self::Line,
        Self::Bar,
        Self::Area,
        Self::Pie,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Scalar => "scalar",
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Area => "area",
            Self::Pie => "pie",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "table" => Some(Self::Table),
            "scalar" => Some(Self::Scalar),
            "line" => Some(Self::Line),
            "bar" => Some(Self::Bar),
            "area" => Some(Self::Area),
            "pie" => Some(Self::Pie),
            _ => None,
        }
    }
}

/// The two query modes a user can author in. The historical third dataset
/// query variant (a saved-query reference) is never authored directly, so
/// it has no mode here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Structured,
    Native,
}

impl QueryMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "query",
            Self::Native => "native",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "query" => Some(Self::Structured),
            "native" => Some(Self::Native),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub aggregation: Vec<Value>,
    pub breakout: Vec<Value>,
    pub filter: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeQuery {
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQueryRef {
    pub query_id: QueryId,
}

/// Tagged union describing how a card retrieves its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatasetQuery {
    Query {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        database: Option<DatabaseId>,
        query: StructuredQuery,
    },
    Native {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        database: Option<DatabaseId>,
        native: NativeQuery,
    },
    Result {
        database: DatabaseId,
        result: SavedQueryRef,
    },
}

impl DatasetQuery {
    /// Fresh template for a query mode. Switching modes replaces the whole
    /// dataset query with one of these; nothing is migrated field by field.
    pub fn template(mode: QueryMode) -> Self {
        match mode {
            QueryMode::Structured => Self::Query {
                database: None,
                query: StructuredQuery {
                    aggregation: vec![Value::Null],
                    breakout: Vec::new(),
                    filter: Vec::new(),
                },
            },
            QueryMode::Native => Self::Native {
                database: None,
                native: NativeQuery {
                    query: String::new(),
                },
            },
        }
    }

    pub const fn mode(&self) -> Option<QueryMode> {
        match self {
            Self::Query { .. } => Some(QueryMode::Structured),
            Self::Native { .. } => Some(QueryMode::Native),
            Self::Result { .. } => None,
        }
    }

    pub const fn database(&self) -> Option<DatabaseId> {
        match self {
            Self::Query { database, .. } | Self::Native { database, .. } => *database,
            Self::Result { database, .. } => Some(*database),
        }
    }
}

/// A saved, named query plus its display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public_perms: PublicPerms,
    #[serde(default)]
    pub display: DisplayType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_query: Option<DatasetQuery>,
    #[serde(default, skip_serializing_if = "VisualizationSettings::is_empty")]
    pub visualization_settings: VisualizationSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrgId>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

impl Card {
    /// The blank card the query-builder screen starts from.
    pub fn empty() -> Self {
        Self {
            id: None,
            name: None,
            description: None,
            public_perms: PublicPerms::Private,
            display: DisplayType::Table,
            dataset_query: None,
            visualization_settings: VisualizationSettings::default(),
            organization: None,
            created_at: None,
        }
    }

    /// Dirtiness tracking never shipped; every caller sees a clean card.
    /// Save-readiness after cloning is tracked by the detail screen, not
    /// the card itself.
    pub const fn is_dirty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: DatabaseId,
    pub name: String,
    #[serde(default)]
    pub engine: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub database_id: DatabaseId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub base_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub id: TableId,
    pub name: String,
    pub fields: Vec<Field>,
}

/// A previously-saved query from the legacy query tool; cards can be
/// derived from one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyQuery {
    pub id: QueryId,
    pub name: String,
    pub database: Database,
}

/// Rows/columns payload returned by dataset execution. Held only for
/// display; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}
