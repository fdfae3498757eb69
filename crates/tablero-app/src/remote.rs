// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The contract between the screen controllers and whatever executes their
//! remote calls. Controllers emit requests tagged with a per-controller
//! request id; completions come back as replies carrying the same id, and
//! replies whose id is no longer tracked are dropped before they can touch
//! state. That is what stands in for cancellation: a torn-down or
//! superseded call still completes, but its reply has no effect.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{CardId, DatabaseId, OrgId, QueryId, TableId};
use crate::model::{
    Card, Database, DatasetQuery, FilterMode, LegacyQuery, QueryResult, Table, TableMetadata,
};

/// Remote failure as the controllers see it. Only two classes matter:
/// not-found (navigates away) and everything else (logged and swallowed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self.status, Some(404))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

/// Outcome of a card update. The service can answer 200 with an error
/// marker in the body instead of the saved card; callers must surface
/// that themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateReply {
    Saved(Card),
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListRequest {
    FetchCards {
        request_id: u64,
        org: OrgId,
        filter: FilterMode,
    },
    DeleteCard {
        request_id: u64,
        card: CardId,
    },
    UnfavoriteCard {
        request_id: u64,
        card: CardId,
    },
    SaveCard {
        request_id: u64,
        card: Card,
    },
}

impl ListRequest {
    pub const fn request_id(&self) -> u64 {
        match self {
            Self::FetchCards { request_id, .. }
            | Self::DeleteCard { request_id, .. }
            | Self::UnfavoriteCard { request_id, .. }
            | Self::SaveCard { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListReply {
    CardsFetched {
        request_id: u64,
        outcome: ApiResult<Vec<Card>>,
    },
    CardDeleted {
        request_id: u64,
        outcome: ApiResult<()>,
    },
    CardUnfavorited {
        request_id: u64,
        outcome: ApiResult<()>,
    },
    CardSaved {
        request_id: u64,
        outcome: ApiResult<UpdateReply>,
    },
}

impl ListReply {
    pub const fn request_id(&self) -> u64 {
        match self {
            Self::CardsFetched { request_id, .. }
            | Self::CardDeleted { request_id, .. }
            | Self::CardUnfavorited { request_id, .. }
            | Self::CardSaved { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailRequest {
    FetchDatabases {
        request_id: u64,
        org: OrgId,
    },
    FetchCard {
        request_id: u64,
        card: CardId,
    },
    FetchLegacyQuery {
        request_id: u64,
        query: QueryId,
    },
    RunDataset {
        request_id: u64,
        query: DatasetQuery,
    },
    CreateCard {
        request_id: u64,
        card: Card,
    },
    UpdateCard {
        request_id: u64,
        card: Card,
    },
    FetchTables {
        request_id: u64,
        database: DatabaseId,
    },
    FetchTableMetadata {
        request_id: u64,
        table: TableId,
    },
}

impl DetailRequest {
    pub const fn request_id(&self) -> u64 {
        match self {
            Self::FetchDatabases { request_id, .. }
            | Self::FetchCard { request_id, .. }
            | Self::FetchLegacyQuery { request_id, .. }
            | Self::RunDataset { request_id, .. }
            | Self::CreateCard { request_id, .. }
            | Self::UpdateCard { request_id, .. }
            | Self::FetchTables { request_id, .. }
            | Self::FetchTableMetadata { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailReply {
    DatabasesFetched {
        request_id: u64,
        outcome: ApiResult<Vec<Database>>,
    },
    CardFetched {
        request_id: u64,
        outcome: ApiResult<Card>,
    },
    LegacyQueryFetched {
        request_id: u64,
        outcome: ApiResult<LegacyQuery>,
    },
    DatasetRun {
        request_id: u64,
        outcome: ApiResult<QueryResult>,
    },
    CardCreated {
        request_id: u64,
        outcome: ApiResult<Card>,
    },
    CardUpdated {
        request_id: u64,
        outcome: ApiResult<UpdateReply>,
    },
    TablesFetched {
        request_id: u64,
        outcome: ApiResult<Vec<Table>>,
    },
    TableMetadataFetched {
        request_id: u64,
        outcome: ApiResult<TableMetadata>,
    },
}

impl DetailReply {
    pub const fn request_id(&self) -> u64 {
        match self {
            Self::DatabasesFetched { request_id, .. }
            | Self::CardFetched { request_id, .. }
            | Self::LegacyQueryFetched { request_id, .. }
            | Self::DatasetRun { request_id, .. }
            | Self::CardCreated { request_id, .. }
            | Self::CardUpdated { request_id, .. }
            | Self::TablesFetched { request_id, .. }
            | Self::TableMetadataFetched { request_id, .. } => *request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, DetailReply, ListRequest};
    use crate::ids::OrgId;
    use crate::model::FilterMode;

    #[test]
    fn not_found_is_the_only_navigating_error_class() {
        assert!(ApiError::with_status(404, "no such card").is_not_found());
        assert!(!ApiError::with_status(500, "boom").is_not_found());
        assert!(!ApiError::new("connection refused").is_not_found());
    }

    #[test]
    fn display_includes_status_when_present() {
        let error = ApiError::with_status(404, "no such card");
        assert_eq!(error.to_string(), "no such card (status 404)");
        assert_eq!(ApiError::new("refused").to_string(), "refused");
    }

    #[test]
    fn request_and_reply_ids_line_up() {
        let request = ListRequest::FetchCards {
            request_id: 7,
            org: OrgId::new(1),
            filter: FilterMode::All,
        };
        assert_eq!(request.request_id(), 7);

        let reply = DetailReply::CardFetched {
            request_id: 9,
            outcome: Err(ApiError::new("x")),
        };
        assert_eq!(reply.request_id(), 9);
    }
}
