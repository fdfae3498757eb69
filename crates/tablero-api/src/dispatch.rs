// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Maps controller requests onto client calls. Each request becomes
//! exactly one reply carrying the same request id; the controllers decide
//! what, if anything, the reply is still allowed to do.

use crate::Client;
use tablero_app::remote::{DetailReply, DetailRequest, ListReply, ListRequest};

pub fn execute_list_request(client: &Client, request: ListRequest) -> ListReply {
    match request {
        ListRequest::FetchCards {
            request_id,
            org,
            filter,
        } => ListReply::CardsFetched {
            request_id,
            outcome: client.list_cards(org, filter),
        },
        ListRequest::DeleteCard { request_id, card } => ListReply::CardDeleted {
            request_id,
            outcome: client.delete_card(card),
        },
        ListRequest::UnfavoriteCard { request_id, card } => ListReply::CardUnfavorited {
            request_id,
            outcome: client.unfavorite_card(card),
        },
        ListRequest::SaveCard { request_id, card } => ListReply::CardSaved {
            request_id,
            outcome: client.update_card(&card),
        },
    }
}

pub fn execute_detail_request(client: &Client, request: DetailRequest) -> DetailReply {
    match request {
        DetailRequest::FetchDatabases { request_id, org } => DetailReply::DatabasesFetched {
            request_id,
            outcome: client.list_databases(org),
        },
        DetailRequest::FetchCard { request_id, card } => DetailReply::CardFetched {
            request_id,
            outcome: client.get_card(card),
        },
        DetailRequest::FetchLegacyQuery { request_id, query } => DetailReply::LegacyQueryFetched {
            request_id,
            outcome: client.get_legacy_query(query),
        },
        DetailRequest::RunDataset { request_id, query } => DetailReply::DatasetRun {
            request_id,
            outcome: client.run_dataset(&query),
        },
        DetailRequest::CreateCard { request_id, card } => DetailReply::CardCreated {
            request_id,
            outcome: client.create_card(&card),
        },
        DetailRequest::UpdateCard { request_id, card } => DetailReply::CardUpdated {
            request_id,
            outcome: client.update_card(&card),
        },
        DetailRequest::FetchTables {
            request_id,
            database,
        } => DetailReply::TablesFetched {
            request_id,
            outcome: client.list_tables(database),
        },
        DetailRequest::FetchTableMetadata { request_id, table } => {
            DetailReply::TableMetadataFetched {
                request_id,
                outcome: client.table_metadata(table),
            }
        }
    }
}
