// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Deterministic fixtures plus an in-memory stand-in for the card
//! service. `StaticService` answers every request the controllers can
//! issue from seeded data, which powers `--demo` mode and keeps
//! integration tests off the network.

use std::collections::BTreeMap;
use time::macros::datetime;

use tablero_app::ids::{CardId, DatabaseId, FieldId, OrgId, QueryId, TableId};
use tablero_app::model::{
    Card, Database, DatasetQuery, DisplayType, Field, LegacyQuery, Organization, PublicPerms,
    QueryResult, Table, TableMetadata,
};
use tablero_app::remote::{
    ApiError, DetailReply, DetailRequest, ListReply, ListRequest, UpdateReply,
};

const CARD_TOPICS: [&str; 8] = [
    "Revenue by month",
    "Active users",
    "Signups this week",
    "Orders by region",
    "Churn rate",
    "Support tickets",
    "Top referrers",
    "Inventory levels",
];

const DISPLAYS: [DisplayType; 6] = [
    DisplayType::Table,
    DisplayType::Scalar,
    DisplayType::Line,
    DisplayType::Bar,
    DisplayType::Area,
    DisplayType::Pie,
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0xA409_3822_299F_31D0 } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

pub fn sample_org() -> Organization {
    Organization {
        id: OrgId::new(1),
        slug: "acme".to_owned(),
        name: "Acme Analytics".to_owned(),
    }
}

pub fn sample_databases() -> Vec<Database> {
    vec![
        Database {
            id: DatabaseId::new(1),
            name: "warehouse".to_owned(),
            engine: "postgres".to_owned(),
        },
        Database {
            id: DatabaseId::new(2),
            name: "events".to_owned(),
            engine: "mysql".to_owned(),
        },
    ]
}

pub fn sample_tables() -> Vec<Table> {
    vec![
        Table {
            id: TableId::new(1),
            name: "orders".to_owned(),
            database_id: DatabaseId::new(1),
        },
        Table {
            id: TableId::new(2),
            name: "customers".to_owned(),
            database_id: DatabaseId::new(1),
        },
    ]
}

pub fn sample_table_metadata() -> TableMetadata {
    TableMetadata {
        id: TableId::new(1),
        name: "orders".to_owned(),
        fields: vec![
            Field {
                id: FieldId::new(1),
                name: "id".to_owned(),
                base_type: "BigIntegerField".to_owned(),
            },
            Field {
                id: FieldId::new(2),
                name: "total".to_owned(),
                base_type: "FloatField".to_owned(),
            },
            Field {
                id: FieldId::new(3),
                name: "status".to_owned(),
                base_type: "CharField".to_owned(),
            },
            Field {
                id: FieldId::new(4),
                name: "placed_at".to_owned(),
                base_type: "DateTimeField".to_owned(),
            },
        ],
    }
}

pub fn sample_legacy_query() -> LegacyQuery {
    LegacyQuery {
        id: QueryId::new(11),
        name: "Legacy revenue query".to_owned(),
        database: sample_databases().remove(0),
    }
}

pub fn sample_result() -> QueryResult {
    QueryResult {
        columns: vec!["month".to_owned(), "total".to_owned()],
        rows: vec![
            vec![serde_json::json!("2026-06"), serde_json::json!(48_210)],
            vec![serde_json::json!("2026-07"), serde_json::json!(51_877)],
            vec![serde_json::json!("2026-08"), serde_json::json!(43_092)],
        ],
    }
}

/// Seeded card fixtures, stable for a given seed.
pub fn sample_cards(seed: u64, count: usize) -> Vec<Card> {
    let mut rng = DeterministicRng::new(seed);
    (0..count)
        .map(|index| {
            let topic = CARD_TOPICS[rng.int_n(CARD_TOPICS.len())];
            let display = DISPLAYS[rng.int_n(DISPLAYS.len())];
            Card {
                id: Some(CardId::new(index as i64 + 1)),
                name: Some(topic.to_owned()),
                description: (index % 3 == 0).then(|| format!("tracks {}", topic.to_lowercase())),
                public_perms: PublicPerms::ALL[rng.int_n(PublicPerms::ALL.len())],
                display,
                dataset_query: Some(DatasetQuery::template(
                    tablero_app::model::QueryMode::Structured,
                )),
                organization: Some(OrgId::new(1)),
                created_at: Some(datetime!(2026-02-19 12:34:56 UTC)),
                ..Card::empty()
            }
        })
        .collect()
}

/// In-memory card service. Mutating requests actually mutate, so a demo
/// session behaves like the real thing end to end.
#[derive(Debug)]
pub struct StaticService {
    org: Organization,
    cards: BTreeMap<i64, Card>,
    favorites: Vec<CardId>,
    next_card_id: i64,
}

impl StaticService {
    pub fn new(seed: u64) -> Self {
        let cards = sample_cards(seed, 6);
        let favorites = cards
            .iter()
            .filter_map(|card| card.id)
            .step_by(2)
            .collect();
        let next_card_id = cards.len() as i64 + 1;
        Self {
            org: sample_org(),
            cards: cards
                .into_iter()
                .filter_map(|card| card.id.map(|id| (id.get(), card)))
                .collect(),
            favorites,
            next_card_id,
        }
    }

    pub fn organization(&self) -> Organization {
        self.org.clone()
    }

    pub fn execute_list(&mut self, request: ListRequest) -> ListReply {
        match request {
            ListRequest::FetchCards {
                request_id,
                filter,
                ..
            } => {
                let cards: Vec<Card> = self
                    .cards
                    .values()
                    .filter(|card| match filter {
                        tablero_app::model::FilterMode::All => true,
                        tablero_app::model::FilterMode::Fav => card
                            .id
                            .is_some_and(|id| self.favorites.contains(&id)),
                    })
                    .cloned()
                    .collect();
                ListReply::CardsFetched {
                    request_id,
                    outcome: Ok(cards),
                }
            }
            ListRequest::DeleteCard { request_id, card } => {
                let outcome = if self.cards.remove(&card.get()).is_some() {
                    Ok(())
                } else {
                    Err(not_found("card"))
                };
                ListReply::CardDeleted {
                    request_id,
                    outcome,
                }
            }
            ListRequest::UnfavoriteCard { request_id, card } => {
                self.favorites.retain(|id| *id != card);
                ListReply::CardUnfavorited {
                    request_id,
                    outcome: Ok(()),
                }
            }
            ListRequest::SaveCard { request_id, card } => ListReply::CardSaved {
                request_id,
                outcome: Ok(self.save(card)),
            },
        }
    }

    pub fn execute_detail(&mut self, request: DetailRequest) -> DetailReply {
        match request {
            DetailRequest::FetchDatabases { request_id, .. } => DetailReply::DatabasesFetched {
                request_id,
                outcome: Ok(sample_databases()),
            },
            DetailRequest::FetchCard { request_id, card } => {
                let outcome = self
                    .cards
                    .get(&card.get())
                    .cloned()
                    .ok_or_else(|| not_found("card"));
                DetailReply::CardFetched {
                    request_id,
                    outcome,
                }
            }
            DetailRequest::FetchLegacyQuery { request_id, query } => {
                let fixture = sample_legacy_query();
                let outcome = if query == fixture.id {
                    Ok(fixture)
                } else {
                    Err(not_found("query"))
                };
                DetailReply::LegacyQueryFetched {
                    request_id,
                    outcome,
                }
            }
            DetailRequest::RunDataset { request_id, .. } => DetailReply::DatasetRun {
                request_id,
                outcome: Ok(sample_result()),
            },
            DetailRequest::CreateCard { request_id, card } => {
                let mut created = card;
                let id = CardId::new(self.next_card_id);
                self.next_card_id += 1;
                created.id = Some(id);
                self.cards.insert(id.get(), created.clone());
                DetailReply::CardCreated {
                    request_id,
                    outcome: Ok(created),
                }
            }
            DetailRequest::UpdateCard { request_id, card } => DetailReply::CardUpdated {
                request_id,
                outcome: Ok(self.save(card)),
            },
            DetailRequest::FetchTables { request_id, database } => {
                let tables = sample_tables()
                    .into_iter()
                    .filter(|table| table.database_id == database)
                    .collect();
                DetailReply::TablesFetched {
                    request_id,
                    outcome: Ok(tables),
                }
            }
            DetailRequest::FetchTableMetadata { request_id, table } => {
                let fixture = sample_table_metadata();
                let outcome = if table == fixture.id {
                    Ok(fixture)
                } else {
                    Err(not_found("table"))
                };
                DetailReply::TableMetadataFetched {
                    request_id,
                    outcome,
                }
            }
        }
    }

    fn save(&mut self, card: Card) -> UpdateReply {
        let Some(id) = card.id else {
            return UpdateReply::Rejected("card has no id".to_owned());
        };
        if card.name.as_deref().is_none_or(str::is_empty) {
            return UpdateReply::Rejected("name must not be empty".to_owned());
        }
        self.cards.insert(id.get(), card.clone());
        UpdateReply::Saved(card)
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::with_status(404, format!("{what} not found"))
}

#[cfg(test)]
mod tests {
    use super::{StaticService, sample_cards};
    use tablero_app::ids::{CardId, OrgId};
    use tablero_app::model::FilterMode;
    use tablero_app::remote::{DetailReply, DetailRequest, ListReply, ListRequest, UpdateReply};

    #[test]
    fn fixtures_are_stable_for_a_seed() {
        assert_eq!(sample_cards(7, 5), sample_cards(7, 5));
        assert_ne!(sample_cards(7, 5), sample_cards(8, 5));
    }

    #[test]
    fn favorite_filter_narrows_the_listing() {
        let mut service = StaticService::new(7);
        let all = match service.execute_list(ListRequest::FetchCards {
            request_id: 1,
            org: OrgId::new(1),
            filter: FilterMode::All,
        }) {
            ListReply::CardsFetched { outcome, .. } => outcome.expect("cards"),
            other => panic!("unexpected reply {other:?}"),
        };
        let favorites = match service.execute_list(ListRequest::FetchCards {
            request_id: 2,
            org: OrgId::new(1),
            filter: FilterMode::Fav,
        }) {
            ListReply::CardsFetched { outcome, .. } => outcome.expect("cards"),
            other => panic!("unexpected reply {other:?}"),
        };
        assert!(favorites.len() < all.len());
        assert!(!favorites.is_empty());
    }

    #[test]
    fn delete_then_fetch_is_not_found() {
        let mut service = StaticService::new(7);
        service.execute_list(ListRequest::DeleteCard {
            request_id: 1,
            card: CardId::new(2),
        });
        let reply = service.execute_detail(DetailRequest::FetchCard {
            request_id: 2,
            card: CardId::new(2),
        });
        match reply {
            DetailReply::CardFetched { outcome, .. } => {
                assert!(outcome.expect_err("deleted card").is_not_found());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn empty_name_save_is_rejected() {
        let mut service = StaticService::new(7);
        let mut card = sample_cards(7, 1).remove(0);
        card.name = Some(String::new());
        let reply = service.execute_list(ListRequest::SaveCard {
            request_id: 1,
            card,
        });
        match reply {
            ListReply::CardSaved { outcome, .. } => {
                assert!(matches!(
                    outcome.expect("transport ok"),
                    UpdateReply::Rejected(_)
                ));
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn created_cards_get_fresh_ids() {
        let mut service = StaticService::new(7);
        let mut card = sample_cards(7, 1).remove(0);
        card.id = None;
        let reply = service.execute_detail(DetailRequest::CreateCard {
            request_id: 1,
            card,
        });
        match reply {
            DetailReply::CardCreated { outcome, .. } => {
                let created = outcome.expect("created");
                assert_eq!(created.id, Some(CardId::new(7)));
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
