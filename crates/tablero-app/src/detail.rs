// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Controller for the query-builder screen. Owns the single mutable card
//! and the state that feeds the three region view-models; every mutation
//! path ends by publishing exactly the regions whose projection changed.
//!
//! Startup is gated: the organization arrives asynchronously, the database
//! list is fetched for it, and only a non-empty database list lets the
//! one-time initialization run (load, clone, derive from a legacy query,
//! or start blank). An empty database list leaves the screen unusable on
//! purpose; there is nothing to build queries against.

use crate::ids::{CardId, DatabaseId, QueryId, TableId};
use crate::metadata::{MarkedUpTable, mark_up_table};
use crate::model::{
    Card, DatasetQuery, DisplayType, Organization, PublicPerms, QueryMode, QueryResult,
    SavedQueryRef,
};
use crate::remote::{DetailReply, DetailRequest, UpdateReply};
use crate::settings::{VisualizationSettings, settings_for_display};
use crate::viewmodel::{EditorModel, HeaderModel, RenderRegion, VisualizationModel};

const CSV_EXPORT_PATH: &str = "/api/meta/dataset/csv";

/// Route parameters select the initialization path exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Edit(CardId),
    Clone(CardId),
    FromQuery(QueryId),
    Blank,
}

impl Route {
    pub const fn from_params(
        card: Option<CardId>,
        clone: bool,
        legacy_query: Option<QueryId>,
    ) -> Self {
        match (card, clone, legacy_query) {
            (Some(id), true, _) => Self::Clone(id),
            (Some(id), false, _) => Self::Edit(id),
            (None, _, Some(query)) => Self::FromQuery(query),
            (None, _, None) => Self::Blank,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailCommand {
    /// The ambient organization context changed; empty emissions are
    /// ignored, non-empty ones re-fetch the database list.
    OrganizationChanged(Option<Organization>),
    /// Copy edited name/description into the card and persist: update for
    /// a saved card, create (stamping the organization) otherwise.
    SaveHeader {
        name: String,
        description: Option<String>,
    },
    SetPermissions(PublicPerms),
    /// Raw mode tag; unknown tags are silently ignored.
    SetQueryMode(String),
    SetDatabase(DatabaseId),
    SetNativeQuery(String),
    RunQuery,
    SetDisplay(DisplayType),
    LoadTables(DatabaseId),
    LoadTableMetadata(TableId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailEffect {
    Request(DetailRequest),
    Render(RenderRegion),
    Navigate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct InFlight {
    databases: Option<u64>,
    card_load: Option<u64>,
    legacy_query: Option<u64>,
    run: Option<u64>,
    create: Option<u64>,
    update: Option<u64>,
    tables: Option<u64>,
    table_metadata: Option<u64>,
}

#[derive(Debug)]
pub struct CardDetailScreen {
    route: Route,
    org: Option<Organization>,
    card: Card,
    initial_query: Option<DatasetQuery>,
    databases: Option<Vec<crate::model::Database>>,
    tables: Option<Vec<crate::model::Table>>,
    table_metadata: Option<MarkedUpTable>,
    result: Option<QueryResult>,
    save_ready: bool,
    initialized: bool,
    cloning: bool,
    next_request_id: u64,
    in_flight: InFlight,
}

impl CardDetailScreen {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            org: None,
            card: Card::empty(),
            initial_query: None,
            databases: None,
            tables: None,
            table_metadata: None,
            result: None,
            save_ready: false,
            initialized: false,
            cloning: false,
            next_request_id: 0,
            in_flight: InFlight::default(),
        }
    }

    pub const fn route(&self) -> Route {
        self.route
    }

    pub const fn card(&self) -> &Card {
        &self.card
    }

    pub const fn initialized(&self) -> bool {
        self.initialized
    }

    pub const fn save_ready(&self) -> bool {
        self.save_ready
    }

    pub const fn result(&self) -> Option<&QueryResult> {
        self.result.as_ref()
    }

    // ===== view-model projections, rebuilt on every publish

    pub fn header_model(&self) -> HeaderModel {
        HeaderModel {
            name: self.card.name.clone(),
            description: self.card.description.clone(),
            public_perms: self.card.public_perms,
            is_saved: self.card.id.is_some(),
            save_ready: self.save_ready,
            download_link: self.download_link(),
        }
    }

    pub fn editor_model(&self) -> EditorModel {
        EditorModel {
            databases: self.databases.clone(),
            initial_query: self.initial_query.clone(),
            mode: self.card.dataset_query.as_ref().and_then(DatasetQuery::mode),
            tables: self.tables.clone(),
            table_metadata: self.table_metadata.clone(),
        }
    }

    pub fn visualization_model(&self) -> VisualizationModel {
        VisualizationModel {
            display: self.card.display,
            settings: self.card.visualization_settings.clone(),
            result: self.result.clone(),
        }
    }

    /// CSV export path embedding the current dataset query, or `None`
    /// until a result exists. Absence means "no link", not an error.
    pub fn download_link(&self) -> Option<String> {
        self.result.as_ref()?;
        let query = self.card.dataset_query.as_ref()?;
        let payload = serde_json::to_string(query).ok()?;
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("query", &payload)
            .finish();
        Some(format!("{CSV_EXPORT_PATH}?{encoded}"))
    }

    // ===== command dispatch

    pub fn dispatch(&mut self, command: DetailCommand) -> Vec<DetailEffect> {
        match command {
            DetailCommand::OrganizationChanged(None) => Vec::new(),
            DetailCommand::OrganizationChanged(Some(org)) => {
                let request_id = self.next_request_id();
                self.in_flight.databases = Some(request_id);
                let org_id = org.id;
                self.org = Some(org);
                vec![DetailEffect::Request(DetailRequest::FetchDatabases {
                    request_id,
                    org: org_id,
                })]
            }
            DetailCommand::SaveHeader { name, description } => {
                self.card.name = Some(name);
                self.card.description = description;
                if self.card.id.is_some() {
                    let request_id = self.next_request_id();
                    self.in_flight.update = Some(request_id);
                    vec![DetailEffect::Request(DetailRequest::UpdateCard {
                        request_id,
                        card: self.card.clone(),
                    })]
                } else {
                    let Some(org) = &self.org else {
                        log::warn!("cannot create a card before the organization is known");
                        return Vec::new();
                    };
                    self.card.organization = Some(org.id);
                    let request_id = self.next_request_id();
                    self.in_flight.create = Some(request_id);
                    vec![DetailEffect::Request(DetailRequest::CreateCard {
                        request_id,
                        card: self.card.clone(),
                    })]
                }
            }
            DetailCommand::SetPermissions(perms) => {
                self.card.public_perms = perms;
                vec![DetailEffect::Render(RenderRegion::Header)]
            }
            DetailCommand::SetQueryMode(raw) => {
                // Unknown modes are a silent no-op; known modes replace the
                // dataset query wholesale with a fresh template. No render
                // is published here, matching the shipped behavior
                // (DESIGN.md).
                if let Some(mode) = QueryMode::parse(&raw) {
                    self.card.dataset_query = Some(DatasetQuery::template(mode));
                }
                Vec::new()
            }
            DetailCommand::SetDatabase(database_id) => {
                match &mut self.card.dataset_query {
                    Some(DatasetQuery::Query { database, .. })
                    | Some(DatasetQuery::Native { database, .. }) => {
                        *database = Some(database_id);
                    }
                    Some(DatasetQuery::Result { .. }) | None => {
                        log::warn!("no editable dataset query to set a database on");
                        return Vec::new();
                    }
                }
                vec![DetailEffect::Render(RenderRegion::Editor)]
            }
            DetailCommand::SetNativeQuery(text) => {
                if let Some(DatasetQuery::Native { native, .. }) = &mut self.card.dataset_query {
                    native.query = text;
                }
                Vec::new()
            }
            DetailCommand::RunQuery => {
                let Some(query) = self.card.dataset_query.clone() else {
                    log::warn!("run requested with no dataset query");
                    return Vec::new();
                };
                let request_id = self.next_request_id();
                // Only the newest run's reply will be applied.
                self.in_flight.run = Some(request_id);
                vec![DetailEffect::Request(DetailRequest::RunDataset {
                    request_id,
                    query,
                })]
            }
            DetailCommand::SetDisplay(display) => {
                self.card.display = display;
                // Prior settings are always discarded on a type change.
                self.card.visualization_settings =
                    settings_for_display(&VisualizationSettings::default(), display);
                vec![DetailEffect::Render(RenderRegion::Visualization)]
            }
            DetailCommand::LoadTables(database) => {
                let request_id = self.next_request_id();
                self.in_flight.tables = Some(request_id);
                vec![DetailEffect::Request(DetailRequest::FetchTables {
                    request_id,
                    database,
                })]
            }
            DetailCommand::LoadTableMetadata(table) => {
                let request_id = self.next_request_id();
                self.in_flight.table_metadata = Some(request_id);
                vec![DetailEffect::Request(DetailRequest::FetchTableMetadata {
                    request_id,
                    table,
                })]
            }
        }
    }

    // ===== reply handling

    pub fn handle_reply(&mut self, reply: DetailReply) -> Vec<DetailEffect> {
        match reply {
            DetailReply::DatabasesFetched {
                request_id,
                outcome,
            } => {
                if !take_if_current(&mut self.in_flight.databases, request_id) {
                    return Vec::new();
                }
                match outcome {
                    Ok(databases) => {
                        if databases.is_empty() {
                            // Without a database the editor is meaningless;
                            // leave the screen un-initialized.
                            log::warn!("organization has no databases; query builder disabled");
                            return Vec::new();
                        }
                        self.databases = Some(databases);
                        if self.initialized {
                            vec![DetailEffect::Render(RenderRegion::Editor)]
                        } else {
                            self.initialized = true;
                            self.start_init()
                        }
                    }
                    Err(error) => {
                        log::warn!("error getting database list: {error}");
                        Vec::new()
                    }
                }
            }
            DetailReply::CardFetched {
                request_id,
                outcome,
            } => {
                if !take_if_current(&mut self.in_flight.card_load, request_id) {
                    return Vec::new();
                }
                match outcome {
                    Ok(mut card) => {
                        if self.cloning {
                            card.id = None;
                            card.organization = self.org.as_ref().map(|org| org.id);
                            self.save_ready = true;
                        }
                        self.initial_query = card.dataset_query.clone();
                        self.card = card;
                        render_all()
                    }
                    Err(error) if error.is_not_found() => {
                        vec![DetailEffect::Navigate("/".to_owned())]
                    }
                    Err(error) => {
                        log::warn!("error loading card: {error}");
                        Vec::new()
                    }
                }
            }
            DetailReply::LegacyQueryFetched {
                request_id,
                outcome,
            } => {
                if !take_if_current(&mut self.in_flight.legacy_query, request_id) {
                    return Vec::new();
                }
                match outcome {
                    Ok(query) => {
                        self.card = Card {
                            organization: self.org.as_ref().map(|org| org.id),
                            name: Some(query.name),
                            dataset_query: Some(DatasetQuery::Result {
                                database: query.database.id,
                                result: SavedQueryRef { query_id: query.id },
                            }),
                            ..Card::empty()
                        };
                        self.initial_query = self.card.dataset_query.clone();
                        self.save_ready = true;

                        // The derived card's data is fetched immediately.
                        let mut effects = self.dispatch(DetailCommand::RunQuery);
                        effects.extend(render_all());
                        effects
                    }
                    Err(error) if error.is_not_found() => {
                        vec![DetailEffect::Navigate("/".to_owned())]
                    }
                    Err(error) => {
                        log::warn!("error loading legacy query: {error}");
                        Vec::new()
                    }
                }
            }
            DetailReply::DatasetRun {
                request_id,
                outcome,
            } => {
                if !take_if_current(&mut self.in_flight.run, request_id) {
                    return Vec::new();
                }
                match outcome {
                    Ok(result) => {
                        self.result = Some(result);
                        render_all()
                    }
                    Err(error) => {
                        log::warn!("could not run card: {error}");
                        Vec::new()
                    }
                }
            }
            DetailReply::CardCreated {
                request_id,
                outcome,
            } => {
                if !take_if_current(&mut self.in_flight.create, request_id) {
                    return Vec::new();
                }
                match outcome {
                    Ok(created) => match (&self.org, created.id) {
                        (Some(org), Some(id)) => {
                            vec![DetailEffect::Navigate(format!(
                                "/{}/card/{}",
                                org.slug,
                                id.get()
                            ))]
                        }
                        _ => {
                            log::warn!("card created but no destination to navigate to");
                            Vec::new()
                        }
                    },
                    Err(error) => {
                        log::warn!("error creating card: {error}");
                        Vec::new()
                    }
                }
            }
            DetailReply::CardUpdated {
                request_id,
                outcome,
            } => {
                if !take_if_current(&mut self.in_flight.update, request_id) {
                    return Vec::new();
                }
                match outcome {
                    // Accepted and discarded: the header is not republished
                    // on update success (DESIGN.md).
                    Ok(UpdateReply::Saved(_)) => Vec::new(),
                    Ok(UpdateReply::Rejected(message)) => {
                        log::warn!("card update rejected: {message}");
                        Vec::new()
                    }
                    Err(error) => {
                        log::warn!("error updating card: {error}");
                        Vec::new()
                    }
                }
            }
            DetailReply::TablesFetched {
                request_id,
                outcome,
            } => {
                if !take_if_current(&mut self.in_flight.tables, request_id) {
                    return Vec::new();
                }
                match outcome {
                    Ok(tables) => {
                        self.tables = Some(tables);
                        vec![DetailEffect::Render(RenderRegion::Editor)]
                    }
                    Err(error) => {
                        log::warn!("error getting tables: {error}");
                        Vec::new()
                    }
                }
            }
            DetailReply::TableMetadataFetched {
                request_id,
                outcome,
            } => {
                if !take_if_current(&mut self.in_flight.table_metadata, request_id) {
                    return Vec::new();
                }
                match outcome {
                    Ok(metadata) => {
                        self.table_metadata = Some(mark_up_table(metadata));
                        vec![DetailEffect::Render(RenderRegion::Editor)]
                    }
                    Err(error) => {
                        log::warn!("error getting table metadata: {error}");
                        Vec::new()
                    }
                }
            }
        }
    }

    /// One-shot initialization once the database list has resolved
    /// non-empty. Selects the path the route parameters picked at
    /// construction.
    fn start_init(&mut self) -> Vec<DetailEffect> {
        match self.route {
            Route::Edit(card) => {
                self.cloning = false;
                let request_id = self.next_request_id();
                self.in_flight.card_load = Some(request_id);
                vec![DetailEffect::Request(DetailRequest::FetchCard {
                    request_id,
                    card,
                })]
            }
            Route::Clone(card) => {
                self.cloning = true;
                let request_id = self.next_request_id();
                self.in_flight.card_load = Some(request_id);
                vec![DetailEffect::Request(DetailRequest::FetchCard {
                    request_id,
                    card,
                })]
            }
            Route::FromQuery(query) => {
                let request_id = self.next_request_id();
                self.in_flight.legacy_query = Some(request_id);
                vec![DetailEffect::Request(DetailRequest::FetchLegacyQuery {
                    request_id,
                    query,
                })]
            }
            Route::Blank => render_all(),
        }
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }
}

fn render_all() -> Vec<DetailEffect> {
    RenderRegion::ALL
        .into_iter()
        .map(DetailEffect::Render)
        .collect()
}

fn take_if_current(slot: &mut Option<u64>, request_id: u64) -> bool {
    if *slot == Some(request_id) {
        *slot = None;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{CardDetailScreen, DetailCommand, DetailEffect, Route};
    use crate::ids::{CardId, DatabaseId, FieldId, OrgId, QueryId, TableId};
    use crate::model::{
        Card, Database, DatasetQuery, DisplayType, Field, LegacyQuery, Organization, PublicPerms,
        QueryMode, QueryResult, Table, TableMetadata,
    };
    use crate::remote::{ApiError, DetailReply, DetailRequest, UpdateReply};
    use crate::viewmodel::RenderRegion;
    use serde_json::json;

    fn org() -> Organization {
        Organization {
            id: OrgId::new(1),
            slug: "acme".to_owned(),
            name: "Acme".to_owned(),
        }
    }

    fn databases() -> Vec<Database> {
        vec![Database {
            id: DatabaseId::new(3),
            name: "warehouse".to_owned(),
            engine: "postgres".to_owned(),
        }]
    }

    fn result() -> QueryResult {
        QueryResult {
            columns: vec!["count".to_owned()],
            rows: vec![vec![json!(42)]],
        }
    }

    fn saved_card(id: i64) -> Card {
        Card {
            id: Some(CardId::new(id)),
            name: Some("Revenue".to_owned()),
            organization: Some(OrgId::new(9)),
            dataset_query: Some(DatasetQuery::template(QueryMode::Native)),
            ..Card::empty()
        }
    }

    fn single_request(effects: &[DetailEffect]) -> &DetailRequest {
        match effects {
            [DetailEffect::Request(request)] => request,
            other => panic!("expected exactly one request effect, got {other:?}"),
        }
    }

    fn render_all_effects() -> Vec<DetailEffect> {
        vec![
            DetailEffect::Render(RenderRegion::Header),
            DetailEffect::Render(RenderRegion::Editor),
            DetailEffect::Render(RenderRegion::Visualization),
        ]
    }

    /// Drive a screen through org arrival and a successful database fetch.
    fn screen_with_databases(route: Route) -> (CardDetailScreen, Vec<DetailEffect>) {
        let mut screen = CardDetailScreen::new(route);
        let effects = screen.dispatch(DetailCommand::OrganizationChanged(Some(org())));
        let request_id = single_request(&effects).request_id();
        let effects = screen.handle_reply(DetailReply::DatabasesFetched {
            request_id,
            outcome: Ok(databases()),
        });
        (screen, effects)
    }

    #[test]
    fn route_selection_precedence() {
        let card = Some(CardId::new(5));
        let query = Some(QueryId::new(8));
        assert_eq!(Route::from_params(card, false, None), Route::Edit(CardId::new(5)));
        assert_eq!(Route::from_params(card, true, query), Route::Clone(CardId::new(5)));
        assert_eq!(
            Route::from_params(None, false, query),
            Route::FromQuery(QueryId::new(8))
        );
        assert_eq!(Route::from_params(None, true, None), Route::Blank);
    }

    #[test]
    fn empty_organization_emission_is_ignored() {
        let mut screen = CardDetailScreen::new(Route::Blank);
        assert!(screen
            .dispatch(DetailCommand::OrganizationChanged(None))
            .is_empty());
    }

    #[test]
    fn blank_route_renders_all_regions_after_databases_resolve() {
        let (screen, effects) = screen_with_databases(Route::Blank);
        assert_eq!(effects, render_all_effects());
        assert!(screen.initialized());
        assert!(screen.editor_model().databases.is_some());
    }

    #[test]
    fn empty_database_list_withholds_initialization_entirely() {
        let mut screen = CardDetailScreen::new(Route::Edit(CardId::new(5)));
        let effects = screen.dispatch(DetailCommand::OrganizationChanged(Some(org())));
        let request_id = single_request(&effects).request_id();

        let effects = screen.handle_reply(DetailReply::DatabasesFetched {
            request_id,
            outcome: Ok(Vec::new()),
        });

        assert!(effects.is_empty());
        assert!(!screen.initialized());
        assert!(screen.editor_model().databases.is_none());
    }

    #[test]
    fn database_fetch_failure_is_logged_only() {
        let mut screen = CardDetailScreen::new(Route::Blank);
        let effects = screen.dispatch(DetailCommand::OrganizationChanged(Some(org())));
        let request_id = single_request(&effects).request_id();
        let effects = screen.handle_reply(DetailReply::DatabasesFetched {
            request_id,
            outcome: Err(ApiError::new("connection refused")),
        });
        assert!(effects.is_empty());
        assert!(!screen.initialized());
    }

    #[test]
    fn edit_route_loads_the_card_then_renders_all() {
        let (mut screen, effects) = screen_with_databases(Route::Edit(CardId::new(5)));
        let request_id = match single_request(&effects) {
            DetailRequest::FetchCard { request_id, card } => {
                assert_eq!(card.get(), 5);
                *request_id
            }
            other => panic!("expected card fetch, got {other:?}"),
        };

        let effects = screen.handle_reply(DetailReply::CardFetched {
            request_id,
            outcome: Ok(saved_card(5)),
        });

        assert_eq!(effects, render_all_effects());
        assert_eq!(screen.card().id, Some(CardId::new(5)));
        assert_eq!(
            screen.editor_model().initial_query,
            Some(DatasetQuery::template(QueryMode::Native))
        );
        assert!(!screen.save_ready());
    }

    #[test]
    fn clone_route_clears_identity_and_is_save_ready_before_rendering() {
        let (mut screen, effects) = screen_with_databases(Route::Clone(CardId::new(5)));
        let request_id = single_request(&effects).request_id();

        let effects = screen.handle_reply(DetailReply::CardFetched {
            request_id,
            outcome: Ok(saved_card(5)),
        });

        assert_eq!(effects, render_all_effects());
        assert_eq!(screen.card().id, None);
        assert_eq!(screen.card().organization, Some(OrgId::new(1)));
        assert!(screen.save_ready());
        assert!(screen.header_model().save_ready);
    }

    #[test]
    fn card_not_found_navigates_to_root_and_stops() {
        let (mut screen, effects) = screen_with_databases(Route::Edit(CardId::new(5)));
        let request_id = single_request(&effects).request_id();

        let effects = screen.handle_reply(DetailReply::CardFetched {
            request_id,
            outcome: Err(ApiError::with_status(404, "no such card")),
        });

        assert_eq!(effects, vec![DetailEffect::Navigate("/".to_owned())]);
        assert!(screen.visualization_model().result.is_none());
        assert_eq!(screen.card(), &Card::empty());
    }

    #[test]
    fn card_load_failure_other_than_not_found_is_logged_only() {
        let (mut screen, effects) = screen_with_databases(Route::Edit(CardId::new(5)));
        let request_id = single_request(&effects).request_id();
        let effects = screen.handle_reply(DetailReply::CardFetched {
            request_id,
            outcome: Err(ApiError::with_status(500, "boom")),
        });
        assert!(effects.is_empty());
    }

    #[test]
    fn legacy_query_derivation_synthesizes_and_runs_immediately() {
        let (mut screen, effects) = screen_with_databases(Route::FromQuery(QueryId::new(8)));
        let request_id = single_request(&effects).request_id();

        let effects = screen.handle_reply(DetailReply::LegacyQueryFetched {
            request_id,
            outcome: Ok(LegacyQuery {
                id: QueryId::new(8),
                name: "Old revenue query".to_owned(),
                database: databases().remove(0),
            }),
        });

        match &effects[0] {
            DetailEffect::Request(DetailRequest::RunDataset { query, .. }) => {
                assert_eq!(
                    serde_json::to_value(query).expect("serialize"),
                    json!({
                        "type": "result",
                        "database": 3,
                        "result": { "query_id": 8 }
                    })
                );
            }
            other => panic!("expected immediate run, got {other:?}"),
        }
        assert_eq!(effects[1..], render_all_effects()[..]);

        assert!(screen.save_ready());
        assert_eq!(screen.card().name.as_deref(), Some("Old revenue query"));
        assert_eq!(screen.card().organization, Some(OrgId::new(1)));
        assert_eq!(screen.card().display, DisplayType::Table);
    }

    #[test]
    fn legacy_query_not_found_navigates_to_root() {
        let (mut screen, effects) = screen_with_databases(Route::FromQuery(QueryId::new(8)));
        let request_id = single_request(&effects).request_id();
        let effects = screen.handle_reply(DetailReply::LegacyQueryFetched {
            request_id,
            outcome: Err(ApiError::with_status(404, "gone")),
        });
        assert_eq!(effects, vec![DetailEffect::Navigate("/".to_owned())]);
    }

    #[test]
    fn set_query_mode_replaces_wholesale_with_the_template() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));
        screen.dispatch(DetailCommand::SetNativeQuery("SELECT 1".to_owned()));

        let effects = screen.dispatch(DetailCommand::SetQueryMode("query".to_owned()));
        assert!(effects.is_empty());

        // No residual native fields: the replacement is the exact template.
        assert_eq!(
            serde_json::to_value(screen.card().dataset_query.as_ref().expect("query"))
                .expect("serialize"),
            json!({
                "type": "query",
                "query": {
                    "aggregation": [null],
                    "breakout": [],
                    "filter": []
                }
            })
        );
    }

    #[test]
    fn unknown_query_mode_is_a_silent_no_op() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));
        let before = screen.card().dataset_query.clone();

        let effects = screen.dispatch(DetailCommand::SetQueryMode("bogus".to_owned()));
        assert!(effects.is_empty());
        assert_eq!(screen.card().dataset_query, before);
    }

    #[test]
    fn set_permissions_publishes_header_only() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        let effects = screen.dispatch(DetailCommand::SetPermissions(PublicPerms::ReadOnly));
        assert_eq!(effects, vec![DetailEffect::Render(RenderRegion::Header)]);
        assert_eq!(screen.header_model().public_perms, PublicPerms::ReadOnly);
    }

    #[test]
    fn set_display_discards_prior_settings_and_publishes_visualization() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetDisplay(DisplayType::Table));
        assert!(screen
            .visualization_model()
            .settings
            .get("table.pivot")
            .is_some());

        let effects = screen.dispatch(DetailCommand::SetDisplay(DisplayType::Bar));
        assert_eq!(
            effects,
            vec![DetailEffect::Render(RenderRegion::Visualization)]
        );
        let model = screen.visualization_model();
        assert_eq!(model.display, DisplayType::Bar);
        assert!(model.settings.get("table.pivot").is_none());
        assert!(model.settings.get("bar.stacked").is_some());
    }

    #[test]
    fn run_query_applies_result_and_publishes_all_regions() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));

        let effects = screen.dispatch(DetailCommand::RunQuery);
        let request_id = single_request(&effects).request_id();
        let effects = screen.handle_reply(DetailReply::DatasetRun {
            request_id,
            outcome: Ok(result()),
        });

        assert_eq!(effects, render_all_effects());
        assert_eq!(screen.visualization_model().result, Some(result()));
    }

    #[test]
    fn superseded_run_reply_cannot_overwrite_the_newer_result() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));

        let first = single_request(&screen.dispatch(DetailCommand::RunQuery)).request_id();
        let second = single_request(&screen.dispatch(DetailCommand::RunQuery)).request_id();

        let newer = QueryResult {
            columns: vec!["count".to_owned()],
            rows: vec![vec![json!(2)]],
        };
        screen.handle_reply(DetailReply::DatasetRun {
            request_id: second,
            outcome: Ok(newer.clone()),
        });

        // The older run resolves afterwards; it must be suppressed.
        let stale = screen.handle_reply(DetailReply::DatasetRun {
            request_id: first,
            outcome: Ok(result()),
        });
        assert!(stale.is_empty());
        assert_eq!(screen.visualization_model().result, Some(newer));
    }

    #[test]
    fn run_failure_is_logged_only() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));
        let request_id = single_request(&screen.dispatch(DetailCommand::RunQuery)).request_id();
        let effects = screen.handle_reply(DetailReply::DatasetRun {
            request_id,
            outcome: Err(ApiError::new("timeout")),
        });
        assert!(effects.is_empty());
        assert!(screen.result().is_none());
    }

    #[test]
    fn download_link_absent_until_a_result_exists() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));
        assert_eq!(screen.download_link(), None);

        let request_id = single_request(&screen.dispatch(DetailCommand::RunQuery)).request_id();
        screen.handle_reply(DetailReply::DatasetRun {
            request_id,
            outcome: Ok(result()),
        });

        let link = screen.download_link().expect("link after result");
        assert!(link.starts_with("/api/meta/dataset/csv?query="));

        let (_, payload) = url::form_urlencoded::parse(
            link.trim_start_matches("/api/meta/dataset/csv?").as_bytes(),
        )
        .next()
        .expect("query parameter");
        let decoded: DatasetQuery = serde_json::from_str(&payload).expect("embedded query");
        assert_eq!(Some(decoded), screen.card().dataset_query.clone());
    }

    #[test]
    fn header_save_on_unsaved_card_stamps_org_and_navigates_on_create() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));

        let effects = screen.dispatch(DetailCommand::SaveHeader {
            name: "Weekly actives".to_owned(),
            description: Some("rolling".to_owned()),
        });
        let request_id = match single_request(&effects) {
            DetailRequest::CreateCard { request_id, card } => {
                assert_eq!(card.organization, Some(OrgId::new(1)));
                assert_eq!(card.name.as_deref(), Some("Weekly actives"));
                *request_id
            }
            other => panic!("expected create, got {other:?}"),
        };

        let mut created = screen.card().clone();
        created.id = Some(CardId::new(7));
        let effects = screen.handle_reply(DetailReply::CardCreated {
            request_id,
            outcome: Ok(created),
        });
        assert_eq!(
            effects,
            vec![DetailEffect::Navigate("/acme/card/7".to_owned())]
        );
    }

    #[test]
    fn header_save_on_saved_card_updates_without_republishing() {
        let (mut screen, effects) = screen_with_databases(Route::Edit(CardId::new(5)));
        let request_id = single_request(&effects).request_id();
        screen.handle_reply(DetailReply::CardFetched {
            request_id,
            outcome: Ok(saved_card(5)),
        });

        let effects = screen.dispatch(DetailCommand::SaveHeader {
            name: "Renamed".to_owned(),
            description: None,
        });
        let request_id = match single_request(&effects) {
            DetailRequest::UpdateCard { request_id, card } => {
                assert_eq!(card.name.as_deref(), Some("Renamed"));
                *request_id
            }
            other => panic!("expected update, got {other:?}"),
        };

        let effects = screen.handle_reply(DetailReply::CardUpdated {
            request_id,
            outcome: Ok(UpdateReply::Saved(screen.card().clone())),
        });
        assert!(effects.is_empty());
    }

    #[test]
    fn set_database_targets_the_editable_query_and_publishes_editor() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));

        let effects = screen.dispatch(DetailCommand::SetDatabase(DatabaseId::new(3)));
        assert_eq!(effects, vec![DetailEffect::Render(RenderRegion::Editor)]);
        assert_eq!(
            screen.card().dataset_query.as_ref().and_then(DatasetQuery::database),
            Some(DatabaseId::new(3))
        );
    }

    #[test]
    fn set_database_without_an_editable_query_is_a_no_op() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        assert!(screen
            .dispatch(DetailCommand::SetDatabase(DatabaseId::new(3)))
            .is_empty());
        assert!(screen.card().dataset_query.is_none());
    }

    #[test]
    fn load_tables_fetches_and_publishes_editor() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        let effects = screen.dispatch(DetailCommand::LoadTables(DatabaseId::new(3)));
        let request_id = match single_request(&effects) {
            DetailRequest::FetchTables {
                request_id,
                database,
            } => {
                assert_eq!(database.get(), 3);
                *request_id
            }
            other => panic!("expected table fetch, got {other:?}"),
        };

        let effects = screen.handle_reply(DetailReply::TablesFetched {
            request_id,
            outcome: Ok(vec![Table {
                id: TableId::new(4),
                name: "orders".to_owned(),
                database_id: DatabaseId::new(3),
            }]),
        });

        assert_eq!(effects, vec![DetailEffect::Render(RenderRegion::Editor)]);
        let tables = screen.editor_model().tables.expect("tables");
        assert_eq!(tables[0].name, "orders");
    }

    #[test]
    fn table_metadata_arrives_marked_up_and_publishes_editor() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        let effects = screen.dispatch(DetailCommand::LoadTableMetadata(TableId::new(4)));
        let request_id = single_request(&effects).request_id();

        let effects = screen.handle_reply(DetailReply::TableMetadataFetched {
            request_id,
            outcome: Ok(TableMetadata {
                id: TableId::new(4),
                name: "orders".to_owned(),
                fields: vec![Field {
                    id: FieldId::new(1),
                    name: "total".to_owned(),
                    base_type: "FloatField".to_owned(),
                }],
            }),
        });

        assert_eq!(effects, vec![DetailEffect::Render(RenderRegion::Editor)]);
        let marked = screen.editor_model().table_metadata.expect("metadata");
        assert!(!marked.fields[0].operators.is_empty());
    }

    #[test]
    fn view_models_always_project_the_current_card() {
        let (mut screen, _) = screen_with_databases(Route::Blank);
        screen.dispatch(DetailCommand::SetPermissions(PublicPerms::ReadWrite));
        screen.dispatch(DetailCommand::SetDisplay(DisplayType::Pie));
        screen.dispatch(DetailCommand::SetQueryMode("native".to_owned()));

        assert_eq!(screen.header_model().public_perms, PublicPerms::ReadWrite);
        assert_eq!(screen.visualization_model().display, DisplayType::Pie);
        assert_eq!(screen.editor_model().mode, Some(QueryMode::Native));
    }
}
