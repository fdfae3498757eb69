// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Blocking HTTP client for the card service. Every endpoint returns
//! `ApiResult` so callers keep the status code; the controllers only care
//! whether a failure was a 404.

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use tablero_app::ids::{CardId, DatabaseId, OrgId, QueryId, TableId};
use tablero_app::model::{
    Card, Database, DatasetQuery, FilterMode, LegacyQuery, Organization, QueryResult, Table,
    TableMetadata,
};
use tablero_app::remote::{ApiError, ApiResult, UpdateReply};

pub mod dispatch;

pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cheap reachability probe for `--check`.
    pub fn ping(&self, org_slug: &str) -> Result<Organization> {
        self.organization_by_slug(org_slug)
            .map_err(anyhow::Error::from)
    }

    pub fn organization_by_slug(&self, slug: &str) -> ApiResult<Organization> {
        let response = self.get(&format!("/api/org/slug/{slug}"))?;
        read_json(response, "organization")
    }

    pub fn list_cards(&self, org: OrgId, filter: FilterMode) -> ApiResult<Vec<Card>> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("orgId", &org.get().to_string())
            .append_pair("f", filter.as_str())
            .finish();
        let response = self.get(&format!("/api/card/?{query}"))?;
        read_json(response, "card list")
    }

    pub fn get_card(&self, card: CardId) -> ApiResult<Card> {
        let response = self.get(&format!("/api/card/{}", card.get()))?;
        read_json(response, "card")
    }

    pub fn create_card(&self, card: &Card) -> ApiResult<Card> {
        let response = self.send(
            self.http
                .post(format!("{}/api/card", self.base_url))
                .json(card),
        )?;
        read_json(response, "created card")
    }

    /// Update a saved card. The service can answer 200 with an error
    /// envelope instead of the saved card; that surfaces as `Rejected`.
    pub fn update_card(&self, card: &Card) -> ApiResult<UpdateReply> {
        let Some(id) = card.id else {
            return Err(ApiError::new("cannot update a card that was never saved"));
        };
        let response = self.send(
            self.http
                .put(format!("{}/api/card/{}", self.base_url, id.get()))
                .json(card),
        )?;
        let body = response
            .text()
            .map_err(|error| ApiError::new(format!("read update response: {error}")))?;

        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body)
            && let Some(message) = envelope.error
        {
            return Ok(UpdateReply::Rejected(message));
        }

        let saved: Card = serde_json::from_str(&body)
            .map_err(|error| ApiError::new(format!("decode updated card: {error}")))?;
        Ok(UpdateReply::Saved(saved))
    }

    pub fn delete_card(&self, card: CardId) -> ApiResult<()> {
        self.send(
            self.http
                .delete(format!("{}/api/card/{}", self.base_url, card.get())),
        )?;
        Ok(())
    }

    pub fn unfavorite_card(&self, card: CardId) -> ApiResult<()> {
        self.send(
            self.http
                .post(format!("{}/api/card/{}/unfavorite", self.base_url, card.get())),
        )?;
        Ok(())
    }

    pub fn get_legacy_query(&self, query: QueryId) -> ApiResult<LegacyQuery> {
        let response = self.get(&format!("/api/query/{}", query.get()))?;
        read_json(response, "legacy query")
    }

    pub fn list_databases(&self, org: OrgId) -> ApiResult<Vec<Database>> {
        let response = self.get(&format!("/api/meta/db/?orgId={}", org.get()))?;
        read_json(response, "database list")
    }

    pub fn list_tables(&self, database: DatabaseId) -> ApiResult<Vec<Table>> {
        let response = self.get(&format!("/api/meta/db/{}/tables", database.get()))?;
        read_json(response, "table list")
    }

    pub fn table_metadata(&self, table: TableId) -> ApiResult<TableMetadata> {
        let response = self.get(&format!("/api/meta/table/{}/query_metadata", table.get()))?;
        read_json(response, "table metadata")
    }

    pub fn run_dataset(&self, query: &DatasetQuery) -> ApiResult<QueryResult> {
        let response = self.send(
            self.http
                .post(format!("{}/api/meta/dataset", self.base_url))
                .json(query),
        )?;
        read_json(response, "query result")
    }

    fn get(&self, path: &str) -> ApiResult<Response> {
        self.send(self.http.get(format!("{}{path}", self.base_url)))
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> ApiResult<Response> {
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, &error))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(error_response(status, &body));
        }
        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

fn connection_error(base_url: &str, error: &reqwest::Error) -> ApiError {
    ApiError::new(format!("cannot reach {base_url} ({error})"))
}

fn error_response(status: StatusCode, body: &str) -> ApiError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = envelope.error
        && !message.is_empty()
    {
        return ApiError::with_status(status.as_u16(), message);
    }

    if body.len() < 100 && !body.contains('{') && !body.is_empty() {
        return ApiError::with_status(status.as_u16(), body);
    }

    ApiError::with_status(status.as_u16(), format!("server returned {}", status.as_u16()))
}

fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> ApiResult<T> {
    response
        .json()
        .map_err(|error| ApiError::new(format!("decode {what}: {error}")))
}
