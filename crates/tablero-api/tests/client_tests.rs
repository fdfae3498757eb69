// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::thread;
use std::time::Duration;
use tablero_api::Client;
use tablero_app::ids::{CardId, OrgId};
use tablero_app::model::{Card, DatasetQuery, FilterMode, QueryMode};
use tablero_app::remote::UpdateReply;
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_server_reports_connection_error_without_status() {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .list_cards(OrgId::new(1), FilterMode::All)
        .expect_err("fetch should fail for unreachable endpoint");
    assert_eq!(error.status, None);
    assert!(error.message.contains("cannot reach"));
}

#[test]
fn card_list_request_carries_org_and_filter_parameters() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/card/?orgId=7&f=fav");
        request
            .respond(json_response(r#"[{"name":"Revenue","id":3}]"#, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let cards = client.list_cards(OrgId::new(7), FilterMode::Fav)?;
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id, Some(CardId::new(3)));
    assert_eq!(cards[0].name.as_deref(), Some("Revenue"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn missing_card_maps_to_a_not_found_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/card/42");
        request
            .respond(json_response(r#"{"error":"card not found"}"#, 404))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .get_card(CardId::new(42))
        .expect_err("missing card should error");
    assert!(error.is_not_found());
    assert!(error.message.contains("card not found"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn update_rejection_envelope_in_a_200_surfaces_as_rejected() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/card/3");
        request
            .respond(json_response(r#"{"error":"name already taken"}"#, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let card = Card {
        id: Some(CardId::new(3)),
        name: Some("Revenue".to_owned()),
        ..Card::empty()
    };
    let reply = client.update_card(&card)?;
    assert_eq!(reply, UpdateReply::Rejected("name already taken".to_owned()));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn dataset_run_posts_the_query_and_decodes_the_result() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/meta/dataset");
        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("read request body");
        let sent: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(sent["type"], "native");

        request
            .respond(json_response(
                r#"{"columns":["count"],"rows":[[42]]}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let result = client.run_dataset(&DatasetQuery::template(QueryMode::Native))?;
    assert_eq!(result.columns, vec!["count".to_owned()]);
    assert_eq!(result.rows, vec![vec![serde_json::json!(42)]]);

    handle.join().expect("server thread should join");
    Ok(())
}
