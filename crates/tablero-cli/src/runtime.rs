// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use tablero_api::dispatch::{execute_detail_request, execute_list_request};
use tablero_app::model::Organization;
use tablero_app::remote::{DetailReply, DetailRequest, ListReply, ListRequest};
use tablero_testkit::StaticService;
use tablero_tui::{ApiRuntime, InternalEvent};

/// Runtime backed by the real card service. Requests run on worker
/// threads so the event loop never blocks on the network; completions
/// land on the internal channel and are reconciled by request id.
pub struct HttpRuntime {
    client: Arc<tablero_api::Client>,
    org_slug: String,
}

impl HttpRuntime {
    pub fn new(client: tablero_api::Client, org_slug: &str) -> Self {
        Self {
            client: Arc::new(client),
            org_slug: org_slug.to_owned(),
        }
    }
}

impl ApiRuntime for HttpRuntime {
    fn fetch_organization(&mut self) -> Result<Organization> {
        self.client
            .organization_by_slug(&self.org_slug)
            .map_err(anyhow::Error::from)
    }

    fn execute_list(&mut self, request: ListRequest) -> ListReply {
        execute_list_request(&self.client, request)
    }

    fn execute_detail(&mut self, request: DetailRequest) -> DetailReply {
        execute_detail_request(&self.client, request)
    }

    fn spawn_organization(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let client = Arc::clone(&self.client);
        let slug = self.org_slug.clone();
        thread::spawn(move || {
            let outcome = client
                .organization_by_slug(&slug)
                .map_err(|error| error.to_string());
            let _ = tx.send(InternalEvent::OrganizationLoaded(outcome));
        });
        Ok(())
    }

    fn spawn_list(&mut self, request: ListRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let client = Arc::clone(&self.client);
        thread::spawn(move || {
            let reply = execute_list_request(&client, request);
            let _ = tx.send(InternalEvent::List(reply));
        });
        Ok(())
    }

    fn spawn_detail(&mut self, request: DetailRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let client = Arc::clone(&self.client);
        thread::spawn(move || {
            let reply = execute_detail_request(&client, request);
            let _ = tx.send(InternalEvent::Detail(reply));
        });
        Ok(())
    }
}

/// Runtime for `--demo`: seeded in-memory data, inline execution.
pub struct DemoRuntime {
    service: StaticService,
}

impl DemoRuntime {
    pub fn new(seed: u64) -> Self {
        Self {
            service: StaticService::new(seed),
        }
    }
}

impl ApiRuntime for DemoRuntime {
    fn fetch_organization(&mut self) -> Result<Organization> {
        Ok(self.service.organization())
    }

    fn execute_list(&mut self, request: ListRequest) -> ListReply {
        self.service.execute_list(request)
    }

    fn execute_detail(&mut self, request: DetailRequest) -> DetailReply {
        self.service.execute_detail(request)
    }
}

#[cfg(test)]
mod tests {
    use super::DemoRuntime;
    use tablero_app::ids::OrgId;
    use tablero_app::model::FilterMode;
    use tablero_app::remote::{ListReply, ListRequest};
    use tablero_tui::ApiRuntime;

    #[test]
    fn demo_runtime_serves_seeded_cards() {
        let mut runtime = DemoRuntime::new(7);
        let org = runtime.fetch_organization().expect("organization");
        assert_eq!(org.slug, "acme");

        let reply = runtime.execute_list(ListRequest::FetchCards {
            request_id: 1,
            org: OrgId::new(1),
            filter: FilterMode::All,
        });
        match reply {
            ListReply::CardsFetched { outcome, .. } => {
                assert!(!outcome.expect("cards").is_empty());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
