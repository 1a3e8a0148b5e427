#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use outage_tickets::{
    api, config,
    db::{self, log, subticket, ticket, user, Repository},
    server::{self, AppState},
};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const PASSWORD: &str = "password";

/// Store seeded with `alice` (superuser), `bob` (`ticket.edit` only) and
/// `charlie` (no permissions).
pub fn seeded_memory() -> db::Memory {
    let seed = |name: &str, role, permissions: &[&str]| {
        db::seed_user(&config::SeedUser {
            name: name.into(),
            login: name.to_lowercase(),
            password: PASSWORD.into(),
            role,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        })
    };
    db::Memory::with_users([
        seed("Alice", user::Role::Superuser, &[]),
        seed("Bob", user::Role::User, &["ticket.edit"]),
        seed("Charlie", user::Role::User, &[]),
    ])
}

/// Serves the router over `repo` on an ephemeral port and returns its base
/// URL.
pub async fn spawn(repo: Arc<dyn Repository>) -> String {
    let jwt = config::Jwt {
        secret: "test secret".into(),
        expiration_time: Duration::from_secs(60 * 60),
    };
    let app = server::router(Arc::new(AppState::new(repo, &jwt)));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind a listener");
    let addr = listener.local_addr().expect("no local address");
    tokio::spawn(async move { axum::serve(listener, app).await });

    format!("http://{addr}")
}

pub async fn start() -> String {
    spawn(Arc::new(seeded_memory())).await
}

pub struct Client {
    pub inner: reqwest::Client,
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.to_owned(),
            auth_token: None,
        }
    }

    pub async fn try_auth(
        &self,
        login: &str,
        password: &str,
    ) -> Result<String, StatusCode> {
        Ok(self
            .inner
            .post(format!("{}/auth", self.base_url))
            .json(&json!({
                "login": login,
                "password": password,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .text()
            .await
            .expect("failed to get a response"))
    }

    pub async fn auth(mut self, login: &str) -> Self {
        self.auth_token = Some(
            self.try_auth(login, PASSWORD)
                .await
                .expect("wrong status code"),
        );
        self
    }

    pub async fn user(&self) -> Result<api::User, StatusCode> {
        self.send(self.get("/user")).await
    }

    pub async fn get_tickets(
        &self,
        offset: usize,
        limit: usize,
        archived: bool,
    ) -> Result<api::ticket::List, StatusCode> {
        self.send(self.get(&format!(
            "/ticket?offset={offset}&limit={limit}&archived={archived}"
        )))
        .await
    }

    pub async fn add_ticket(
        &self,
        body: Value,
    ) -> Result<api::Ticket, StatusCode> {
        self.send(self.request(reqwest::Method::POST, "/ticket").json(&body))
            .await
    }

    pub async fn get_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<api::Ticket, StatusCode> {
        self.send(self.get(&format!("/ticket/{id}"))).await
    }

    pub async fn change_status(
        &self,
        id: api::ticket::Id,
        status: &str,
        at: &str,
        reason: Option<&str>,
    ) -> Result<api::Ticket, StatusCode> {
        self.edit_ticket(
            id,
            json!({
                "op": "changeStatus",
                "data": {
                    "status": status,
                    "at": at,
                    "reason": reason,
                },
            }),
        )
        .await
    }

    pub async fn archive_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<api::Ticket, StatusCode> {
        self.edit_ticket(id, json!({ "op": "archive" })).await
    }

    pub async fn restore_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<api::Ticket, StatusCode> {
        self.edit_ticket(id, json!({ "op": "restore" })).await
    }

    pub async fn edit_ticket_details(
        &self,
        id: api::ticket::Id,
        details: Value,
    ) -> Result<api::Ticket, StatusCode> {
        self.edit_ticket(id, json!({ "op": "edit", "data": details }))
            .await
    }

    async fn edit_ticket(
        &self,
        id: api::ticket::Id,
        body: Value,
    ) -> Result<api::Ticket, StatusCode> {
        self.send(
            self.request(reqwest::Method::PATCH, &format!("/ticket/{id}"))
                .json(&body),
        )
        .await
    }

    pub async fn get_subtickets(
        &self,
        id: api::ticket::Id,
    ) -> Result<Vec<api::Subticket>, StatusCode> {
        self.send(self.get(&format!("/ticket/{id}/subticket"))).await
    }

    pub async fn add_subticket(
        &self,
        id: api::ticket::Id,
        body: Value,
    ) -> Result<api::Subticket, StatusCode> {
        self.send(
            self.request(
                reqwest::Method::POST,
                &format!("/ticket/{id}/subticket"),
            )
            .json(&body),
        )
        .await
    }

    pub async fn close_subtickets(
        &self,
        id: api::ticket::Id,
        closing: Value,
    ) -> Result<api::subticket::BatchReport, StatusCode> {
        self.send(
            self.request(
                reqwest::Method::PATCH,
                &format!("/ticket/{id}/subticket"),
            )
            .json(&closing),
        )
        .await
    }

    pub async fn close_subticket(
        &self,
        id: api::subticket::Id,
        closing: Value,
    ) -> Result<api::Subticket, StatusCode> {
        self.edit_subticket(id, json!({ "op": "close", "data": closing }))
            .await
    }

    pub async fn reopen_subticket(
        &self,
        id: api::subticket::Id,
    ) -> Result<api::Subticket, StatusCode> {
        self.edit_subticket(id, json!({ "op": "reopen" })).await
    }

    pub async fn edit_subticket_details(
        &self,
        id: api::subticket::Id,
        details: Value,
    ) -> Result<api::Subticket, StatusCode> {
        self.edit_subticket(id, json!({ "op": "edit", "data": details }))
            .await
    }

    async fn edit_subticket(
        &self,
        id: api::subticket::Id,
        body: Value,
    ) -> Result<api::Subticket, StatusCode> {
        self.send(
            self.request(reqwest::Method::PATCH, &format!("/subticket/{id}"))
                .json(&body),
        )
        .await
    }

    pub async fn get_action_logs(
        &self,
        id: api::ticket::Id,
    ) -> Result<Vec<api::ActionLog>, StatusCode> {
        self.send(self.get(&format!("/ticket/{id}/log"))).await
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let mut req = self
            .inner
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, StatusCode> {
        Ok(req
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<T>()
            .await
            .expect("failed to get a response"))
    }
}

pub fn ticket_body(node: &str) -> Value {
    json!({
        "kind": "REACTIVE",
        "reportedBy": "NOC",
        "initialDiagnosis": "fiber cut",
        "node": node,
        "olt": "OLT-7",
        "serviceUnavailable": true,
        "creationDate": "2024-03-01T07:00:00Z",
    })
}

pub fn subticket_body(cto: &str, event_start_date: &str) -> Value {
    json!({
        "cto": cto,
        "card": 1,
        "port": 4,
        "city": "Lima",
        "clientCount": 32,
        "eventStartDate": event_start_date,
        "reportedToPextDate": event_start_date,
    })
}

pub fn closing_body(event_end_date: &str) -> Value {
    json!({
        "eventEndDate": event_end_date,
        "rootCause": "fiber cut",
        "badPraxis": false,
        "solution": "fusion splice",
        "eventResponsible": "contractor",
    })
}

/// Store that fails writes of the listed subtickets and passes everything
/// else through.
pub struct FlakyRepo {
    pub inner: db::Memory,
    pub failing: HashSet<String>,
}

#[async_trait]
impl Repository for FlakyRepo {
    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<db::User>, db::Error> {
        self.inner.get_user_by_login(login).await
    }

    async fn get_user_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<db::User>, db::Error> {
        self.inner.get_user_by_id(id).await
    }

    async fn get_users_by_ids(
        &self,
        ids: &[user::Id],
    ) -> Result<HashMap<user::Id, db::User>, db::Error> {
        self.inner.get_users_by_ids(ids).await
    }

    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<db::Ticket>, db::Error> {
        self.inner.get_ticket_by_id(id).await
    }

    async fn get_tickets_page(
        &self,
        archived: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<db::Ticket>, db::Error> {
        self.inner.get_tickets_page(archived, offset, limit).await
    }

    async fn get_tickets_count(
        &self,
        archived: bool,
    ) -> Result<usize, db::Error> {
        self.inner.get_tickets_count(archived).await
    }

    async fn create_ticket(
        &self,
        new: ticket::New,
    ) -> Result<db::Ticket, db::Error> {
        self.inner.create_ticket(new).await
    }

    async fn write_ticket(&self, ticket: &db::Ticket) -> Result<(), db::Error> {
        self.inner.write_ticket(ticket).await
    }

    async fn get_subticket_by_id(
        &self,
        id: subticket::Id,
    ) -> Result<Option<db::Subticket>, db::Error> {
        self.inner.get_subticket_by_id(id).await
    }

    async fn get_subtickets_by_ticket(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<db::Subticket>, db::Error> {
        self.inner.get_subtickets_by_ticket(ticket_id).await
    }

    async fn create_subticket(
        &self,
        new: subticket::New,
    ) -> Result<db::Subticket, db::Error> {
        self.inner.create_subticket(new).await
    }

    async fn write_subticket(
        &self,
        subticket: &db::Subticket,
    ) -> Result<(), db::Error> {
        if self.failing.contains(&subticket.code) {
            return Err(db::Error::Unavailable(format!(
                "write of {} refused",
                subticket.code
            )));
        }
        self.inner.write_subticket(subticket).await
    }

    async fn append_action_log(
        &self,
        entry: &log::Entry,
    ) -> Result<(), db::Error> {
        self.inner.append_action_log(entry).await
    }

    async fn get_action_logs(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<db::ActionLog>, db::Error> {
        self.inner.get_action_logs(ticket_id).await
    }
}
