use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{api, db};

pub use crate::db::subticket::{Id, Status};

/// Subticket with its closure fields flattened; they are all `null` while
/// the subticket is pending.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subticket {
    pub id: Id,
    pub ticket_id: api::ticket::Id,
    pub code: String,
    pub cto: String,
    pub card: i16,
    pub port: i16,
    pub city: String,
    pub client_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub event_start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub reported_to_pext_date: OffsetDateTime,
    pub creator: api::user::Id,
    pub status: Status,
    pub closing_advisor: Option<api::user::Id>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub event_end_date: Option<OffsetDateTime>,
    pub root_cause: Option<String>,
    pub bad_praxis: Option<bool>,
    pub solution: Option<String>,
    pub status_post_sla: Option<String>,
    pub comment: Option<String>,
    pub event_responsible: Option<String>,
}

impl From<db::Subticket> for Subticket {
    fn from(subticket: db::Subticket) -> Self {
        let status = subticket.status();
        let closure = subticket.closure;
        Self {
            id: subticket.id,
            ticket_id: subticket.ticket_id,
            code: subticket.code,
            cto: subticket.cto,
            card: subticket.card,
            port: subticket.port,
            city: subticket.city,
            client_count: subticket.client_count,
            event_start_date: subticket.event_start_date,
            reported_to_pext_date: subticket.reported_to_pext_date,
            creator: subticket.creator,
            status,
            closing_advisor: closure.as_ref().map(|c| c.closing_advisor),
            event_end_date: closure.as_ref().map(|c| c.event_end_date),
            root_cause: closure.as_ref().map(|c| c.root_cause.clone()),
            bad_praxis: closure.as_ref().and_then(|c| c.bad_praxis),
            solution: closure.as_ref().map(|c| c.solution.clone()),
            status_post_sla: closure
                .as_ref()
                .and_then(|c| c.status_post_sla.clone()),
            comment: closure.as_ref().and_then(|c| c.comment.clone()),
            event_responsible: closure.map(|c| c.event_responsible),
        }
    }
}

/// Result of closing every pending subticket of a ticket at once.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub closed: Vec<Subticket>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub code: String,
    pub message: String,
}
