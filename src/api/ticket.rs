use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    api,
    db::{
        self,
        history::{Execution, History, Pause},
    },
};

pub use crate::db::ticket::{Id, Kind, Status};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Id,
    pub code: String,
    pub kind: Kind,
    pub reported_by: String,
    pub initial_diagnosis: String,
    pub node: String,
    pub olt: String,
    pub service_unavailable: bool,
    pub advisor: api::User,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub closing_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub status_changed_at: OffsetDateTime,
    pub pause_history: History<Pause>,
    pub execution_history: History<Execution>,
    pub archived: bool,

    /// Sum of the closed pauses.
    pub paused_seconds: i64,

    /// Sum of the closed execution segments.
    pub execution_seconds: i64,
}

impl Ticket {
    pub fn new(ticket: db::Ticket, advisor: api::User) -> Self {
        Self {
            paused_seconds: ticket.pause_history.total_closed().whole_seconds(),
            execution_seconds: ticket
                .execution_history
                .total_closed()
                .whole_seconds(),
            id: ticket.id,
            code: ticket.code,
            kind: ticket.kind,
            reported_by: ticket.reported_by,
            initial_diagnosis: ticket.initial_diagnosis,
            node: ticket.node,
            olt: ticket.olt,
            service_unavailable: ticket.service_unavailable,
            advisor,
            status: ticket.status,
            creation_date: ticket.creation_date,
            closing_date: ticket.closing_date,
            status_changed_at: ticket.status_changed_at,
            pause_history: ticket.pause_history,
            execution_history: ticket.execution_history,
            archived: ticket.archived,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub tickets: Vec<Ticket>,
    pub total_count: usize,
}
