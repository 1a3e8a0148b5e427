use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    pub ticket_code: String,
    pub action: String,
    pub user: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<db::ActionLog> for ActionLog {
    fn from(log: db::ActionLog) -> Self {
        Self {
            ticket_code: log.ticket_code,
            action: log.action,
            user: log.user,
            timestamp: log.timestamp,
        }
    }
}
