use time::OffsetDateTime;

use super::{ticket, Client, Error};

/// Audit record of one successful mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionLog {
    pub id: i64,
    pub ticket_id: ticket::Id,
    pub ticket_code: String,
    pub action: String,
    pub user: String,
    pub timestamp: OffsetDateTime,
}

/// Action log contents before the repository assigns an id.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub ticket_id: ticket::Id,
    pub ticket_code: String,
    pub action: String,
    pub user: String,
    pub timestamp: OffsetDateTime,
}

impl Client {
    pub async fn append_action_log(&self, entry: &Entry) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO action_logs (ticket_id, ticket_code, action, \
                                     user_name, timestamp) \
            VALUES ($1, $2, $3, $4, $5)";

        self.0
            .execute(
                SQL,
                &[
                    &entry.ticket_id,
                    &entry.ticket_code,
                    &entry.action,
                    &entry.user,
                    &entry.timestamp,
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get_action_logs(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<ActionLog>, Error> {
        const SQL: &str = "\
            SELECT id, ticket_id, ticket_code, action, user_name, timestamp \
            FROM action_logs \
            WHERE ticket_id = $1 \
            ORDER BY timestamp DESC, id DESC";

        Ok(self
            .0
            .query(SQL, &[&ticket_id])
            .await?
            .into_iter()
            .map(|row| ActionLog {
                id: row.get("id"),
                ticket_id: row.get("ticket_id"),
                ticket_code: row.get("ticket_code"),
                action: row.get("action"),
                user: row.get("user_name"),
                timestamp: row.get("timestamp"),
            })
            .collect())
    }
}
