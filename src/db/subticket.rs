use std::error::Error as StdError;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Row,
};
use uuid::Uuid;

use super::{ticket, user, Client, Error};

/// Outage scoped to one affected element (CTO, card and port).
#[derive(Clone, Debug, PartialEq)]
pub struct Subticket {
    pub id: Id,
    pub ticket_id: ticket::Id,
    pub code: String,
    pub cto: String,
    pub card: i16,
    pub port: i16,
    pub city: String,
    pub client_count: i32,
    pub event_start_date: OffsetDateTime,
    pub reported_to_pext_date: OffsetDateTime,
    pub creator: user::Id,

    /// Present exactly while the subticket is closed.
    pub closure: Option<Closure>,
}

impl Subticket {
    pub fn open(id: Id, code: String, new: New) -> Self {
        Self {
            id,
            ticket_id: new.ticket_id,
            code,
            cto: new.cto,
            card: new.card,
            port: new.port,
            city: new.city,
            client_count: new.client_count,
            event_start_date: new.event_start_date,
            reported_to_pext_date: new.reported_to_pext_date,
            creator: new.creator,
            closure: None,
        }
    }

    pub fn status(&self) -> Status {
        match self.closure {
            Some(_) => Status::Closed,
            None => Status::Pending,
        }
    }
}

/// Fields recorded together when a subticket is closed.
#[derive(Clone, Debug, PartialEq)]
pub struct Closure {
    pub closing_advisor: user::Id,
    pub event_end_date: OffsetDateTime,
    pub root_cause: String,
    pub bad_praxis: Option<bool>,
    pub solution: String,
    pub status_post_sla: Option<String>,
    pub comment: Option<String>,
    pub event_responsible: String,
}

#[derive(Clone, Debug)]
pub struct New {
    pub ticket_id: ticket::Id,
    pub cto: String,
    pub card: i16,
    pub port: i16,
    pub city: String,
    pub client_count: i32,
    pub event_start_date: OffsetDateTime,
    pub reported_to_pext_date: OffsetDateTime,
    pub creator: user::Id,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl FromSql<'_> for Id {
    accepts!(UUID);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Uuid::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for Id {
    accepts!(UUID);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Closed,
}

/// Human-readable subticket code, e.g. `ST-17`.
pub fn code(seq: u64) -> String {
    format!("ST-{seq}")
}

fn from_row(row: &Row) -> Subticket {
    let closure = match (
        row.get::<_, Option<user::Id>>("closing_advisor_id"),
        row.get::<_, Option<OffsetDateTime>>("event_end_date"),
        row.get::<_, Option<String>>("root_cause"),
        row.get::<_, Option<String>>("solution"),
        row.get::<_, Option<String>>("event_responsible"),
    ) {
        (
            Some(closing_advisor),
            Some(event_end_date),
            Some(root_cause),
            Some(solution),
            Some(event_responsible),
        ) => Some(Closure {
            closing_advisor,
            event_end_date,
            root_cause,
            bad_praxis: row.get("bad_praxis"),
            solution,
            status_post_sla: row.get("status_post_sla"),
            comment: row.get("comment"),
            event_responsible,
        }),
        _ => None,
    };

    Subticket {
        id: row.get("id"),
        ticket_id: row.get("ticket_id"),
        code: row.get("code"),
        cto: row.get("cto"),
        card: row.get("card"),
        port: row.get("port"),
        city: row.get("city"),
        client_count: row.get("client_count"),
        event_start_date: row.get("event_start_date"),
        reported_to_pext_date: row.get("reported_to_pext_date"),
        creator: row.get("creator_id"),
        closure,
    }
}

const COLUMNS: &str = "\
    id, ticket_id, code, cto, card, port, city, client_count, \
    event_start_date, reported_to_pext_date, creator_id, \
    closing_advisor_id, event_end_date, root_cause, bad_praxis, solution, \
    status_post_sla, comment, event_responsible";

impl Client {
    pub async fn get_subticket_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Subticket>, Error> {
        let sql = format!("SELECT {COLUMNS} FROM subtickets WHERE id = $1");
        Ok(self.0.query_opt(&sql, &[&id]).await?.as_ref().map(from_row))
    }

    pub async fn get_subtickets_by_ticket(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<Subticket>, Error> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM subtickets \
             WHERE ticket_id = $1 \
             ORDER BY event_start_date, length(code), code"
        );
        Ok(self
            .0
            .query(&sql, &[&ticket_id])
            .await?
            .iter()
            .map(from_row)
            .collect())
    }

    pub async fn create_subticket(&self, new: New) -> Result<Subticket, Error> {
        const SQL: &str = "SELECT nextval('subticket_code_seq')";
        let seq = self.0.query_one(SQL, &[]).await?.get::<_, i64>(0);
        let seq = u64::try_from(seq).map_err(|_| Error::Sequence(seq))?;

        let subticket = Subticket::open(Id::new(), code(seq), new);
        self.write_subticket(&subticket).await?;
        Ok(subticket)
    }

    pub async fn write_subticket(
        &self,
        subticket: &Subticket,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO subtickets (id, ticket_id, code, cto, card, port, \
                                    city, client_count, event_start_date, \
                                    reported_to_pext_date, creator_id, \
                                    closing_advisor_id, event_end_date, \
                                    root_cause, bad_praxis, solution, \
                                    status_post_sla, comment, \
                                    event_responsible) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
                    $11, $12, $13, $14, $15, $16, $17, $18, $19) \
            ON CONFLICT (id) DO UPDATE \
            SET cto = EXCLUDED.cto, \
                card = EXCLUDED.card, \
                port = EXCLUDED.port, \
                city = EXCLUDED.city, \
                client_count = EXCLUDED.client_count, \
                reported_to_pext_date = EXCLUDED.reported_to_pext_date, \
                closing_advisor_id = EXCLUDED.closing_advisor_id, \
                event_end_date = EXCLUDED.event_end_date, \
                root_cause = EXCLUDED.root_cause, \
                bad_praxis = EXCLUDED.bad_praxis, \
                solution = EXCLUDED.solution, \
                status_post_sla = EXCLUDED.status_post_sla, \
                comment = EXCLUDED.comment, \
                event_responsible = EXCLUDED.event_responsible";

        let closure = subticket.closure.as_ref();
        self.0
            .execute(
                SQL,
                &[
                    &subticket.id,
                    &subticket.ticket_id,
                    &subticket.code,
                    &subticket.cto,
                    &subticket.card,
                    &subticket.port,
                    &subticket.city,
                    &subticket.client_count,
                    &subticket.event_start_date,
                    &subticket.reported_to_pext_date,
                    &subticket.creator,
                    &closure.map(|c| c.closing_advisor),
                    &closure.map(|c| c.event_end_date),
                    &closure.map(|c| c.root_cause.as_str()),
                    &closure.and_then(|c| c.bad_praxis),
                    &closure.map(|c| c.solution.as_str()),
                    &closure.and_then(|c| c.status_post_sla.as_deref()),
                    &closure.and_then(|c| c.comment.as_deref()),
                    &closure.map(|c| c.event_responsible.as_str()),
                ],
            )
            .await?;
        Ok(())
    }
}
