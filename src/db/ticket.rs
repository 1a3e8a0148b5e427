use std::error::Error as StdError;

use derive_more::Display;
use enum_utils::TryFromRepr;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, Json,
        ToSql, Type,
    },
    Row,
};
use uuid::Uuid;

use super::{
    history::{Execution, History, Pause},
    user, Client, Error,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Ticket {
    pub id: Id,
    pub code: String,
    pub kind: Kind,
    pub reported_by: String,
    pub initial_diagnosis: String,
    pub node: String,
    pub olt: String,
    pub service_unavailable: bool,
    pub advisor: user::Id,
    pub status: Status,
    pub creation_date: OffsetDateTime,
    pub closing_date: Option<OffsetDateTime>,

    /// Instant of the latest status change, the creation date until then.
    pub status_changed_at: OffsetDateTime,
    pub pause_history: History<Pause>,
    pub execution_history: History<Execution>,
    pub archived: bool,
}

impl Ticket {
    /// Builds a freshly opened ticket from the repository-issued identity.
    pub fn open(id: Id, code: String, new: New) -> Self {
        Self {
            id,
            code,
            kind: new.kind,
            reported_by: new.reported_by,
            initial_diagnosis: new.initial_diagnosis,
            node: new.node,
            olt: new.olt,
            service_unavailable: new.service_unavailable,
            advisor: new.advisor,
            status: Status::Pending,
            creation_date: new.creation_date,
            closing_date: None,
            status_changed_at: new.creation_date,
            pause_history: History::default(),
            execution_history: History::default(),
            archived: false,
        }
    }
}

/// Ticket data supplied by the operator, before an id and code are issued.
#[derive(Clone, Debug)]
pub struct New {
    pub kind: Kind,
    pub reported_by: String,
    pub initial_diagnosis: String,
    pub node: String,
    pub olt: String,
    pub service_unavailable: bool,
    pub advisor: user::Id,
    pub creation_date: OffsetDateTime,
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

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    TryFromRepr,
    PartialEq,
    Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Status {
    /// Reported, nobody is working on it yet.
    #[display("PENDING")]
    Pending = 1,

    /// Field work is underway.
    #[display("IN_PROGRESS")]
    InProgress = 2,

    /// Work is paused, always with a recorded reason.
    #[display("ON_HOLD")]
    OnHold = 3,

    /// Outage resolved. Only reachable once every subticket is closed.
    #[display("SOLVED")]
    Solved = 4,
}

impl FromSql<'_> for Status {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let status = Self::try_from(repr).map_err(|_| "invalid status")?;
        Ok(status)
    }
}

impl ToSql for Status {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from((*self) as u8);
        repr.to_sql(ty, out)
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, TryFromRepr, PartialEq, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Kind {
    /// Raised in response to a customer-facing outage.
    Reactive = 1,

    /// Planned maintenance window.
    Maintenance = 2,

    /// Raised from monitoring before customers notice.
    Proactive = 3,
}

impl Kind {
    pub fn suffix(self) -> char {
        match self {
            Self::Reactive => 'R',
            Self::Maintenance => 'M',
            Self::Proactive => 'P',
        }
    }
}

impl FromSql<'_> for Kind {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let kind = Self::try_from(repr).map_err(|_| "invalid kind")?;
        Ok(kind)
    }
}

impl ToSql for Kind {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from((*self) as u8);
        repr.to_sql(ty, out)
    }
}

/// Human-readable ticket code, e.g. `W_CR_000042_R`.
pub fn code(seq: u64, kind: Kind) -> String {
    format!("W_CR_{seq:06}_{}", kind.suffix())
}

fn from_row(row: &Row) -> Ticket {
    Ticket {
        id: row.get("id"),
        code: row.get("code"),
        kind: row.get("kind"),
        reported_by: row.get("reported_by"),
        initial_diagnosis: row.get("initial_diagnosis"),
        node: row.get("node"),
        olt: row.get("olt"),
        service_unavailable: row.get("service_unavailable"),
        advisor: row.get("advisor_id"),
        status: row.get("status"),
        creation_date: row.get("creation_date"),
        closing_date: row.get("closing_date"),
        status_changed_at: row.get("status_changed_at"),
        pause_history: row.get::<_, Json<_>>("pause_history").0,
        execution_history: row.get::<_, Json<_>>("execution_history").0,
        archived: row.get("archived"),
    }
}

const COLUMNS: &str = "\
    id, code, kind, reported_by, initial_diagnosis, node, olt, \
    service_unavailable, advisor_id, status, creation_date, closing_date, \
    status_changed_at, pause_history, execution_history, archived";

impl Client {
    pub async fn get_ticket_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Ticket>, Error> {
        let sql = format!("SELECT {COLUMNS} FROM tickets WHERE id = $1");
        Ok(self.0.query_opt(&sql, &[&id]).await?.as_ref().map(from_row))
    }

    pub async fn create_ticket(&self, new: New) -> Result<Ticket, Error> {
        const SQL: &str = "SELECT nextval('ticket_code_seq')";
        let seq = self.0.query_one(SQL, &[]).await?.get::<_, i64>(0);
        let seq = u64::try_from(seq).map_err(|_| Error::Sequence(seq))?;

        let ticket = Ticket::open(Id::new(), code(seq, new.kind), new);
        self.write_ticket(&ticket).await?;
        Ok(ticket)
    }

    pub async fn write_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO tickets (id, code, kind, reported_by, \
                                 initial_diagnosis, node, olt, \
                                 service_unavailable, advisor_id, status, \
                                 creation_date, closing_date, \
                                 status_changed_at, pause_history, \
                                 execution_history, archived) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
                    $11, $12, $13, $14, $15, $16) \
            ON CONFLICT (id) DO UPDATE \
            SET reported_by = EXCLUDED.reported_by, \
                initial_diagnosis = EXCLUDED.initial_diagnosis, \
                node = EXCLUDED.node, \
                olt = EXCLUDED.olt, \
                service_unavailable = EXCLUDED.service_unavailable, \
                status = EXCLUDED.status, \
                closing_date = EXCLUDED.closing_date, \
                status_changed_at = EXCLUDED.status_changed_at, \
                pause_history = EXCLUDED.pause_history, \
                execution_history = EXCLUDED.execution_history, \
                archived = EXCLUDED.archived";

        self.0
            .execute(
                SQL,
                &[
                    &ticket.id,
                    &ticket.code,
                    &ticket.kind,
                    &ticket.reported_by,
                    &ticket.initial_diagnosis,
                    &ticket.node,
                    &ticket.olt,
                    &ticket.service_unavailable,
                    &ticket.advisor,
                    &ticket.status,
                    &ticket.creation_date,
                    &ticket.closing_date,
                    &ticket.status_changed_at,
                    &Json(&ticket.pause_history),
                    &Json(&ticket.execution_history),
                    &ticket.archived,
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get_tickets_page(
        &self,
        archived: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Ticket>, Error> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM tickets \
             WHERE archived = $1 \
             ORDER BY creation_date DESC, \
                      code DESC \
             OFFSET $2 LIMIT $3"
        );
        Ok(self
            .0
            .query(&sql, &[&archived, &offset, &limit])
            .await?
            .iter()
            .map(from_row)
            .collect())
    }

    pub async fn get_tickets_count(&self, archived: bool) -> Result<usize, Error> {
        const SQL: &str = "SELECT COUNT(*) FROM tickets WHERE archived = $1";
        let count = self.0.query_one(SQL, &[&archived]).await?.get::<_, i64>(0);
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
