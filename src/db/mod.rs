//! Persistence collaborator: issues identifiers and codes, stores records.

pub mod history;
pub mod log;
pub mod memory;
pub mod subticket;
pub mod ticket;
pub mod user;

use std::collections::HashMap;

use async_trait::async_trait;
use derive_more::{Display, From};
use tokio_postgres::{tls::NoTlsStream, NoTls, Socket};

use crate::config;

pub use self::{
    log::ActionLog, memory::Memory, subticket::Subticket, ticket::Ticket,
    user::User,
};

pub type Connection = tokio_postgres::Connection<Socket, NoTlsStream>;

const SCHEMA: &str = include_str!("schema.sql");

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("postgres: {_0}")]
    #[from]
    Postgres(tokio_postgres::Error),

    #[display("code sequence returned {_0}")]
    Sequence(i64),

    #[display("ticket {_0} does not exist")]
    UnknownTicket(ticket::Id),

    #[display("store unavailable: {_0}")]
    Unavailable(String),
}

impl std::error::Error for Error {}

/// Storage operations the service needs. Every mutation writes a full
/// replacement record.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error>;

    async fn get_user_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<User>, Error>;

    async fn get_users_by_ids(
        &self,
        ids: &[user::Id],
    ) -> Result<HashMap<user::Id, User>, Error>;

    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error>;

    /// Newest first.
    async fn get_tickets_page(
        &self,
        archived: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Ticket>, Error>;

    async fn get_tickets_count(&self, archived: bool) -> Result<usize, Error>;

    /// Issues an id and a code, then stores the ticket.
    async fn create_ticket(&self, new: ticket::New) -> Result<Ticket, Error>;

    async fn write_ticket(&self, ticket: &Ticket) -> Result<(), Error>;

    async fn get_subticket_by_id(
        &self,
        id: subticket::Id,
    ) -> Result<Option<Subticket>, Error>;

    async fn get_subtickets_by_ticket(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<Subticket>, Error>;

    /// Issues an id and a code, then stores the subticket.
    async fn create_subticket(
        &self,
        new: subticket::New,
    ) -> Result<Subticket, Error>;

    async fn write_subticket(&self, subticket: &Subticket) -> Result<(), Error>;

    async fn append_action_log(&self, entry: &log::Entry) -> Result<(), Error>;

    /// Newest first.
    async fn get_action_logs(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<ActionLog>, Error>;
}

pub async fn connect(url: &str) -> Result<(Client, Connection), Error> {
    let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
    Ok((Client(client), connection))
}

pub struct Client(tokio_postgres::Client);

impl Client {
    /// Creates missing tables, sequences and indexes.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.0.batch_execute(SCHEMA).await?;
        Ok(())
    }

    pub async fn write_user(&self, user: &User) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO users (id, name, login, password_hash, role, \
                               permissions) \
            VALUES ($1, $2, $3, $4, $5, $6) \
            ON CONFLICT (login) DO NOTHING";

        self.0
            .execute(
                SQL,
                &[
                    &user.id,
                    &user.name,
                    &user.login,
                    &user.password_hash,
                    &user.role,
                    &user.permissions,
                ],
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for Client {
    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error> {
        Client::get_user_by_login(self, login).await
    }

    async fn get_user_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<User>, Error> {
        Client::get_user_by_id(self, id).await
    }

    async fn get_users_by_ids(
        &self,
        ids: &[user::Id],
    ) -> Result<HashMap<user::Id, User>, Error> {
        Client::get_users_by_ids(self, ids).await
    }

    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error> {
        Client::get_ticket_by_id(self, id).await
    }

    async fn get_tickets_page(
        &self,
        archived: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Ticket>, Error> {
        Client::get_tickets_page(self, archived, offset, limit).await
    }

    async fn get_tickets_count(&self, archived: bool) -> Result<usize, Error> {
        Client::get_tickets_count(self, archived).await
    }

    async fn create_ticket(&self, new: ticket::New) -> Result<Ticket, Error> {
        Client::create_ticket(self, new).await
    }

    async fn write_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        Client::write_ticket(self, ticket).await
    }

    async fn get_subticket_by_id(
        &self,
        id: subticket::Id,
    ) -> Result<Option<Subticket>, Error> {
        Client::get_subticket_by_id(self, id).await
    }

    async fn get_subtickets_by_ticket(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<Subticket>, Error> {
        Client::get_subtickets_by_ticket(self, ticket_id).await
    }

    async fn create_subticket(
        &self,
        new: subticket::New,
    ) -> Result<Subticket, Error> {
        Client::create_subticket(self, new).await
    }

    async fn write_subticket(&self, subticket: &Subticket) -> Result<(), Error> {
        Client::write_subticket(self, subticket).await
    }

    async fn append_action_log(&self, entry: &log::Entry) -> Result<(), Error> {
        Client::append_action_log(self, entry).await
    }

    async fn get_action_logs(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<ActionLog>, Error> {
        Client::get_action_logs(self, ticket_id).await
    }
}

/// Builds the user record a seed entry from the config describes.
pub fn seed_user(seed: &config::SeedUser) -> User {
    User {
        id: user::Id::new(),
        name: seed.name.clone(),
        role: seed.role,
        login: seed.login.clone(),
        password_hash: user::PasswordHash::new(&seed.password),
        permissions: seed.permissions.clone(),
    }
}
