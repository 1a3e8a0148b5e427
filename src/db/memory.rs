//! In-process repository. Used for local runs and the HTTP test-suite.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    log, subticket, ticket, user, ActionLog, Error, Repository, Subticket,
    Ticket, User,
};

#[derive(Default)]
pub struct Memory {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<user::Id, User>,
    tickets: HashMap<ticket::Id, Ticket>,
    subtickets: HashMap<subticket::Id, Subticket>,
    action_logs: Vec<ActionLog>,
    ticket_seq: u64,
    subticket_seq: u64,
}

impl Memory {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                users: users.into_iter().map(|u| (u.id, u)).collect(),
                ..Inner::default()
            }),
        }
    }
}

#[async_trait]
impl Repository for Memory {
    async fn get_user_by_login(
        &self,
        login: &str,
    ) -> Result<Option<User>, Error> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.login == login).cloned())
    }

    async fn get_user_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<User>, Error> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_users_by_ids(
        &self,
        ids: &[user::Id],
    ) -> Result<HashMap<user::Id, User>, Error> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id))
            .map(|u| (u.id, u.clone()))
            .collect())
    }

    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error> {
        Ok(self.inner.read().await.tickets.get(&id).cloned())
    }

    async fn get_tickets_page(
        &self,
        archived: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Ticket>, Error> {
        let inner = self.inner.read().await;
        let mut tickets = inner
            .tickets
            .values()
            .filter(|t| t.archived == archived)
            .collect::<Vec<_>>();
        tickets.sort_by(|a, b| {
            (b.creation_date, &b.code).cmp(&(a.creation_date, &a.code))
        });
        Ok(tickets.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn get_tickets_count(&self, archived: bool) -> Result<usize, Error> {
        let inner = self.inner.read().await;
        Ok(inner.tickets.values().filter(|t| t.archived == archived).count())
    }

    async fn create_ticket(&self, new: ticket::New) -> Result<Ticket, Error> {
        let mut inner = self.inner.write().await;
        inner.ticket_seq += 1;
        let code = ticket::code(inner.ticket_seq, new.kind);
        let ticket = Ticket::open(ticket::Id::new(), code, new);
        inner.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn write_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        inner.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn get_subticket_by_id(
        &self,
        id: subticket::Id,
    ) -> Result<Option<Subticket>, Error> {
        Ok(self.inner.read().await.subtickets.get(&id).cloned())
    }

    async fn get_subtickets_by_ticket(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<Subticket>, Error> {
        let inner = self.inner.read().await;
        let mut subtickets = inner
            .subtickets
            .values()
            .filter(|s| s.ticket_id == ticket_id)
            .cloned()
            .collect::<Vec<_>>();
        subtickets.sort_by(|a, b| {
            (a.event_start_date, a.code.len(), &a.code).cmp(&(
                b.event_start_date,
                b.code.len(),
                &b.code,
            ))
        });
        Ok(subtickets)
    }

    async fn create_subticket(
        &self,
        new: subticket::New,
    ) -> Result<Subticket, Error> {
        let mut inner = self.inner.write().await;
        if !inner.tickets.contains_key(&new.ticket_id) {
            return Err(Error::UnknownTicket(new.ticket_id));
        }
        inner.subticket_seq += 1;
        let code = subticket::code(inner.subticket_seq);
        let subticket = Subticket::open(subticket::Id::new(), code, new);
        inner.subtickets.insert(subticket.id, subticket.clone());
        Ok(subticket)
    }

    async fn write_subticket(&self, subticket: &Subticket) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        if !inner.tickets.contains_key(&subticket.ticket_id) {
            return Err(Error::UnknownTicket(subticket.ticket_id));
        }
        inner.subtickets.insert(subticket.id, subticket.clone());
        Ok(())
    }

    async fn append_action_log(&self, entry: &log::Entry) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        let id = i64::try_from(inner.action_logs.len()).unwrap_or(i64::MAX) + 1;
        inner.action_logs.push(ActionLog {
            id,
            ticket_id: entry.ticket_id,
            ticket_code: entry.ticket_code.clone(),
            action: entry.action.clone(),
            user: entry.user.clone(),
            timestamp: entry.timestamp,
        });
        Ok(())
    }

    async fn get_action_logs(
        &self,
        ticket_id: ticket::Id,
    ) -> Result<Vec<ActionLog>, Error> {
        let inner = self.inner.read().await;
        let mut logs = inner
            .action_logs
            .iter()
            .filter(|l| l.ticket_id == ticket_id)
            .cloned()
            .collect::<Vec<_>>();
        logs.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        Ok(logs)
    }
}
