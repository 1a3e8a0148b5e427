use time::OffsetDateTime;

use crate::db::{
    subticket::{self, Subticket},
    ticket::{self, Status},
    Ticket,
};

use super::{compute_transition, ChangeStatus, Error, Transition};

/// Whether `ticket_id` may become solved, i.e. none of its subtickets in
/// `subtickets` is pending. Subtickets of other tickets are ignored.
pub fn can_close<'a>(
    ticket_id: ticket::Id,
    subtickets: impl IntoIterator<Item = &'a Subticket>,
) -> bool {
    pending_count(ticket_id, subtickets) == 0
}

/// Moves `ticket` to [`Status::Solved`] at `at`, refusing while any of its
/// subtickets is pending.
pub fn close_ticket<'a>(
    ticket: &Ticket,
    subtickets: impl IntoIterator<Item = &'a Subticket>,
    at: OffsetDateTime,
    now: OffsetDateTime,
) -> Result<Transition, Error> {
    match pending_count(ticket.id, subtickets) {
        0 => compute_transition(
            ticket,
            &ChangeStatus {
                status: Status::Solved,
                at,
                reason: None,
            },
            now,
        ),
        pending => Err(Error::OpenSubtickets(pending)),
    }
}

fn pending_count<'a>(
    ticket_id: ticket::Id,
    subtickets: impl IntoIterator<Item = &'a Subticket>,
) -> usize {
    subtickets
        .into_iter()
        .filter(|s| s.ticket_id == ticket_id)
        .filter(|s| s.status() == subticket::Status::Pending)
        .count()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::db::{
        history::History,
        subticket::{Closure, Id},
        ticket::Kind,
        user,
    };

    use super::*;

    const NOW: OffsetDateTime = datetime!(2024-03-01 18:00 UTC);

    fn ticket(id: u128) -> Ticket {
        Ticket {
            id: ticket::Id::from(id),
            code: format!("W_CR_{id:06}_R"),
            kind: Kind::Reactive,
            reported_by: "NOC".into(),
            initial_diagnosis: "fiber cut".into(),
            node: "LIM-01".into(),
            olt: "OLT-7".into(),
            service_unavailable: false,
            advisor: user::Id::from(1),
            status: Status::InProgress,
            creation_date: datetime!(2024-03-01 07:00 UTC),
            closing_date: None,
            status_changed_at: datetime!(2024-03-01 07:00 UTC),
            pause_history: History::default(),
            execution_history: History::default(),
            archived: false,
        }
    }

    fn subticket(id: u128, ticket_id: u128, closed: bool) -> Subticket {
        Subticket {
            id: Id::from(id),
            ticket_id: ticket::Id::from(ticket_id),
            code: format!("ST-{id}"),
            cto: "CTO-1".into(),
            card: 1,
            port: 4,
            city: "Lima".into(),
            client_count: 12,
            event_start_date: datetime!(2024-03-01 07:30 UTC),
            reported_to_pext_date: datetime!(2024-03-01 07:45 UTC),
            creator: user::Id::from(1),
            closure: closed.then(|| Closure {
                closing_advisor: user::Id::from(1),
                event_end_date: datetime!(2024-03-01 09:00 UTC),
                root_cause: "fiber cut".into(),
                bad_praxis: None,
                solution: "splice".into(),
                status_post_sla: None,
                comment: None,
                event_responsible: "contractor".into(),
            }),
        }
    }

    #[test]
    fn open_when_no_subtickets() {
        assert!(can_close(ticket::Id::from(1), &Vec::<Subticket>::new()));
    }

    #[test]
    fn ignores_other_tickets_subtickets() {
        let subtickets = [subticket(1, 1, true), subticket(2, 2, false)];
        assert!(can_close(ticket::Id::from(1), &subtickets));
        assert!(!can_close(ticket::Id::from(2), &subtickets));
    }

    #[test]
    fn close_ticket_follows_gate() {
        let ticket = ticket(1);
        let at = datetime!(2024-03-01 10:00 UTC);

        let blocked = [subticket(1, 1, true), subticket(2, 1, false)];
        assert!(!can_close(ticket.id, &blocked));
        assert_eq!(
            close_ticket(&ticket, &blocked, at, NOW),
            Err(Error::OpenSubtickets(1))
        );

        let done = [subticket(1, 1, true), subticket(2, 1, true)];
        assert!(can_close(ticket.id, &done));
        let transition = close_ticket(&ticket, &done, at, NOW).unwrap();
        assert_eq!(transition.status, Status::Solved);
        assert_eq!(transition.closing_date, Some(at));
    }
}
