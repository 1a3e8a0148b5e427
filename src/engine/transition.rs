use time::OffsetDateTime;

use crate::db::{
    history::{Execution, History, Pause},
    ticket::Status,
    Ticket,
};

use super::{Error, ValidationError};

/// Requested ticket status change.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeStatus {
    pub status: Status,

    /// When the change happened, as entered by the operator.
    pub at: OffsetDateTime,

    /// Required when `status` is [`Status::OnHold`], ignored otherwise.
    pub reason: Option<String>,
}

/// Ticket fields a status change produces, computed over copies.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub status: Status,
    pub closing_date: Option<OffsetDateTime>,
    pub status_changed_at: OffsetDateTime,
    pub pause_history: History<Pause>,
    pub execution_history: History<Execution>,
}

impl Transition {
    pub fn apply(self, ticket: &Ticket) -> Ticket {
        Ticket {
            status: self.status,
            closing_date: self.closing_date,
            status_changed_at: self.status_changed_at,
            pause_history: self.pause_history,
            execution_history: self.execution_history,
            ..ticket.clone()
        }
    }
}

/// Computes the effect of moving `ticket` to `change.status`.
///
/// Leaving [`Status::OnHold`] or [`Status::InProgress`] closes the open
/// segment of that kind at `change.at`; a missing open segment is tolerated.
/// Entering either opens a new one. Solved sets the closing date and any
/// other target clears it.
///
/// Does not consult subtickets: reaching [`Status::Solved`] must go through
/// [`close_ticket`](super::close_ticket).
pub fn compute_transition(
    ticket: &Ticket,
    change: &ChangeStatus,
    now: OffsetDateTime,
) -> Result<Transition, Error> {
    if change.status == ticket.status {
        return Err(Error::NoChange);
    }
    if change.at > now {
        return Err(ValidationError::FutureTimestamp.into());
    }
    if change.at < recorded_until(ticket) {
        return Err(ValidationError::OutOfOrder.into());
    }

    let reason = match change.status {
        Status::OnHold => Some(
            change
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or(Error::MissingReason)?
                .to_owned(),
        ),
        Status::Pending | Status::InProgress | Status::Solved => None,
    };

    let mut pause_history = ticket.pause_history.clone();
    let mut execution_history = ticket.execution_history.clone();

    match ticket.status {
        Status::OnHold => {
            pause_history.close_open(change.at);
        }
        Status::InProgress => {
            execution_history.close_open(change.at);
        }
        Status::Pending | Status::Solved => {}
    }

    let mut closing_date = None;
    match (change.status, reason) {
        (Status::OnHold, Some(reason)) => {
            pause_history.start(Pause::new(change.at, reason))
        }
        (Status::InProgress, _) => {
            execution_history.start(Execution::new(change.at))
        }
        (Status::Solved, _) => closing_date = Some(change.at),
        _ => {}
    }

    Ok(Transition {
        status: change.status,
        closing_date,
        status_changed_at: change.at,
        pause_history,
        execution_history,
    })
}

/// Latest instant already recorded on the ticket.
fn recorded_until(ticket: &Ticket) -> OffsetDateTime {
    [
        Some(ticket.creation_date),
        Some(ticket.status_changed_at),
        ticket.closing_date,
        ticket.pause_history.latest(),
        ticket.execution_history.latest(),
    ]
    .into_iter()
    .flatten()
    .max()
    .unwrap_or(ticket.creation_date)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::db::{
        history::Span as _,
        ticket::{Id, Kind},
        user,
    };

    use super::*;

    const NOW: OffsetDateTime = datetime!(2024-03-01 18:00 UTC);

    fn ticket(status: Status) -> Ticket {
        Ticket {
            id: Id::from(1),
            code: "W_CR_000001_R".into(),
            kind: Kind::Reactive,
            reported_by: "NOC".into(),
            initial_diagnosis: "fiber cut".into(),
            node: "LIM-01".into(),
            olt: "OLT-7".into(),
            service_unavailable: true,
            advisor: user::Id::from(1),
            status,
            creation_date: datetime!(2024-03-01 07:00 UTC),
            closing_date: None,
            status_changed_at: datetime!(2024-03-01 07:00 UTC),
            pause_history: History::default(),
            execution_history: History::default(),
            archived: false,
        }
    }

    fn change(status: Status, at: OffsetDateTime) -> ChangeStatus {
        ChangeStatus {
            status,
            at,
            reason: None,
        }
    }

    fn hold(at: OffsetDateTime, reason: &str) -> ChangeStatus {
        ChangeStatus {
            status: Status::OnHold,
            at,
            reason: Some(reason.into()),
        }
    }

    fn step(ticket: &Ticket, change: ChangeStatus) -> Ticket {
        compute_transition(ticket, &change, NOW).unwrap().apply(ticket)
    }

    #[test]
    fn walks_pending_in_progress_on_hold_solved() {
        let t1 = datetime!(2024-03-01 08:00 UTC);
        let t2 = datetime!(2024-03-01 12:00 UTC);
        let t3 = datetime!(2024-03-01 13:00 UTC);

        let ticket = ticket(Status::Pending);
        let ticket = step(&ticket, change(Status::InProgress, t1));
        assert_eq!(ticket.execution_history.segments(), [Execution::new(t1)]);

        let ticket = step(&ticket, hold(t2, "lunch"));
        assert_eq!(
            ticket.execution_history.segments(),
            [Execution {
                start_time: t1,
                end_time: Some(t2),
            }]
        );
        assert_eq!(
            ticket.pause_history.segments(),
            [Pause::new(t2, "lunch".into())]
        );

        let ticket = step(&ticket, change(Status::Solved, t3));
        assert_eq!(ticket.status, Status::Solved);
        assert_eq!(ticket.closing_date, Some(t3));
        assert_eq!(
            ticket.pause_history.segments(),
            [Pause {
                start_time: t2,
                end_time: Some(t3),
                reason: "lunch".into(),
            }]
        );
    }

    #[test]
    fn same_status_is_no_change() {
        for status in [
            Status::Pending,
            Status::InProgress,
            Status::OnHold,
            Status::Solved,
        ] {
            let ticket = ticket(status);
            let result = compute_transition(
                &ticket,
                &hold(datetime!(2024-03-01 08:00 UTC), "x")
                    .with_status(status),
                NOW,
            );
            assert_eq!(result, Err(Error::NoChange));
        }
    }

    #[test]
    fn on_hold_requires_reason() {
        let ticket = ticket(Status::InProgress);
        let at = datetime!(2024-03-01 08:00 UTC);

        assert_eq!(
            compute_transition(&ticket, &change(Status::OnHold, at), NOW),
            Err(Error::MissingReason)
        );
        assert_eq!(
            compute_transition(&ticket, &hold(at, "   "), NOW),
            Err(Error::MissingReason)
        );
    }

    #[test]
    fn rejects_future_timestamp() {
        let ticket = ticket(Status::Pending);
        let result = compute_transition(
            &ticket,
            &change(Status::InProgress, datetime!(2024-03-01 18:01 UTC)),
            NOW,
        );
        assert_eq!(
            result,
            Err(Error::Validation(ValidationError::FutureTimestamp))
        );
    }

    #[test]
    fn rejects_timestamp_before_recorded_history() {
        let started = step(
            &ticket(Status::Pending),
            change(Status::InProgress, datetime!(2024-03-01 10:00 UTC)),
        );
        let result = compute_transition(
            &started,
            &hold(datetime!(2024-03-01 09:00 UTC), "rain"),
            NOW,
        );
        assert_eq!(result, Err(Error::Validation(ValidationError::OutOfOrder)));

        let result = compute_transition(
            &ticket(Status::Pending),
            &change(Status::InProgress, datetime!(2024-03-01 06:00 UTC)),
            NOW,
        );
        assert_eq!(result, Err(Error::Validation(ValidationError::OutOfOrder)));
    }

    #[test]
    fn leaving_on_hold_closes_trailing_pause() {
        let at = datetime!(2024-03-01 09:00 UTC);
        let paused = step(&ticket(Status::Pending), hold(at, "no access"));

        for target in [Status::Pending, Status::InProgress, Status::Solved] {
            let leave = datetime!(2024-03-01 10:30 UTC);
            let next = step(&paused, change(target, leave));
            assert_eq!(next.pause_history.open_segment(), None);
            assert_eq!(next.pause_history.segments()[0].end_time, Some(leave));
        }
    }

    #[test]
    fn leaving_on_hold_without_open_pause_is_repaired_silently() {
        let mut paused = ticket(Status::OnHold);
        paused.pause_history = History::from(vec![Pause {
            start_time: datetime!(2024-03-01 08:00 UTC),
            end_time: Some(datetime!(2024-03-01 08:30 UTC)),
            reason: "rain".into(),
        }]);

        let next = step(
            &paused,
            change(Status::InProgress, datetime!(2024-03-01 09:00 UTC)),
        );
        assert_eq!(next.pause_history, paused.pause_history);
        assert_eq!(next.execution_history.len(), 1);
    }

    #[test]
    fn never_leaves_two_open_segments_of_a_kind() {
        let mut ticket = ticket(Status::Pending);
        let mut hour = 8;
        for target in [
            Status::InProgress,
            Status::OnHold,
            Status::InProgress,
            Status::Pending,
            Status::InProgress,
            Status::OnHold,
            Status::Pending,
            Status::OnHold,
        ] {
            let at = datetime!(2024-03-01 00:00 UTC)
                + time::Duration::hours(hour);
            hour += 1;
            ticket = step(&ticket, hold(at, "wait").with_status(target));

            let open = |segments: &[Pause]| {
                segments.iter().filter(|s| s.is_open()).count()
            };
            assert!(open(ticket.pause_history.segments()) <= 1);
            assert!(
                ticket
                    .execution_history
                    .segments()
                    .iter()
                    .filter(|s| s.is_open())
                    .count()
                    <= 1
            );
        }
        assert_eq!(ticket.pause_history.len(), 3);
        assert_eq!(ticket.execution_history.len(), 3);
    }

    #[test]
    fn reopen_keeps_solved_period_in_the_past() {
        let solved = step(
            &ticket(Status::Pending),
            change(Status::Solved, datetime!(2024-03-01 10:00 UTC)),
        );
        let reopened = step(
            &solved,
            change(Status::Pending, datetime!(2024-03-01 11:00 UTC)),
        );
        assert_eq!(reopened.closing_date, None);
        assert_eq!(
            reopened.status_changed_at,
            datetime!(2024-03-01 11:00 UTC)
        );

        let result = compute_transition(
            &reopened,
            &change(Status::InProgress, datetime!(2024-03-01 08:00 UTC)),
            NOW,
        );
        assert_eq!(result, Err(Error::Validation(ValidationError::OutOfOrder)));
    }

    #[test]
    fn leaving_solved_clears_closing_date() {
        let solved = step(
            &ticket(Status::Pending),
            change(Status::Solved, datetime!(2024-03-01 09:00 UTC)),
        );
        assert_eq!(solved.closing_date, Some(datetime!(2024-03-01 09:00 UTC)));

        let reopened = step(
            &solved,
            change(Status::Pending, datetime!(2024-03-01 10:00 UTC)),
        );
        assert_eq!(reopened.status, Status::Pending);
        assert_eq!(reopened.closing_date, None);
    }

    #[test]
    fn input_ticket_is_untouched() {
        let ticket = ticket(Status::Pending);
        let before = ticket.clone();
        let _ = compute_transition(
            &ticket,
            &change(Status::InProgress, datetime!(2024-03-01 08:00 UTC)),
            NOW,
        )
        .unwrap();
        assert_eq!(ticket, before);
    }

    impl ChangeStatus {
        fn with_status(self, status: Status) -> Self {
            Self { status, ..self }
        }
    }
}
