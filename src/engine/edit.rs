use crate::db::{
    subticket::Subticket,
    ticket::{Kind, Ticket},
};

use super::{subticket::required, Error, ValidationError};

/// Descriptive ticket fields an operator may correct after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct TicketDetails {
    pub kind: Kind,
    pub reported_by: String,
    pub initial_diagnosis: String,
    pub node: String,
    pub olt: String,
    pub service_unavailable: bool,
}

/// Descriptive subticket fields an operator may correct after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct SubticketDetails {
    pub cto: String,
    pub card: i16,
    pub port: i16,
    pub city: String,
    pub client_count: i32,
}

/// Replaces the descriptive fields of `ticket`. Status, dates, histories
/// and the code stay as they are.
pub fn edit_ticket(
    ticket: &Ticket,
    details: &TicketDetails,
) -> Result<Ticket, Error> {
    let edited = Ticket {
        kind: details.kind,
        reported_by: required("reportedBy", &details.reported_by)?,
        initial_diagnosis: details.initial_diagnosis.trim().to_owned(),
        node: required("node", &details.node)?,
        olt: required("olt", &details.olt)?,
        service_unavailable: details.service_unavailable,
        ..ticket.clone()
    };
    if edited == *ticket {
        return Err(Error::NoChange);
    }
    Ok(edited)
}

/// Replaces the descriptive fields of `subticket`, leaving its dates and
/// closure untouched.
pub fn edit_subticket(
    subticket: &Subticket,
    details: &SubticketDetails,
) -> Result<Subticket, Error> {
    for (field, value) in [
        ("card", i32::from(details.card)),
        ("port", i32::from(details.port)),
        ("clientCount", details.client_count),
    ] {
        if value < 0 {
            return Err(ValidationError::Negative(field).into());
        }
    }
    let edited = Subticket {
        cto: required("cto", &details.cto)?,
        card: details.card,
        port: details.port,
        city: details.city.trim().to_owned(),
        client_count: details.client_count,
        ..subticket.clone()
    };
    if edited == *subticket {
        return Err(Error::NoChange);
    }
    Ok(edited)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::db::{history::History, subticket, ticket, user};

    use super::*;

    fn ticket() -> Ticket {
        Ticket {
            id: ticket::Id::from(1),
            code: "W_CR_000001_R".into(),
            kind: Kind::Reactive,
            reported_by: "NOC".into(),
            initial_diagnosis: "fiber cut".into(),
            node: "LIM-01".into(),
            olt: "OLT-7".into(),
            service_unavailable: true,
            advisor: user::Id::from(1),
            status: ticket::Status::InProgress,
            creation_date: datetime!(2024-03-01 07:00 UTC),
            closing_date: None,
            status_changed_at: datetime!(2024-03-01 08:00 UTC),
            pause_history: History::default(),
            execution_history: History::default(),
            archived: false,
        }
    }

    fn details() -> TicketDetails {
        TicketDetails {
            kind: Kind::Reactive,
            reported_by: "NOC".into(),
            initial_diagnosis: "fiber cut".into(),
            node: "LIM-01".into(),
            olt: "OLT-7".into(),
            service_unavailable: true,
        }
    }

    fn subticket() -> Subticket {
        Subticket {
            id: subticket::Id::from(1),
            ticket_id: ticket::Id::from(1),
            code: "ST-1".into(),
            cto: "CTO-12".into(),
            card: 2,
            port: 9,
            city: "Arequipa".into(),
            client_count: 40,
            event_start_date: datetime!(2024-03-01 08:00 UTC),
            reported_to_pext_date: datetime!(2024-03-01 08:20 UTC),
            creator: user::Id::from(1),
            closure: None,
        }
    }

    #[test]
    fn ticket_edit_keeps_lifecycle_fields() {
        let current = ticket();
        let edited = edit_ticket(
            &current,
            &TicketDetails {
                node: " LIM-02 ".into(),
                service_unavailable: false,
                ..details()
            },
        )
        .unwrap();

        assert_eq!(edited.node, "LIM-02");
        assert!(!edited.service_unavailable);
        assert_eq!(edited.status, current.status);
        assert_eq!(edited.code, current.code);
        assert_eq!(edited.status_changed_at, current.status_changed_at);
    }

    #[test]
    fn ticket_edit_rejects_blank_olt() {
        assert_eq!(
            edit_ticket(
                &ticket(),
                &TicketDetails {
                    olt: "".into(),
                    ..details()
                }
            ),
            Err(Error::Validation(ValidationError::MissingField("olt")))
        );
    }

    #[test]
    fn identical_details_are_no_change() {
        assert_eq!(edit_ticket(&ticket(), &details()), Err(Error::NoChange));
        let same = SubticketDetails {
            cto: "CTO-12".into(),
            card: 2,
            port: 9,
            city: "Arequipa".into(),
            client_count: 40,
        };
        assert_eq!(edit_subticket(&subticket(), &same), Err(Error::NoChange));
    }

    #[test]
    fn subticket_edit_rejects_negative_port() {
        let details = SubticketDetails {
            cto: "CTO-12".into(),
            card: 2,
            port: -1,
            city: "Arequipa".into(),
            client_count: 40,
        };
        assert_eq!(
            edit_subticket(&subticket(), &details),
            Err(Error::Validation(ValidationError::Negative("port")))
        );
    }
}
