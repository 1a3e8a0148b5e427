use derive_more::Display;

use crate::db::{user, User};

use super::Error;

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Permission {
    #[display("ticket.create")]
    TicketCreate,

    /// Status changes and subticket closure.
    #[display("ticket.edit")]
    TicketEdit,

    /// Archiving.
    #[display("ticket.delete")]
    TicketDelete,

    /// Restoring archived tickets.
    #[display("archived.edit")]
    ArchivedEdit,
}

/// Whoever triggers an operation. The engine only asks whether they hold a
/// capability; it never looks at how capabilities are granted.
pub trait Operator {
    fn id(&self) -> user::Id;

    fn name(&self) -> &str;

    fn can(&self, permission: Permission) -> bool;
}

impl Operator for User {
    fn id(&self) -> user::Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn can(&self, permission: Permission) -> bool {
        self.role == user::Role::Superuser
            || self.permissions.iter().any(|p| *p == permission.to_string())
    }
}

pub fn authorize<O: Operator + ?Sized>(
    operator: &O,
    permission: Permission,
) -> Result<(), Error> {
    if operator.can(permission) {
        Ok(())
    } else {
        Err(Error::Forbidden(permission))
    }
}
