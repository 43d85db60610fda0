// src/workflows/contact_actions.rs
use chrono::{DateTime, Utc};

use crate::db::{contact_actions, Database};
use crate::domain::contact_action::{ContactAction, ContactList, ContactStatut, NewContactAction};
use crate::errors::ServerError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFilter {
    pub responsable: Option<String>,
    pub statut: Option<ContactStatut>,
}

pub fn list(
    db: &Database,
    list: ContactList,
    filter: &ContactFilter,
) -> Result<Vec<ContactAction>, ServerError> {
    db.with_conn(|conn| {
        contact_actions::list(conn, list, filter.responsable.as_deref(), filter.statut)
    })
}

pub fn create(
    db: &Database,
    list: ContactList,
    new: NewContactAction,
    now: DateTime<Utc>,
) -> Result<String, ServerError> {
    let new = new.validate()?;
    db.with_conn(|conn| contact_actions::insert(conn, list, &new, now))
}

pub fn toggle(
    db: &Database,
    list: ContactList,
    id: &str,
    now: DateTime<Utc>,
) -> Result<ContactAction, ServerError> {
    db.with_conn(|conn| {
        let mut action = contact_actions::get(conn, list, id)?.ok_or(ServerError::NotFound)?;
        action.toggle(now);
        contact_actions::save_status(conn, list, &action)?;
        Ok(action)
    })
}
