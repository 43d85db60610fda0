// src/db/contact_actions.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::contact_action::{ContactAction, ContactList, ContactStatut, NewContactAction};
use crate::errors::ServerError;

const COLUMNS: &str = "id, nom_contact, entreprise, telephone, email, responsable, statut,
     commentaire, date_contact, created_at";

fn map_action(row: &Row<'_>) -> rusqlite::Result<ContactAction> {
    let statut: String = row.get(6)?;
    Ok(ContactAction {
        id: row.get(0)?,
        nom_contact: row.get(1)?,
        entreprise: row.get(2)?,
        telephone: row.get(3)?,
        email: row.get(4)?,
        responsable: row.get(5)?,
        statut: ContactStatut::parse(&statut).unwrap_or(ContactStatut::AContacter),
        commentaire: row.get(7)?,
        date_contact: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub fn insert(
    conn: &Connection,
    list: ContactList,
    new: &NewContactAction,
    now: DateTime<Utc>,
) -> Result<String, ServerError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        &format!(
            "insert into {} (id, nom_contact, entreprise, telephone, email, responsable, statut, commentaire, created_at)
             values (?1, ?2, ?3, ?4, ?5, ?6, 'a_contacter', ?7, ?8)",
            list.table()
        ),
        params![
            id,
            new.nom_contact,
            new.entreprise,
            new.telephone,
            new.email,
            new.responsable,
            new.commentaire,
            now,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert contact action failed: {e}")))?;
    Ok(id)
}

pub fn get(
    conn: &Connection,
    list: ContactList,
    id: &str,
) -> Result<Option<ContactAction>, ServerError> {
    conn.query_row(
        &format!("select {COLUMNS} from {} where id = ?1", list.table()),
        params![id],
        map_action,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("load contact action failed: {e}")))
}

/// Both filters are optional; `None` means "all".
pub fn list(
    conn: &Connection,
    list: ContactList,
    responsable: Option<&str>,
    statut: Option<ContactStatut>,
) -> Result<Vec<ContactAction>, ServerError> {
    let mut stmt = conn.prepare(&format!(
        "select {COLUMNS} from {}
         where (?1 is null or responsable = ?1)
           and (?2 is null or statut = ?2)
         order by statut asc, created_at desc",
        list.table()
    ))?;
    let rows = stmt.query_map(
        params![responsable, statut.map(ContactStatut::as_str)],
        map_action,
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn save_status(
    conn: &Connection,
    list: ContactList,
    action: &ContactAction,
) -> Result<(), ServerError> {
    conn.execute(
        &format!(
            "update {} set statut = ?1, date_contact = ?2 where id = ?3",
            list.table()
        ),
        params![action.statut.as_str(), action.date_contact, action.id],
    )
    .map_err(|e| ServerError::DbError(format!("save contact status failed: {e}")))?;
    Ok(())
}
