// src/db/interactions.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: String,
    pub client_id: String,
    pub opportunite_id: Option<String>,
    pub kind: String,
    pub contenu: String,
    pub date_interaction: DateTime<Utc>,
}

pub const INTERACTION_KINDS: &[(&str, &str)] = &[
    ("appel", "Appel"),
    ("email", "Email"),
    ("rdv", "Rendez-vous"),
    ("note", "Note"),
];

pub fn insert_interaction(
    conn: &Connection,
    client_id: &str,
    opportunite_id: Option<&str>,
    kind: &str,
    contenu: &str,
    now: DateTime<Utc>,
) -> Result<String, ServerError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "insert into interactions (id, client_id, opportunite_id, type, contenu, date_interaction)
         values (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, client_id, opportunite_id, kind, contenu, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert interaction failed: {e}")))?;
    Ok(id)
}

pub fn list_for_client(conn: &Connection, client_id: &str) -> Result<Vec<Interaction>, ServerError> {
    let mut stmt = conn.prepare(
        "select id, client_id, opportunite_id, type, contenu, date_interaction
         from interactions where client_id = ?1
         order by date_interaction desc",
    )?;
    let rows = stmt.query_map(params![client_id], |row| {
        Ok(Interaction {
            id: row.get(0)?,
            client_id: row.get(1)?,
            opportunite_id: row.get(2)?,
            kind: row.get(3)?,
            contenu: row.get(4)?,
            date_interaction: row.get(5)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn last_interaction_at(
    conn: &Connection,
    client_id: &str,
) -> Result<Option<DateTime<Utc>>, ServerError> {
    let last: Option<Option<DateTime<Utc>>> = conn
        .query_row(
            "select max(date_interaction) from interactions where client_id = ?1",
            params![client_id],
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("last interaction lookup failed: {e}")))?;
    Ok(last.flatten())
}
