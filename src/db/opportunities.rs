// src/db/opportunities.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::opportunity::{Opportunite, StatutFinal};
use crate::errors::ServerError;

const OPPORTUNITE_COLUMNS: &str = "id, client_id, titre, description, montant_estime, statut,
     statut_final, date_cloture, saisie_rapide, created_at, updated_at";

fn map_opportunite(row: &Row<'_>) -> rusqlite::Result<Opportunite> {
    let statut_final: Option<String> = row.get(6)?;
    Ok(Opportunite {
        id: row.get(0)?,
        client_id: row.get(1)?,
        titre: row.get(2)?,
        description: row.get(3)?,
        montant_estime: row.get(4)?,
        statut: row.get(5)?,
        statut_final: statut_final.as_deref().and_then(StatutFinal::parse),
        date_cloture: row.get(7)?,
        saisie_rapide: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub struct NewOpportunite<'a> {
    pub client_id: &'a str,
    pub titre: &'a str,
    pub description: Option<&'a str>,
    pub montant_estime: Option<f64>,
    pub saisie_rapide: bool,
}

pub fn insert_opportunite(
    conn: &Connection,
    new: &NewOpportunite<'_>,
    now: DateTime<Utc>,
) -> Result<String, ServerError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "insert into opportunites (id, client_id, titre, description, montant_estime, statut, saisie_rapide, created_at, updated_at)
         values (?1, ?2, ?3, ?4, ?5, 'prospection', ?6, ?7, ?7)",
        params![
            id,
            new.client_id,
            new.titre,
            new.description,
            new.montant_estime,
            new.saisie_rapide,
            now,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert opportunity failed: {e}")))?;
    Ok(id)
}

pub fn get_opportunite(conn: &Connection, id: &str) -> Result<Option<Opportunite>, ServerError> {
    conn.query_row(
        &format!("select {OPPORTUNITE_COLUMNS} from opportunites where id = ?1"),
        params![id],
        map_opportunite,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("load opportunity failed: {e}")))
}

/// Open pipeline: closed records never show up here.
pub fn list_open(conn: &Connection) -> Result<Vec<Opportunite>, ServerError> {
    let mut stmt = conn.prepare(&format!(
        "select {OPPORTUNITE_COLUMNS} from opportunites
         where statut_final is null
         order by updated_at desc"
    ))?;
    let rows = stmt.query_map([], map_opportunite)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn list_for_client(conn: &Connection, client_id: &str) -> Result<Vec<Opportunite>, ServerError> {
    let mut stmt = conn.prepare(&format!(
        "select {OPPORTUNITE_COLUMNS} from opportunites where client_id = ?1 order by created_at desc"
    ))?;
    let rows = stmt.query_map(params![client_id], map_opportunite)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn set_working_status(
    conn: &Connection,
    id: &str,
    statut: &str,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    conn.execute(
        "update opportunites set statut = ?1, updated_at = ?2 where id = ?3 and statut_final is null",
        params![statut, now, id],
    )
    .map_err(|e| ServerError::DbError(format!("update opportunity status failed: {e}")))?;
    Ok(())
}

/// Sets the terminal status once. Returns false if it was already closed.
pub fn close(
    conn: &Connection,
    id: &str,
    statut_final: StatutFinal,
    now: DateTime<Utc>,
) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "update opportunites
             set statut = ?1, statut_final = ?1, date_cloture = ?2, updated_at = ?2
             where id = ?3 and statut_final is null",
            params![statut_final.as_str(), now, id],
        )
        .map_err(|e| ServerError::DbError(format!("close opportunity failed: {e}")))?;
    Ok(n == 1)
}
