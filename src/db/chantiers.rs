// src/db/chantiers.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::chantier::{Chantier, ChantierStatut};
use crate::errors::ServerError;

const CHANTIER_COLUMNS: &str = "c.id, c.opportunite_id, c.client_id, c.statut,
     c.commande_passee, c.date_commande_passee, c.commande_recue, c.date_commande_recue,
     c.planifie, c.date_planification, c.termine, c.date_termine,
     c.date_finalisation, c.description_probleme, c.created_at";

fn map_chantier(row: &Row<'_>) -> rusqlite::Result<Chantier> {
    let statut: String = row.get(3)?;
    Ok(Chantier {
        id: row.get(0)?,
        opportunite_id: row.get(1)?,
        client_id: row.get(2)?,
        statut: ChantierStatut::parse(&statut).unwrap_or(ChantierStatut::EnCours),
        commande_passee: row.get(4)?,
        date_commande_passee: row.get(5)?,
        commande_recue: row.get(6)?,
        date_commande_recue: row.get(7)?,
        planifie: row.get(8)?,
        date_planification: row.get(9)?,
        termine: row.get(10)?,
        date_termine: row.get(11)?,
        date_finalisation: row.get(12)?,
        description_probleme: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// Tracker line: the worksite plus what the list needs to label it.
#[derive(Debug, Clone)]
pub struct ChantierListItem {
    pub chantier: Chantier,
    pub client_nom: String,
    pub opportunite_titre: String,
}

/// Exactly one worksite per opportunity; a second call is a no-op.
pub fn upsert_for_opportunity(
    conn: &Connection,
    opportunite_id: &str,
    client_id: &str,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    conn.execute(
        "insert into chantiers (id, opportunite_id, client_id, statut, created_at)
         values (?1, ?2, ?3, 'en_cours', ?4)
         on conflict(opportunite_id) do nothing",
        params![uuid::Uuid::new_v4().to_string(), opportunite_id, client_id, now],
    )
    .map_err(|e| ServerError::DbError(format!("upsert worksite failed: {e}")))?;
    Ok(())
}

pub fn get_chantier(conn: &Connection, id: &str) -> Result<Option<Chantier>, ServerError> {
    conn.query_row(
        &format!("select {CHANTIER_COLUMNS} from chantiers c where c.id = ?1"),
        params![id],
        map_chantier,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("load worksite failed: {e}")))
}

pub fn find_by_opportunity(
    conn: &Connection,
    opportunite_id: &str,
) -> Result<Option<Chantier>, ServerError> {
    conn.query_row(
        &format!("select {CHANTIER_COLUMNS} from chantiers c where c.opportunite_id = ?1"),
        params![opportunite_id],
        map_chantier,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("load worksite failed: {e}")))
}

pub fn list_chantiers(conn: &Connection) -> Result<Vec<ChantierListItem>, ServerError> {
    let mut stmt = conn.prepare(&format!(
        "select {CHANTIER_COLUMNS}, cl.nom, o.titre
         from chantiers c
         join clients cl on cl.id = c.client_id
         join opportunites o on o.id = c.opportunite_id
         order by c.statut asc, c.created_at desc"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(ChantierListItem {
            chantier: map_chantier(row)?,
            client_nom: row.get(15)?,
            opportunite_titre: row.get(16)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn list_for_client(conn: &Connection, client_id: &str) -> Result<Vec<Chantier>, ServerError> {
    let mut stmt = conn.prepare(&format!(
        "select {CHANTIER_COLUMNS} from chantiers c where c.client_id = ?1 order by c.created_at desc"
    ))?;
    let rows = stmt.query_map(params![client_id], map_chantier)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Persists the milestone booleans and dates. The status column is left
/// alone: only `finalize` may change it.
pub fn save_milestones(conn: &Connection, c: &Chantier) -> Result<(), ServerError> {
    conn.execute(
        "update chantiers set
            commande_passee = ?1, date_commande_passee = ?2,
            commande_recue = ?3, date_commande_recue = ?4,
            planifie = ?5, date_planification = ?6,
            termine = ?7, date_termine = ?8
         where id = ?9",
        params![
            c.commande_passee,
            c.date_commande_passee,
            c.commande_recue,
            c.date_commande_recue,
            c.planifie,
            c.date_planification,
            c.termine,
            c.date_termine,
            c.id,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("save milestones failed: {e}")))?;
    Ok(())
}

pub fn set_description(
    conn: &Connection,
    id: &str,
    description: Option<&str>,
) -> Result<(), ServerError> {
    conn.execute(
        "update chantiers set description_probleme = ?1 where id = ?2",
        params![description, id],
    )
    .map_err(|e| ServerError::DbError(format!("save problem description failed: {e}")))?;
    Ok(())
}

/// `en_cours` → `finalise`. Returns false when it was already finalized.
pub fn mark_finalised(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "update chantiers set statut = 'finalise', date_finalisation = ?1
             where id = ?2 and statut = 'en_cours'",
            params![now, id],
        )
        .map_err(|e| ServerError::DbError(format!("finalize worksite failed: {e}")))?;
    Ok(n == 1)
}
