// src/db/ltv.rs
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::ltv::{LtvAction, LtvCategorie, LtvStatut};
use crate::errors::ServerError;

const ACTION_COLUMNS: &str = "id, chantier_id, client_id, categorie, nom, ordre, statut,
     date_proposition, date_action, date_echeance, commentaire, nombre_parrainages";

fn map_action(row: &Row<'_>) -> rusqlite::Result<LtvAction> {
    let categorie: String = row.get(3)?;
    let statut: String = row.get(6)?;
    Ok(LtvAction {
        id: row.get(0)?,
        chantier_id: row.get(1)?,
        client_id: row.get(2)?,
        categorie: LtvCategorie::parse(&categorie).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(3, categorie.clone(), rusqlite::types::Type::Text)
        })?,
        nom: row.get(4)?,
        ordre: row.get(5)?,
        statut: LtvStatut::parse(&statut).unwrap_or(LtvStatut::AFaire),
        date_proposition: row.get(7)?,
        date_action: row.get(8)?,
        date_echeance: row.get(9)?,
        commentaire: row.get(10)?,
        nombre_parrainages: row.get(11)?,
    })
}

pub fn get_action(conn: &Connection, id: &str) -> Result<Option<LtvAction>, ServerError> {
    conn.query_row(
        &format!("select {ACTION_COLUMNS} from ltv_actions where id = ?1"),
        params![id],
        map_action,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("load LTV action failed: {e}")))
}

pub fn list_for_client(conn: &Connection, client_id: &str) -> Result<Vec<LtvAction>, ServerError> {
    let mut stmt = conn.prepare(&format!(
        "select {ACTION_COLUMNS} from ltv_actions where client_id = ?1 order by chantier_id, ordre"
    ))?;
    let rows = stmt.query_map(params![client_id], map_action)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn count_for_chantier(conn: &Connection, chantier_id: &str) -> Result<i64, ServerError> {
    conn.query_row(
        "select count(*) from ltv_actions where chantier_id = ?1",
        params![chantier_id],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("count LTV actions failed: {e}")))
}

pub fn insert_action(conn: &Connection, action: &LtvAction) -> Result<(), ServerError> {
    conn.execute(
        "insert into ltv_actions (id, chantier_id, client_id, categorie, nom, ordre, statut,
            date_proposition, date_action, date_echeance, commentaire, nombre_parrainages)
         values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            action.id,
            action.chantier_id,
            action.client_id,
            action.categorie.as_str(),
            action.nom,
            action.ordre,
            action.statut.as_str(),
            action.date_proposition,
            action.date_action,
            action.date_echeance,
            action.commentaire,
            action.nombre_parrainages,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert LTV action failed: {e}")))?;
    Ok(())
}

/// Writes back every user-editable field of an action.
pub fn save_action(conn: &Connection, action: &LtvAction) -> Result<(), ServerError> {
    let n = conn
        .execute(
            "update ltv_actions set statut = ?1, date_proposition = ?2, date_action = ?3,
                date_echeance = ?4, commentaire = ?5, nombre_parrainages = ?6
             where id = ?7",
            params![
                action.statut.as_str(),
                action.date_proposition,
                action.date_action,
                action.date_echeance,
                action.commentaire,
                action.nombre_parrainages,
                action.id,
            ],
        )
        .map_err(|e| ServerError::DbError(format!("save LTV action failed: {e}")))?;
    if n == 0 {
        return Err(ServerError::NotFound);
    }
    Ok(())
}
