// src/db/clients.rs
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::client::{Client, ContactFields};
use crate::errors::ServerError;

const CLIENT_COLUMNS: &str = "id, civilite, nom, prenom, email, telephone, adresse, code_postal, ville,
     extrabat_id, ltv_actif, ltv_date_inscription, ltv_score, created_at";

fn map_client(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        civilite: row.get(1)?,
        nom: row.get(2)?,
        prenom: row.get(3)?,
        email: row.get(4)?,
        telephone: row.get(5)?,
        adresse: row.get(6)?,
        code_postal: row.get(7)?,
        ville: row.get(8)?,
        extrabat_id: row.get(9)?,
        ltv_actif: row.get(10)?,
        ltv_date_inscription: row.get(11)?,
        ltv_score: row.get(12)?,
        created_at: row.get(13)?,
    })
}

pub fn insert_client(
    conn: &Connection,
    fields: &ContactFields,
    extrabat_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, ServerError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "insert into clients (id, civilite, nom, prenom, email, telephone, adresse, code_postal, ville, extrabat_id, created_at)
         values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id,
            fields.civilite,
            fields.nom,
            fields.prenom,
            fields.email,
            fields.telephone,
            fields.adresse,
            fields.code_postal,
            fields.ville,
            extrabat_id,
            now,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert client failed: {e}")))?;
    Ok(id)
}

pub fn get_client(conn: &Connection, id: &str) -> Result<Option<Client>, ServerError> {
    conn.query_row(
        &format!("select {CLIENT_COLUMNS} from clients where id = ?1"),
        params![id],
        map_client,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("load client failed: {e}")))
}

pub fn find_by_extrabat_id(
    conn: &Connection,
    extrabat_id: &str,
) -> Result<Option<Client>, ServerError> {
    conn.query_row(
        &format!("select {CLIENT_COLUMNS} from clients where extrabat_id = ?1"),
        params![extrabat_id],
        map_client,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("load client by ERP id failed: {e}")))
}

/// Overwrites the contact details and links the ERP record.
pub fn complete_client(
    conn: &Connection,
    id: &str,
    fields: &ContactFields,
    extrabat_id: &str,
) -> Result<(), ServerError> {
    let n = conn
        .execute(
            "update clients set civilite = ?1, nom = ?2, prenom = ?3, email = ?4, telephone = ?5,
                adresse = ?6, code_postal = ?7, ville = ?8, extrabat_id = ?9
             where id = ?10",
            params![
                fields.civilite,
                fields.nom,
                fields.prenom,
                fields.email,
                fields.telephone,
                fields.adresse,
                fields.code_postal,
                fields.ville,
                extrabat_id,
                id,
            ],
        )
        .map_err(|e| ServerError::DbError(format!("complete client failed: {e}")))?;
    if n == 0 {
        return Err(ServerError::NotFound);
    }
    Ok(())
}

pub fn list_ltv_clients(conn: &Connection) -> Result<Vec<Client>, ServerError> {
    let mut stmt = conn.prepare(&format!(
        "select {CLIENT_COLUMNS} from clients where ltv_actif = 1 order by ltv_date_inscription desc"
    ))?;
    let rows = stmt.query_map([], map_client)?;

    let mut clients = Vec::new();
    for r in rows {
        clients.push(r?);
    }
    Ok(clients)
}

/// `enroll_client_in_ltv`: the first enrollment date is kept on re-enrollment.
pub fn enroll_client_in_ltv(
    conn: &Connection,
    client_id: &str,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    let n = conn
        .execute(
            "update clients set ltv_actif = 1, ltv_date_inscription = coalesce(ltv_date_inscription, ?1)
             where id = ?2",
            params![now, client_id],
        )
        .map_err(|e| ServerError::DbError(format!("LTV enrollment failed: {e}")))?;
    if n == 0 {
        return Err(ServerError::NotFound);
    }
    Ok(())
}

pub fn set_ltv_score(conn: &Connection, client_id: &str, score: i64) -> Result<(), ServerError> {
    conn.execute(
        "update clients set ltv_score = ?1 where id = ?2",
        params![score, client_id],
    )
    .map_err(|e| ServerError::DbError(format!("store LTV score failed: {e}")))?;
    Ok(())
}
