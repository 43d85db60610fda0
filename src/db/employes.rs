// src/db/employes.rs
use rusqlite::{params, Connection};

use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq)]
pub struct Employe {
    pub id: String,
    pub nom: String,
    pub prenom: Option<String>,
    pub actif: bool,
    /// ERP user id; technicians without one get no remote appointment.
    pub extrabat_id: Option<String>,
}

impl Employe {
    pub fn display_name(&self) -> String {
        match &self.prenom {
            Some(p) => format!("{p} {}", self.nom),
            None => self.nom.clone(),
        }
    }
}

pub fn insert_employe(
    conn: &Connection,
    nom: &str,
    prenom: Option<&str>,
    extrabat_id: Option<&str>,
) -> Result<String, ServerError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "insert into employes (id, nom, prenom, actif, extrabat_id) values (?1, ?2, ?3, 1, ?4)",
        params![id, nom, prenom, extrabat_id],
    )
    .map_err(|e| ServerError::DbError(format!("insert employee failed: {e}")))?;
    Ok(id)
}

/// Inserts or refreshes the employee linked to ERP user `extrabat_id`.
pub fn upsert_from_erp(
    conn: &Connection,
    extrabat_id: &str,
    nom: &str,
    prenom: Option<&str>,
    actif: bool,
) -> Result<(), ServerError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "insert into employes (id, nom, prenom, actif, extrabat_id) values (?1, ?2, ?3, ?4, ?5)
         on conflict(extrabat_id) do update set nom = excluded.nom, prenom = excluded.prenom, actif = excluded.actif",
        params![id, nom, prenom, actif, extrabat_id],
    )
    .map_err(|e| ServerError::DbError(format!("upsert employee {extrabat_id} failed: {e}")))?;
    Ok(())
}

/// Deactivates ERP-linked employees missing from `seen`. Local-only rows are left alone.
pub fn deactivate_missing(conn: &Connection, seen: &[String]) -> Result<usize, ServerError> {
    let mut stmt = conn.prepare("select id, extrabat_id from employes where actif = 1 and extrabat_id is not null")?;
    let linked = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut gone = Vec::new();
    for r in linked {
        let (id, extrabat_id) = r?;
        if !seen.contains(&extrabat_id) {
            gone.push(id);
        }
    }
    for id in &gone {
        conn.execute("update employes set actif = 0 where id = ?1", params![id])?;
    }
    Ok(gone.len())
}

pub fn list_active(conn: &Connection) -> Result<Vec<Employe>, ServerError> {
    let mut stmt = conn.prepare(
        "select id, nom, prenom, actif, extrabat_id from employes where actif = 1 order by nom, prenom",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Employe {
            id: row.get(0)?,
            nom: row.get(1)?,
            prenom: row.get(2)?,
            actif: row.get(3)?,
            extrabat_id: row.get(4)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
