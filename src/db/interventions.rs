// src/db/interventions.rs
use rusqlite::{params, Connection};

use crate::domain::intervention::{Intervention, InterventionTechnicien, PlannedIntervention};
use crate::errors::ServerError;

pub fn list_for_chantier(
    conn: &Connection,
    chantier_id: &str,
) -> Result<Vec<Intervention>, ServerError> {
    let mut stmt = conn.prepare(
        "select id, chantier_id, position, date_debut, date_fin, notes
         from chantier_interventions where chantier_id = ?1 order by position",
    )?;
    let rows = stmt.query_map(params![chantier_id], |row| {
        Ok(Intervention {
            id: row.get(0)?,
            chantier_id: row.get(1)?,
            position: row.get(2)?,
            date_debut: row.get(3)?,
            date_fin: row.get(4)?,
            notes: row.get(5)?,
            techniciens: Vec::new(),
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        let mut intervention = r?;
        intervention.techniciens = list_techniciens(conn, &intervention.id)?;
        out.push(intervention);
    }
    Ok(out)
}

fn list_techniciens(
    conn: &Connection,
    intervention_id: &str,
) -> Result<Vec<InterventionTechnicien>, ServerError> {
    let mut stmt = conn.prepare(
        "select employe_id, extrabat_rdv_id from intervention_techniciens
         where intervention_id = ?1 order by employe_id",
    )?;
    let rows = stmt.query_map(params![intervention_id], |row| {
        Ok(InterventionTechnicien {
            employe_id: row.get(0)?,
            extrabat_rdv_id: row.get(1)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn insert_intervention(
    conn: &Connection,
    chantier_id: &str,
    planned: &PlannedIntervention,
) -> Result<String, ServerError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "insert into chantier_interventions (id, chantier_id, position, date_debut, date_fin, notes)
         values (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            chantier_id,
            planned.position,
            planned.date_debut,
            planned.date_fin,
            planned.notes,
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert intervention failed: {e}")))?;
    Ok(id)
}

pub fn update_intervention(
    conn: &Connection,
    id: &str,
    planned: &PlannedIntervention,
) -> Result<(), ServerError> {
    conn.execute(
        "update chantier_interventions set date_debut = ?1, date_fin = ?2, notes = ?3 where id = ?4",
        params![planned.date_debut, planned.date_fin, planned.notes, id],
    )
    .map_err(|e| ServerError::DbError(format!("update intervention failed: {e}")))?;
    Ok(())
}

pub fn delete_intervention(conn: &Connection, id: &str) -> Result<(), ServerError> {
    conn.execute(
        "delete from chantier_interventions where id = ?1",
        params![id],
    )
    .map_err(|e| ServerError::DbError(format!("delete intervention failed: {e}")))?;
    Ok(())
}

/// Replaces the technician set, keeping stored appointment ids of technicians
/// that stay assigned. Returns the appointment ids of technicians dropped.
pub fn set_techniciens(
    conn: &Connection,
    intervention_id: &str,
    employe_ids: &[String],
) -> Result<Vec<String>, ServerError> {
    let mut dropped = Vec::new();
    for t in list_techniciens(conn, intervention_id)? {
        if !employe_ids.contains(&t.employe_id) {
            conn.execute(
                "delete from intervention_techniciens where intervention_id = ?1 and employe_id = ?2",
                params![intervention_id, t.employe_id],
            )?;
            dropped.extend(t.extrabat_rdv_id);
        }
    }
    for employe_id in employe_ids {
        conn.execute(
            "insert or ignore into intervention_techniciens (intervention_id, employe_id) values (?1, ?2)",
            params![intervention_id, employe_id],
        )?;
    }
    Ok(dropped)
}

pub fn set_rdv_id(
    conn: &Connection,
    intervention_id: &str,
    employe_id: &str,
    extrabat_rdv_id: Option<&str>,
) -> Result<(), ServerError> {
    conn.execute(
        "update intervention_techniciens set extrabat_rdv_id = ?1
         where intervention_id = ?2 and employe_id = ?3",
        params![extrabat_rdv_id, intervention_id, employe_id],
    )
    .map_err(|e| ServerError::DbError(format!("store appointment id failed: {e}")))?;
    Ok(())
}
