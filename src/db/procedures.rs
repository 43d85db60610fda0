// src/db/procedures.rs
//
// Store-side procedures: multi-table operations that run as one unit.
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{chantiers, clients, ltv, opportunities};
use crate::domain::chantier::Chantier;
use crate::domain::ltv::{compute_score, LtvAction, LtvStatut, CATALOG};
use crate::domain::opportunity::{Opportunite, StatutFinal};
use crate::errors::ServerError;

/// Generates the catalog checklist for a worksite. Does nothing if the
/// worksite already has actions. Returns how many were created.
pub fn generate_ltv_checklist(
    conn: &Connection,
    client_id: &str,
    chantier_id: &str,
) -> Result<usize, ServerError> {
    if ltv::count_for_chantier(conn, chantier_id)? > 0 {
        return Ok(0);
    }

    for (ordre, entry) in CATALOG.iter().enumerate() {
        let action = LtvAction {
            id: uuid::Uuid::new_v4().to_string(),
            chantier_id: Some(chantier_id.to_string()),
            client_id: client_id.to_string(),
            categorie: entry.categorie,
            nom: entry.nom.to_string(),
            ordre: ordre as i64,
            statut: LtvStatut::AFaire,
            date_proposition: None,
            date_action: None,
            date_echeance: None,
            commentaire: None,
            nombre_parrainages: 0,
        };
        ltv::insert_action(conn, &action)?;
    }
    Ok(CATALOG.len())
}

/// Recomputes the client's 0–10 score from its actions and stores it.
pub fn calculate_ltv_score(conn: &Connection, client_id: &str) -> Result<i64, ServerError> {
    let actions = ltv::list_for_client(conn, client_id)?;
    let score = compute_score(&actions);
    clients::set_ltv_score(conn, client_id, score)?;
    Ok(score)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalization {
    /// False when the worksite was already finalized before this call.
    pub newly_finalised: bool,
    pub actions_created: usize,
    pub score: i64,
}

fn finalize_steps(
    conn: &Connection,
    chantier_id: &str,
    now: DateTime<Utc>,
) -> Result<Finalization, ServerError> {
    let chantier = chantiers::get_chantier(conn, chantier_id)?.ok_or(ServerError::NotFound)?;
    let newly_finalised = chantiers::mark_finalised(conn, chantier_id, now)?;
    clients::enroll_client_in_ltv(conn, &chantier.client_id, now)?;
    let actions_created = generate_ltv_checklist(conn, &chantier.client_id, chantier_id)?;
    let score = calculate_ltv_score(conn, &chantier.client_id)?;

    Ok(Finalization {
        newly_finalised,
        actions_created,
        score,
    })
}

/// Saves the `termine` stamp, finalizes the worksite, enrolls its client in
/// the LTV programme and generates the checklist. All effects commit together
/// or not at all.
pub fn finalize_chantier(
    conn: &mut Connection,
    chantier: &Chantier,
    now: DateTime<Utc>,
) -> Result<Finalization, ServerError> {
    let tx = conn.transaction()?;
    chantiers::save_milestones(&tx, chantier)?;
    let done = finalize_steps(&tx, &chantier.id, now)?;
    tx.commit()?;
    Ok(done)
}

/// Closes the opportunity as won and opens its worksite. Returns false when
/// the opportunity was already closed.
pub fn win_opportunity(
    conn: &mut Connection,
    opp: &Opportunite,
    now: DateTime<Utc>,
) -> Result<bool, ServerError> {
    let tx = conn.transaction()?;
    if !opportunities::close(&tx, &opp.id, StatutFinal::Gagne, now)? {
        return Ok(false);
    }
    chantiers::upsert_for_opportunity(&tx, &opp.id, &opp.client_id, now)?;
    tx.commit()?;
    Ok(true)
}
