// src/workflows/planning.rs
//
// Scheduling sub-flow: local rows are written in one transaction, then every
// technician's ERP appointment is synced one by one. A failed remote call is
// logged and skipped.
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::db::employes::{self, Employe};
use crate::db::{chantiers, clients, interventions};
use crate::domain::chantier::Chantier;
use crate::domain::client::Client;
use crate::domain::intervention::{Intervention, PlannedIntervention};
use crate::erp::{Appointment, ErpError};
use crate::errors::ServerError;
use crate::state::AppState;

pub struct PlanningContext {
    pub chantier: Chantier,
    pub client: Client,
    pub interventions: Vec<Intervention>,
    pub employes: Vec<Employe>,
}

pub fn context(app: &AppState, chantier_id: &str) -> Result<PlanningContext, ServerError> {
    app.db.with_conn(|conn| {
        let chantier = chantiers::get_chantier(conn, chantier_id)?.ok_or(ServerError::NotFound)?;
        let client = clients::get_client(conn, &chantier.client_id)?.ok_or(ServerError::NotFound)?;
        Ok(PlanningContext {
            interventions: interventions::list_for_chantier(conn, &chantier.id)?,
            employes: employes::list_active(conn)?,
            chantier,
            client,
        })
    })
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmployeSync {
    pub synced: usize,
    pub deactivated: usize,
}

/// Mirrors the ERP user list into `employes`, keyed by ERP id, in one transaction.
pub fn sync_employes(app: &AppState) -> Result<EmployeSync, ServerError> {
    let users = app.erp.users()?;
    let sync = app.db.with_conn(|conn| {
        let tx = conn.transaction()?;
        for u in &users {
            employes::upsert_from_erp(&tx, &u.id, &u.nom, u.prenom.as_deref(), u.actif)?;
        }
        // an empty list leaves current employees active
        let deactivated = if users.is_empty() {
            0
        } else {
            let seen: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
            employes::deactivate_missing(&tx, &seen)?
        };
        tx.commit()?;
        Ok(EmployeSync {
            synced: users.len(),
            deactivated,
        })
    })?;
    tracing::info!(synced = sync.synced, deactivated = sync.deactivated, "employees synced from ERP");
    Ok(sync)
}

/// Ids a scheduling form may book.
pub fn bookable_ids(ctx: &PlanningContext) -> Vec<String> {
    ctx.employes.iter().map(|e| e.id.clone()).collect()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlanningReport {
    pub interventions: usize,
    pub appointments_synced: usize,
    pub appointments_deleted: usize,
    pub remote_failures: usize,
}

/// Saves validated rows by position, syncs ERP appointments, then sets `planifie`.
pub fn submit(
    app: &AppState,
    chantier_id: &str,
    planned: &[PlannedIntervention],
    description: Option<&str>,
    now: DateTime<Utc>,
) -> Result<PlanningReport, ServerError> {
    let mut report = PlanningReport {
        interventions: planned.len(),
        ..Default::default()
    };

    let (stale_rdv, ctx) = app.db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let chantier = chantiers::get_chantier(&tx, chantier_id)?.ok_or(ServerError::NotFound)?;
        let active = employes::list_active(&tx)?;
        if let Some(unknown) = planned
            .iter()
            .flat_map(|p| p.technicien_ids.iter())
            .find(|t| !active.iter().any(|e| &e.id == *t))
        {
            return Err(ServerError::Validation(format!("technicien inconnu ou inactif : {unknown}")));
        }
        chantiers::set_description(&tx, &chantier.id, description)?;

        let existing = interventions::list_for_chantier(&tx, &chantier.id)?;
        let mut stale_rdv = Vec::new();

        for row in planned {
            match existing.iter().find(|e| e.position == row.position) {
                Some(current) => {
                    interventions::update_intervention(&tx, &current.id, row)?;
                    stale_rdv.extend(interventions::set_techniciens(
                        &tx,
                        &current.id,
                        &row.technicien_ids,
                    )?);
                }
                None => {
                    let id = interventions::insert_intervention(&tx, &chantier.id, row)?;
                    interventions::set_techniciens(&tx, &id, &row.technicien_ids)?;
                }
            }
        }

        for gone in existing
            .iter()
            .filter(|e| !planned.iter().any(|p| p.position == e.position))
        {
            stale_rdv.extend(gone.techniciens.iter().filter_map(|t| t.extrabat_rdv_id.clone()));
            interventions::delete_intervention(&tx, &gone.id)?;
        }

        let client = clients::get_client(&tx, &chantier.client_id)?.ok_or(ServerError::NotFound)?;
        let ctx = PlanningContext {
            interventions: interventions::list_for_chantier(&tx, &chantier.id)?,
            employes: active,
            chantier,
            client,
        };
        tx.commit()?;
        Ok((stale_rdv, ctx))
    })?;

    for rdv_id in &stale_rdv {
        match app.erp.delete_appointment(rdv_id) {
            Ok(()) | Err(ErpError::NotFound(_)) => report.appointments_deleted += 1,
            Err(e) => {
                report.remote_failures += 1;
                tracing::warn!(rdv = %rdv_id, error = %e, "could not delete ERP appointment");
            }
        }
    }

    sync_appointments(app, &ctx, description, &mut report);

    app.db.with_conn(|conn| {
        let mut chantier = ctx.chantier.clone();
        chantier.mark_planned(now);
        chantiers::save_milestones(conn, &chantier)
    })?;

    tracing::info!(
        chantier = %ctx.chantier.id,
        interventions = report.interventions,
        synced = report.appointments_synced,
        failures = report.remote_failures,
        "worksite planned"
    );
    Ok(report)
}

fn sync_appointments(
    app: &AppState,
    ctx: &PlanningContext,
    description: Option<&str>,
    report: &mut PlanningReport,
) {
    let erp_users: HashMap<&str, &str> = ctx
        .employes
        .iter()
        .filter_map(|e| Some((e.id.as_str(), e.extrabat_id.as_deref()?)))
        .collect();

    for intervention in &ctx.interventions {
        for tech in &intervention.techniciens {
            let Some(user_id) = erp_users.get(tech.employe_id.as_str()) else {
                continue;
            };

            let rdv = Appointment {
                utilisateur_id: user_id.to_string(),
                client_id: ctx.client.extrabat_id.clone(),
                objet: ctx.client.display_name(),
                description: description
                    .or(intervention.notes.as_deref())
                    .unwrap_or_default()
                    .to_string(),
                adresse: ctx.client.full_address(),
                debut: intervention.date_debut,
                fin: intervention.date_fin,
            };

            let result: Result<(), String> = match &tech.extrabat_rdv_id {
                Some(rdv_id) => app
                    .erp
                    .update_appointment(rdv_id, &rdv)
                    .map_err(|e| e.to_string()),
                None => match app.erp.create_appointment(&rdv) {
                    Ok(new_id) => app
                        .db
                        .with_conn(|conn| {
                            interventions::set_rdv_id(conn, &intervention.id, &tech.employe_id, Some(&new_id))
                        })
                        .map_err(|e| format!("appointment {new_id} created but not stored: {e}")),
                    Err(e) => Err(e.to_string()),
                },
            };

            match result {
                Ok(()) => report.appointments_synced += 1,
                Err(e) => {
                    report.remote_failures += 1;
                    tracing::warn!(
                        intervention = %intervention.id,
                        employe = %tech.employe_id,
                        error = %e,
                        "ERP appointment sync failed"
                    );
                }
            }
        }
    }
}
