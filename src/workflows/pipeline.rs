// src/workflows/pipeline.rs
use chrono::{DateTime, Utc};

use crate::db::interactions::{self, INTERACTION_KINDS};
use crate::db::opportunities::{self, NewOpportunite};
use crate::db::{clients, procedures, Database};
use crate::domain::client::{clean, Client, ContactFields};
use crate::domain::dates::days_since;
use crate::domain::opportunity::{
    plan_transition, Opportunite, StatusTarget, TransitionBlocked, TransitionPlan, WorkingStatus,
};
use crate::erp::ClientCodes;
use crate::errors::ServerError;
use crate::state::AppState;

pub struct PipelineRow {
    pub opportunite: Opportunite,
    pub client: Client,
    pub days_since_contact: Option<i64>,
}

pub struct PipelineColumn {
    pub key: &'static str,
    pub label: &'static str,
    pub rows: Vec<PipelineRow>,
}

const COLUMNS: [(&str, &str); 5] = [
    ("prospection", "Prospection"),
    ("devis_transmis", "Devis transmis"),
    ("relance_1", "Relance 1"),
    ("relance_2", "Relance 2"),
    ("relance_3", "Relance 3"),
];

/// Open opportunities grouped by working status. Closed ones never appear.
pub fn overview(db: &Database, now: DateTime<Utc>) -> Result<Vec<PipelineColumn>, ServerError> {
    let mut columns: Vec<PipelineColumn> = COLUMNS
        .iter()
        .map(|&(key, label)| PipelineColumn {
            key,
            label,
            rows: Vec::new(),
        })
        .collect();

    db.with_conn(|conn| {
        for opp in opportunities::list_open(conn)? {
            let Some(client) = clients::get_client(conn, &opp.client_id)? else {
                continue;
            };
            let days_since_contact = interactions::last_interaction_at(conn, &client.id)?
                .map(|at| days_since(at, now));
            let rank = match opp.current() {
                StatusTarget::Working(w) => w.rank() as usize,
                StatusTarget::Final(_) => continue,
            };
            columns[rank].rows.push(PipelineRow {
                opportunite: opp,
                client,
                days_since_contact,
            });
        }
        Ok(())
    })?;

    Ok(columns)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Applied,
    /// `gagne` was requested but no ERP client is linked yet.
    NeedsCompletion,
}

/// Applies a status picked in the pipeline. Blocked moves leave the record as it was.
pub fn set_status(
    db: &Database,
    opportunite_id: &str,
    raw: &str,
    now: DateTime<Utc>,
) -> Result<StatusChange, ServerError> {
    let target = StatusTarget::parse(raw)
        .ok_or_else(|| ServerError::Validation("Choisissez un statut".into()))?;

    db.with_conn(|conn| {
        let opp = opportunities::get_opportunite(conn, opportunite_id)?
            .ok_or(ServerError::NotFound)?;
        let client = clients::get_client(conn, &opp.client_id)?.ok_or(ServerError::NotFound)?;

        match plan_transition(&opp, client.extrabat_id.is_some(), &target) {
            Ok(TransitionPlan::Advance(w)) => {
                opportunities::set_working_status(conn, &opp.id, w.as_str(), now)?;
            }
            Ok(TransitionPlan::Win) => {
                if !procedures::win_opportunity(conn, &opp, now)? {
                    return Err(ServerError::Conflict(TransitionBlocked::Closed.to_string()));
                }
            }
            Ok(TransitionPlan::Close(statut_final)) => {
                if !opportunities::close(conn, &opp.id, statut_final, now)? {
                    return Err(ServerError::Conflict(TransitionBlocked::Closed.to_string()));
                }
            }
            Err(TransitionBlocked::NeedsCompletion) => {
                tracing::info!(opportunite = %opp.id, "win blocked until the client record is completed");
                return Ok(StatusChange::NeedsCompletion);
            }
            Err(blocked) => return Err(ServerError::Conflict(blocked.to_string())),
        }

        tracing::info!(opportunite = %opp.id, from = %opp.statut, to = target.as_str(), "status changed");
        Ok(StatusChange::Applied)
    })
}

/// Loads the opportunity and its client for the completion form.
pub fn completion_context(
    db: &Database,
    opportunite_id: &str,
) -> Result<(Opportunite, Client), ServerError> {
    db.with_conn(|conn| {
        let opp = opportunities::get_opportunite(conn, opportunite_id)?
            .ok_or(ServerError::NotFound)?;
        let client = clients::get_client(conn, &opp.client_id)?.ok_or(ServerError::NotFound)?;
        Ok((opp, client))
    })
}

/// Completion form submit: link or create the ERP client, store the id, then win.
/// `existing_erp_id` is set when the user picked a match from the ERP search.
pub fn complete_and_win(
    app: &AppState,
    opportunite_id: &str,
    fields: ContactFields,
    codes: &ClientCodes,
    existing_erp_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    let fields = fields.validate_completion()?;
    let (opp, client) = completion_context(&app.db, opportunite_id)?;
    if opp.is_closed() {
        return Err(ServerError::Conflict(TransitionBlocked::Closed.to_string()));
    }

    let extrabat_id = match clean(existing_erp_id) {
        Some(id) => {
            app.erp.get_client(&id)?;
            id
        }
        None => match &client.extrabat_id {
            Some(id) => id.clone(),
            None => app.erp.create_client(&fields, codes)?,
        },
    };

    app.db.with_conn(|conn| {
        if let Some(other) = clients::find_by_extrabat_id(conn, &extrabat_id)? {
            if other.id != client.id {
                return Err(ServerError::Conflict(format!(
                    "le client Extrabat {extrabat_id} est déjà lié à la fiche {}",
                    other.display_name()
                )));
            }
        }
        clients::complete_client(conn, &client.id, &fields, &extrabat_id)?;
        if !procedures::win_opportunity(conn, &opp, now)? {
            return Err(ServerError::Conflict(TransitionBlocked::Closed.to_string()));
        }
        tracing::info!(opportunite = %opp.id, extrabat_id = %extrabat_id, "client completed, opportunity won");
        Ok(())
    })
}

pub struct NewProspect {
    pub fields: ContactFields,
    pub titre: Option<String>,
    pub description: Option<String>,
    pub montant_estime: Option<f64>,
}

fn insert_prospect(
    db: &Database,
    fields: &ContactFields,
    titre: Option<&str>,
    description: Option<&str>,
    montant_estime: Option<f64>,
    saisie_rapide: bool,
    now: DateTime<Utc>,
) -> Result<String, ServerError> {
    let default_titre = format!("Projet {}", fields.nom);
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let client_id = clients::insert_client(&tx, fields, None, now)?;
        let opp_id = opportunities::insert_opportunite(
            &tx,
            &NewOpportunite {
                client_id: &client_id,
                titre: titre.unwrap_or(&default_titre),
                description,
                montant_estime,
                saisie_rapide,
            },
            now,
        )?;
        tx.commit()?;
        tracing::info!(client = %client_id, opportunite = %opp_id, saisie_rapide, "prospect created");
        Ok(opp_id)
    })
}

/// Full prospect form. The name is checked before anything is written.
pub fn create_prospect(
    db: &Database,
    prospect: NewProspect,
    now: DateTime<Utc>,
) -> Result<String, ServerError> {
    let fields = prospect.fields.validate_prospect()?;
    insert_prospect(
        db,
        &fields,
        prospect.titre.as_deref(),
        prospect.description.as_deref(),
        prospect.montant_estime,
        false,
        now,
    )
}

/// Quick entry: name plus phone or email, flagged for later completion.
pub fn quick_entry(
    db: &Database,
    fields: ContactFields,
    titre: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, ServerError> {
    let fields = fields.validate_quick_entry()?;
    insert_prospect(db, &fields, titre, None, None, true, now)
}

pub fn log_interaction(
    db: &Database,
    opportunite_id: &str,
    kind: &str,
    contenu: &str,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    if !INTERACTION_KINDS.iter().any(|(k, _)| *k == kind) {
        return Err(ServerError::Validation(format!("Type d'échange inconnu : {kind}")));
    }
    let contenu = contenu.trim();
    if contenu.is_empty() {
        return Err(ServerError::Validation("Le compte rendu est vide".into()));
    }

    db.with_conn(|conn| {
        let opp = opportunities::get_opportunite(conn, opportunite_id)?
            .ok_or(ServerError::NotFound)?;
        interactions::insert_interaction(conn, &opp.client_id, Some(&opp.id), kind, contenu, now)?;
        Ok(())
    })
}

/// Values offered by the status picker, in pipeline order.
pub fn status_choices() -> Vec<(String, String)> {
    let working = [
        WorkingStatus::DevisTransmis,
        WorkingStatus::Relance1,
        WorkingStatus::Relance2,
        WorkingStatus::Relance3,
    ];
    crate::domain::opportunity::PROSPECT_STAGES
        .iter()
        .map(|(slug, label)| (slug.to_string(), label.to_string()))
        .chain(working.iter().map(|w| (w.as_str().to_string(), w.label())))
        .chain([
            ("gagne".to_string(), "Gagné".to_string()),
            ("perdu".to_string(), "Perdu".to_string()),
            ("standby".to_string(), "Stand-by".to_string()),
        ])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{fake_app, now, FakeErp};
    use crate::domain::opportunity::StatutFinal;

    fn quick(app: &AppState) -> String {
        quick_entry(
            &app.db,
            ContactFields {
                nom: "Lefèvre".into(),
                telephone: Some("0611223344".into()),
                ..Default::default()
            },
            None,
            now(),
        )
        .unwrap()
    }

    #[test]
    fn win_without_erp_link_waits_for_completion() {
        let app = fake_app(FakeErp::default());
        let opp_id = quick(&app);

        assert_eq!(
            set_status(&app.db, &opp_id, "gagne", now()).unwrap(),
            StatusChange::NeedsCompletion
        );
        let (opp, _) = completion_context(&app.db, &opp_id).unwrap();
        assert_eq!(opp.statut_final, None);
    }

    #[test]
    fn completion_creates_erp_client_then_wins() {
        let erp = FakeErp::default();
        let app = fake_app(erp.clone());
        let opp_id = quick(&app);

        let fields = ContactFields {
            nom: "Lefèvre".into(),
            telephone: Some("0611223344".into()),
            adresse: Some("4 impasse du Moulin".into()),
            code_postal: Some("44000".into()),
            ville: Some("Nantes".into()),
            ..Default::default()
        };
        let codes = ClientCodes {
            origine_id: Some("4".into()),
            ..Default::default()
        };
        complete_and_win(&app, &opp_id, fields, &codes, None, now()).unwrap();
        assert_eq!(erp.last_codes(), Some(codes));

        let (opp, client) = completion_context(&app.db, &opp_id).unwrap();
        assert_eq!(opp.statut_final, Some(StatutFinal::Gagne));
        assert_eq!(client.extrabat_id.as_deref(), Some("erp-1"));
        let chantier = app
            .db
            .with_conn(|conn| crate::db::chantiers::find_by_opportunity(conn, &opp_id))
            .unwrap();
        assert!(chantier.is_some());
    }

    #[test]
    fn incomplete_completion_form_changes_nothing() {
        let app = fake_app(FakeErp::default());
        let opp_id = quick(&app);

        let err = complete_and_win(
            &app,
            &opp_id,
            ContactFields {
                nom: "Lefèvre".into(),
                ..Default::default()
            },
            &ClientCodes::default(),
            None,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));

        let (opp, client) = completion_context(&app.db, &opp_id).unwrap();
        assert_eq!(opp.statut_final, None);
        assert_eq!(client.extrabat_id, None);
    }

    #[test]
    fn lost_closes_and_leaves_pipeline() {
        let app = fake_app(FakeErp::default());
        let opp_id = quick(&app);

        assert_eq!(
            set_status(&app.db, &opp_id, "perdu", now()).unwrap(),
            StatusChange::Applied
        );
        let columns = overview(&app.db, now()).unwrap();
        assert!(columns.iter().all(|c| c.rows.is_empty()));

        let err = set_status(&app.db, &opp_id, "relance_1", now()).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
    }

    #[test]
    fn interactions_feed_days_since_contact() {
        let app = fake_app(FakeErp::default());
        let opp_id = quick(&app);
        let earlier = now() - chrono::Duration::days(3);

        log_interaction(&app.db, &opp_id, "appel", "Rappel pour devis", earlier).unwrap();
        assert!(log_interaction(&app.db, &opp_id, "fax", "x", now()).is_err());

        let columns = overview(&app.db, now()).unwrap();
        assert_eq!(columns[0].rows[0].days_since_contact, Some(3));
    }
}
