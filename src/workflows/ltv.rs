// src/workflows/ltv.rs
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::{clients, ltv, procedures, Database};
use crate::domain::client::Client;
use crate::domain::ltv::{needs_follow_up, LtvAction, LtvStatut, ScoreBand};
use crate::errors::ServerError;
use crate::mailer::{MailKind, MailRequest};
use crate::state::AppState;

pub struct LtvCard {
    pub client: Client,
    pub actions: Vec<LtvAction>,
    pub band: ScoreBand,
    pub needs_follow_up: bool,
}

/// Board of enrolled clients with their checklist.
pub fn board(db: &Database, now: DateTime<Utc>) -> Result<Vec<LtvCard>, ServerError> {
    db.with_conn(|conn| {
        let mut cards = Vec::new();
        for client in clients::list_ltv_clients(conn)? {
            let actions = ltv::list_for_client(conn, &client.id)?;
            cards.push(LtvCard {
                band: ScoreBand::from_score(client.ltv_score),
                needs_follow_up: needs_follow_up(&actions, now),
                client,
                actions,
            });
        }
        Ok(cards)
    })
}

/// Writes the action and refreshes the owner's score in one transaction.
fn save_and_rescore(
    db: &Database,
    action_id: &str,
    change: impl FnOnce(&mut LtvAction),
) -> Result<(LtvAction, i64), ServerError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        let mut action = ltv::get_action(&tx, action_id)?.ok_or(ServerError::NotFound)?;
        change(&mut action);
        ltv::save_action(&tx, &action)?;
        let score = procedures::calculate_ltv_score(&tx, &action.client_id)?;
        tx.commit()?;
        Ok((action, score))
    })
}

pub fn toggle_action(
    db: &Database,
    action_id: &str,
    now: DateTime<Utc>,
) -> Result<(LtvAction, i64), ServerError> {
    let (action, score) = save_and_rescore(db, action_id, |a| a.toggle(now))?;
    tracing::info!(action = %action.id, statut = action.statut.as_str(), score, "LTV action toggled");
    Ok((action, score))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionEdit {
    pub statut: LtvStatut,
    pub commentaire: Option<String>,
    pub date_echeance: Option<NaiveDate>,
    pub nombre_parrainages: i64,
}

pub fn edit_action(
    db: &Database,
    action_id: &str,
    edit: ActionEdit,
    now: DateTime<Utc>,
) -> Result<(LtvAction, i64), ServerError> {
    if edit.nombre_parrainages < 0 {
        return Err(ServerError::Validation(
            "Le nombre de parrainages ne peut pas être négatif".into(),
        ));
    }
    save_and_rescore(db, action_id, |a| {
        a.set_statut(edit.statut, now);
        a.commentaire = edit.commentaire;
        a.date_echeance = edit.date_echeance;
        a.nombre_parrainages = edit.nombre_parrainages;
    })
}

/// Enrollment without a worksite: no checklist is generated.
pub fn enroll_manually(
    db: &Database,
    client_id: &str,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;
        clients::enroll_client_in_ltv(&tx, client_id, now)?;
        let score = procedures::calculate_ltv_score(&tx, client_id)?;
        tx.commit()?;
        tracing::info!(client = %client_id, "client enrolled in LTV programme");
        Ok(score)
    })
}

/// Sends one of the transactional messages to a local client.
pub fn send_message(app: &AppState, client_id: &str, kind: MailKind) -> Result<(), ServerError> {
    let client = app
        .db
        .with_conn(|conn| clients::get_client(conn, client_id))?
        .ok_or(ServerError::NotFound)?;

    let to = if kind.is_sms() {
        client.telephone.as_deref()
    } else {
        client.email.as_deref()
    };
    let req = MailRequest::new(kind, to, &client.nom, client.prenom.as_deref())?;
    app.mailer.send(kind, &req)?;

    tracing::info!(client = %client.id, function = kind.function_name(), "message sent");
    Ok(())
}
