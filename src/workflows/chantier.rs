// src/workflows/chantier.rs
use chrono::{DateTime, Utc};

use crate::db::chantiers::{self, ChantierListItem};
use crate::db::procedures::{self, Finalization};
use crate::db::Database;
use crate::domain::chantier::{Jalon, ToggleEffect};
use crate::domain::dates::parse_datetime_input;
use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilestoneOutcome {
    Updated,
    /// `planifie` is only reached through the scheduling form.
    OpenScheduling,
    Finalized(Finalization),
}

pub fn tracker(db: &Database) -> Result<Vec<ChantierListItem>, ServerError> {
    db.with_conn(|conn| chantiers::list_chantiers(conn))
}

pub fn toggle_milestone(
    db: &Database,
    chantier_id: &str,
    jalon: Jalon,
    now: DateTime<Utc>,
) -> Result<MilestoneOutcome, ServerError> {
    db.with_conn(|conn| {
        let mut chantier =
            chantiers::get_chantier(conn, chantier_id)?.ok_or(ServerError::NotFound)?;

        match chantier.toggle(jalon, now) {
            ToggleEffect::OpenScheduling => Ok(MilestoneOutcome::OpenScheduling),
            ToggleEffect::Finalize => {
                let done = procedures::finalize_chantier(conn, &chantier, now)?;
                tracing::info!(
                    chantier = %chantier.id,
                    newly_finalised = done.newly_finalised,
                    actions_created = done.actions_created,
                    score = done.score,
                    "worksite finalized"
                );
                Ok(MilestoneOutcome::Finalized(done))
            }
            ToggleEffect::Stamped | ToggleEffect::Cleared => {
                chantiers::save_milestones(conn, &chantier)?;
                tracing::info!(chantier = %chantier.id, jalon = jalon.slug(), "milestone toggled");
                Ok(MilestoneOutcome::Updated)
            }
        }
    })
}

/// Inline date edit. Dates are not checked against each other.
pub fn set_milestone_date(
    db: &Database,
    chantier_id: &str,
    jalon: Jalon,
    raw: &str,
) -> Result<(), ServerError> {
    let date = parse_datetime_input(raw)
        .ok_or_else(|| ServerError::Validation(format!("Date invalide : {}", raw.trim())))?;

    db.with_conn(|conn| {
        let mut chantier =
            chantiers::get_chantier(conn, chantier_id)?.ok_or(ServerError::NotFound)?;
        if !chantier.set_date(jalon, date) {
            return Err(ServerError::Validation(format!(
                "« {} » n'est pas encore atteint",
                jalon.label()
            )));
        }
        chantiers::save_milestones(conn, &chantier)
    })
}
