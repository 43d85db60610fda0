// src/workflows/client_dashboard.rs
use chrono::{DateTime, Utc};

use crate::db::interactions::{self, Interaction};
use crate::db::{chantiers, clients, ltv, opportunities};
use crate::domain::chantier::Chantier;
use crate::domain::client::Client;
use crate::domain::dates::days_since;
use crate::domain::ltv::{needs_follow_up, LtvAction, ScoreBand};
use crate::domain::opportunity::Opportunite;
use crate::erp::{ClientDocuments, ErpClient};
use crate::errors::ServerError;
use crate::state::AppState;

pub struct ClientDashboard {
    pub erp_client: ErpClient,
    pub client: Client,
    /// Set when the local row was created from the ERP record on this visit.
    pub materialized: bool,
    /// Document listing is optional; its failure is shown inline.
    pub documents: Result<ClientDocuments, String>,
    pub opportunites: Vec<Opportunite>,
    pub chantiers: Vec<Chantier>,
    pub actions: Vec<LtvAction>,
    pub interactions: Vec<Interaction>,
    pub band: ScoreBand,
    pub needs_follow_up: bool,
    pub days_since_contact: Option<i64>,
    pub days_in_programme: Option<i64>,
}

/// Client dashboard keyed by ERP id. A missing local client is created from
/// the ERP record.
pub fn load(
    app: &AppState,
    extrabat_id: &str,
    now: DateTime<Utc>,
) -> Result<ClientDashboard, ServerError> {
    let erp_client = app.erp.get_client(extrabat_id)?;

    let (client, materialized) = app.db.with_conn(|conn| {
        if let Some(c) = clients::find_by_extrabat_id(conn, &erp_client.id)? {
            return Ok((c, false));
        }
        let id = clients::insert_client(conn, &erp_client.to_contact_fields(), Some(&erp_client.id), now)?;
        let c = clients::get_client(conn, &id)?.ok_or(ServerError::InternalError)?;
        Ok((c, true))
    })?;
    if materialized {
        tracing::info!(client = %client.id, extrabat_id = %erp_client.id, "client materialized from ERP");
    }

    let documents = app.erp.client_documents(&erp_client.id).map_err(|e| {
        tracing::warn!(extrabat_id = %erp_client.id, error = %e, "document listing failed");
        e.to_string()
    });

    let (opportunites, chantiers, actions, interactions) = app.db.with_conn(|conn| {
        Ok((
            opportunities::list_for_client(conn, &client.id)?,
            chantiers::list_for_client(conn, &client.id)?,
            ltv::list_for_client(conn, &client.id)?,
            interactions::list_for_client(conn, &client.id)?,
        ))
    })?;

    let days_since_contact = interactions
        .iter()
        .map(|i| i.date_interaction)
        .max()
        .map(|at| days_since(at, now));

    Ok(ClientDashboard {
        band: ScoreBand::from_score(client.ltv_score),
        needs_follow_up: needs_follow_up(&actions, now),
        days_in_programme: client.ltv_date_inscription.map(|d| days_since(d, now)),
        days_since_contact,
        erp_client,
        client,
        materialized,
        documents,
        opportunites,
        chantiers,
        actions,
        interactions,
    })
}
