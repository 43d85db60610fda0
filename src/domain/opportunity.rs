// src/domain/opportunity.rs

use chrono::{DateTime, Utc};

/// Named prospecting stages offered in the status picker. Any other
/// free-text working status is treated as a prospecting variant too.
pub const PROSPECT_STAGES: &[(&str, &str)] = &[
    ("prospection", "Prospection"),
    ("a_qualifier", "À qualifier"),
    ("rdv_planifie", "RDV planifié"),
    ("visite_technique", "Visite technique"),
];

/// Non-terminal position in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingStatus {
    Prospection(String),
    DevisTransmis,
    Relance1,
    Relance2,
    Relance3,
}

impl WorkingStatus {
    pub fn rank(&self) -> u8 {
        match self {
            WorkingStatus::Prospection(_) => 0,
            WorkingStatus::DevisTransmis => 1,
            WorkingStatus::Relance1 => 2,
            WorkingStatus::Relance2 => 3,
            WorkingStatus::Relance3 => 4,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WorkingStatus::Prospection(s) => s.as_str(),
            WorkingStatus::DevisTransmis => "devis_transmis",
            WorkingStatus::Relance1 => "relance_1",
            WorkingStatus::Relance2 => "relance_2",
            WorkingStatus::Relance3 => "relance_3",
        }
    }

    pub fn label(&self) -> String {
        match self {
            WorkingStatus::Prospection(s) => PROSPECT_STAGES
                .iter()
                .find(|(slug, _)| *slug == s.as_str())
                .map(|(_, label)| label.to_string())
                .unwrap_or_else(|| s.clone()),
            WorkingStatus::DevisTransmis => "Devis transmis".to_string(),
            WorkingStatus::Relance1 => "Relance 1".to_string(),
            WorkingStatus::Relance2 => "Relance 2".to_string(),
            WorkingStatus::Relance3 => "Relance 3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatutFinal {
    Gagne,
    Perdu,
    Standby,
}

impl StatutFinal {
    pub fn as_str(self) -> &'static str {
        match self {
            StatutFinal::Gagne => "gagne",
            StatutFinal::Perdu => "perdu",
            StatutFinal::Standby => "standby",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gagne" => Some(StatutFinal::Gagne),
            "perdu" => Some(StatutFinal::Perdu),
            "standby" => Some(StatutFinal::Standby),
            _ => None,
        }
    }
}

/// A requested status, parsed from the picker value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTarget {
    Working(WorkingStatus),
    Final(StatutFinal),
}

impl StatusTarget {
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if let Some(f) = StatutFinal::parse(s) {
            return Some(StatusTarget::Final(f));
        }
        let working = match s {
            "devis_transmis" => WorkingStatus::DevisTransmis,
            "relance_1" => WorkingStatus::Relance1,
            "relance_2" => WorkingStatus::Relance2,
            "relance_3" => WorkingStatus::Relance3,
            other => WorkingStatus::Prospection(other.to_string()),
        };
        Some(StatusTarget::Working(working))
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatusTarget::Working(w) => w.as_str(),
            StatusTarget::Final(f) => f.as_str(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            StatusTarget::Working(w) => w.rank(),
            StatusTarget::Final(_) => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Opportunite {
    pub id: String,
    pub client_id: String,
    pub titre: String,
    pub description: Option<String>,
    pub montant_estime: Option<f64>,
    pub statut: String,
    pub statut_final: Option<StatutFinal>,
    pub date_cloture: Option<DateTime<Utc>>,
    pub saisie_rapide: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Opportunite {
    pub fn is_closed(&self) -> bool {
        self.statut_final.is_some()
    }

    /// Current position; a closed record reports its final status.
    pub fn current(&self) -> StatusTarget {
        match self.statut_final {
            Some(f) => StatusTarget::Final(f),
            None => StatusTarget::parse(&self.statut)
                .unwrap_or(StatusTarget::Working(WorkingStatus::Prospection(
                    "prospection".to_string(),
                ))),
        }
    }
}

/// Side effects the store must apply for an accepted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Only the working status string changes.
    Advance(WorkingStatus),
    /// Stamp `gagne` + closure date and upsert the worksite.
    Win,
    /// Stamp the final status + closure date.
    Close(StatutFinal),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionBlocked {
    #[error("l'opportunité est déjà clôturée")]
    Closed,
    #[error("retour en arrière impossible : {from} → {to}")]
    Backward { from: String, to: String },
    /// No ERP client is linked yet; the completion form must run first.
    #[error("fiche client à compléter avant de passer en gagné")]
    NeedsCompletion,
}

/// Decides whether `target` is reachable from the opportunity's current status.
pub fn plan_transition(
    opp: &Opportunite,
    erp_linked: bool,
    target: &StatusTarget,
) -> Result<TransitionPlan, TransitionBlocked> {
    if opp.is_closed() {
        return Err(TransitionBlocked::Closed);
    }

    let current = opp.current();
    if target.rank() < current.rank() {
        return Err(TransitionBlocked::Backward {
            from: current.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }

    match target {
        StatusTarget::Working(w) => Ok(TransitionPlan::Advance(w.clone())),
        StatusTarget::Final(StatutFinal::Gagne) if !erp_linked => {
            Err(TransitionBlocked::NeedsCompletion)
        }
        StatusTarget::Final(StatutFinal::Gagne) => Ok(TransitionPlan::Win),
        StatusTarget::Final(other) => Ok(TransitionPlan::Close(*other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn opp(statut: &str) -> Opportunite {
        let t = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
        Opportunite {
            id: "op".into(),
            client_id: "cl".into(),
            titre: "Alarme entrepôt".into(),
            description: None,
            montant_estime: None,
            statut: statut.into(),
            statut_final: None,
            date_cloture: None,
            saisie_rapide: false,
            created_at: t,
            updated_at: t,
        }
    }

    fn target(s: &str) -> StatusTarget {
        StatusTarget::parse(s).unwrap()
    }

    #[test]
    fn moves_forward_through_reminders() {
        let o = opp("devis_transmis");
        assert_eq!(
            plan_transition(&o, false, &target("relance_2")),
            Ok(TransitionPlan::Advance(WorkingStatus::Relance2))
        );
    }

    #[test]
    fn prospecting_variants_are_interchangeable() {
        let o = opp("a_qualifier");
        assert_eq!(
            plan_transition(&o, false, &target("rdv_planifie")),
            Ok(TransitionPlan::Advance(WorkingStatus::Prospection(
                "rdv_planifie".into()
            )))
        );
    }

    #[test]
    fn backward_moves_are_rejected() {
        let o = opp("relance_1");
        assert!(matches!(
            plan_transition(&o, true, &target("devis_transmis")),
            Err(TransitionBlocked::Backward { .. })
        ));
    }

    #[test]
    fn winning_requires_a_linked_erp_client() {
        let mut o = opp("relance_3");
        o.saisie_rapide = true;
        assert_eq!(
            plan_transition(&o, false, &target("gagne")),
            Err(TransitionBlocked::NeedsCompletion)
        );
        assert_eq!(plan_transition(&o, true, &target("gagne")), Ok(TransitionPlan::Win));
    }

    #[test]
    fn losing_only_closes() {
        let o = opp("prospection");
        assert_eq!(
            plan_transition(&o, false, &target("perdu")),
            Ok(TransitionPlan::Close(StatutFinal::Perdu))
        );
    }

    #[test]
    fn closed_records_are_frozen() {
        let mut o = opp("gagne");
        o.statut_final = Some(StatutFinal::Gagne);
        assert_eq!(
            plan_transition(&o, true, &target("perdu")),
            Err(TransitionBlocked::Closed)
        );
    }

    #[test]
    fn blank_target_does_not_parse() {
        assert_eq!(StatusTarget::parse("   "), None);
    }
}
