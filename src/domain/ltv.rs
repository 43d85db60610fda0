// src/domain/ltv.rs

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Age after which a done proposal without follow-through gets flagged.
pub const FOLLOW_UP_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LtvCategorie {
    Reputation,
    Parrainage,
    ContratRecurrent,
    Upsell,
}

impl LtvCategorie {
    pub const ALL: [LtvCategorie; 4] = [
        LtvCategorie::Reputation,
        LtvCategorie::Parrainage,
        LtvCategorie::ContratRecurrent,
        LtvCategorie::Upsell,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LtvCategorie::Reputation => "reputation",
            LtvCategorie::Parrainage => "parrainage",
            LtvCategorie::ContratRecurrent => "contrat_recurrent",
            LtvCategorie::Upsell => "upsell",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reputation" => Some(LtvCategorie::Reputation),
            "parrainage" => Some(LtvCategorie::Parrainage),
            "contrat_recurrent" => Some(LtvCategorie::ContratRecurrent),
            "upsell" => Some(LtvCategorie::Upsell),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LtvCategorie::Reputation => "Réputation",
            LtvCategorie::Parrainage => "Parrainage",
            LtvCategorie::ContratRecurrent => "Contrats récurrents",
            LtvCategorie::Upsell => "Équipements complémentaires",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LtvStatut {
    AFaire,
    EnCours,
    Fait,
    Refuse,
}

impl LtvStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            LtvStatut::AFaire => "a_faire",
            LtvStatut::EnCours => "en_cours",
            LtvStatut::Fait => "fait",
            LtvStatut::Refuse => "refuse",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "a_faire" => Some(LtvStatut::AFaire),
            "en_cours" => Some(LtvStatut::EnCours),
            "fait" => Some(LtvStatut::Fait),
            "refuse" => Some(LtvStatut::Refuse),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LtvStatut::AFaire => "À faire",
            LtvStatut::EnCours => "En cours",
            LtvStatut::Fait => "Fait",
            LtvStatut::Refuse => "Refusé",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LtvAction {
    pub id: String,
    pub chantier_id: Option<String>,
    pub client_id: String,
    pub categorie: LtvCategorie,
    pub nom: String,
    pub ordre: i64,
    pub statut: LtvStatut,
    pub date_proposition: Option<DateTime<Utc>>,
    pub date_action: Option<DateTime<Utc>>,
    pub date_echeance: Option<NaiveDate>,
    pub commentaire: Option<String>,
    pub nombre_parrainages: i64,
}

impl LtvAction {
    /// Proposal actions are recognised by name.
    pub fn is_proposal(&self) -> bool {
        self.nom.to_lowercase().contains("propose")
    }

    /// Flips between `fait` and `a_faire`. Any status other than `fait` becomes `fait`.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        if self.statut == LtvStatut::Fait {
            self.statut = LtvStatut::AFaire;
            self.date_action = None;
        } else {
            self.mark_done(now);
        }
    }

    /// Sets an explicit status; reaching `fait` stamps the same dates a toggle would.
    pub fn set_statut(&mut self, statut: LtvStatut, now: DateTime<Utc>) {
        match statut {
            LtvStatut::Fait if self.statut != LtvStatut::Fait => self.mark_done(now),
            LtvStatut::Fait => {}
            other => {
                self.statut = other;
                self.date_action = None;
            }
        }
    }

    fn mark_done(&mut self, now: DateTime<Utc>) {
        self.statut = LtvStatut::Fait;
        self.date_action = Some(now);
        if self.is_proposal() && self.date_proposition.is_none() {
            self.date_proposition = Some(now);
        }
    }
}

/// One entry of the server-defined checklist catalog.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub categorie: LtvCategorie,
    pub nom: &'static str,
}

/// Actions generated for every finalized worksite, in display order.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        categorie: LtvCategorie::Reputation,
        nom: "Proposer de laisser un avis Google",
    },
    CatalogEntry {
        categorie: LtvCategorie::Reputation,
        nom: "Avis Google reçu",
    },
    CatalogEntry {
        categorie: LtvCategorie::Reputation,
        nom: "Répondre à l'avis Google",
    },
    CatalogEntry {
        categorie: LtvCategorie::Parrainage,
        nom: "Proposer le programme de parrainage",
    },
    CatalogEntry {
        categorie: LtvCategorie::Parrainage,
        nom: "Enregistrer les parrainages reçus",
    },
    CatalogEntry {
        categorie: LtvCategorie::ContratRecurrent,
        nom: "Proposer un contrat de maintenance",
    },
    CatalogEntry {
        categorie: LtvCategorie::ContratRecurrent,
        nom: "Installer le contrat de maintenance",
    },
    CatalogEntry {
        categorie: LtvCategorie::ContratRecurrent,
        nom: "Proposer la télésurveillance",
    },
    CatalogEntry {
        categorie: LtvCategorie::ContratRecurrent,
        nom: "Installer la télésurveillance",
    },
    CatalogEntry {
        categorie: LtvCategorie::Upsell,
        nom: "Proposer un équipement complémentaire",
    },
    CatalogEntry {
        categorie: LtvCategorie::Upsell,
        nom: "Installer l'équipement complémentaire",
    },
];

/// 0–10 score from the completed/total ratio. No actions scores 0.
pub fn compute_score(actions: &[LtvAction]) -> i64 {
    if actions.is_empty() {
        return 0;
    }
    let done = actions
        .iter()
        .filter(|a| a.statut == LtvStatut::Fait)
        .count();
    let ratio = done as f64 / actions.len() as f64;
    ((ratio * 10.0).round() as i64).clamp(0, 10)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Optimise,
    PartiellementOptimise,
    PotentielInexploite,
}

impl ScoreBand {
    pub fn from_score(score: i64) -> Self {
        if score >= 8 {
            ScoreBand::Optimise
        } else if score >= 4 {
            ScoreBand::PartiellementOptimise
        } else {
            ScoreBand::PotentielInexploite
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Optimise => "Client optimisé",
            ScoreBand::PartiellementOptimise => "Partiellement optimisé",
            ScoreBand::PotentielInexploite => "Potentiel inexploité",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ScoreBand::Optimise => "band-high",
            ScoreBand::PartiellementOptimise => "band-mid",
            ScoreBand::PotentielInexploite => "band-low",
        }
    }
}

/// True when a proposal was marked done at least `FOLLOW_UP_DAYS` ago.
pub fn needs_follow_up(actions: &[LtvAction], now: DateTime<Utc>) -> bool {
    let threshold = now - Duration::days(FOLLOW_UP_DAYS);
    actions.iter().any(|a| {
        a.is_proposal()
            && a.statut == LtvStatut::Fait
            && a.date_proposition.map(|d| d <= threshold).unwrap_or(false)
    })
}

/// Groups actions by category, keeping catalog order inside each group.
pub fn group_by_categorie(actions: &[LtvAction]) -> Vec<(LtvCategorie, Vec<&LtvAction>)> {
    LtvCategorie::ALL
        .iter()
        .map(|cat| {
            let mut items: Vec<&LtvAction> =
                actions.iter().filter(|a| a.categorie == *cat).collect();
            items.sort_by_key(|a| a.ordre);
            (*cat, items)
        })
        .filter(|(_, items)| !items.is_empty())
        .collect()
}
