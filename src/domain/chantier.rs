// src/domain/chantier.rs

use chrono::{DateTime, Utc};

/// The four independent milestones of a worksite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jalon {
    CommandePassee,
    CommandeRecue,
    Planifie,
    Termine,
}

impl Jalon {
    pub const ALL: [Jalon; 4] = [
        Jalon::CommandePassee,
        Jalon::CommandeRecue,
        Jalon::Planifie,
        Jalon::Termine,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Jalon::CommandePassee => "commande_passee",
            Jalon::CommandeRecue => "commande_recue",
            Jalon::Planifie => "planifie",
            Jalon::Termine => "termine",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Jalon::ALL.into_iter().find(|j| j.slug() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Jalon::CommandePassee => "Commande passée",
            Jalon::CommandeRecue => "Commande reçue",
            Jalon::Planifie => "Planifié",
            Jalon::Termine => "Terminé",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChantierStatut {
    EnCours,
    Finalise,
}

impl ChantierStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            ChantierStatut::EnCours => "en_cours",
            ChantierStatut::Finalise => "finalise",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en_cours" => Some(ChantierStatut::EnCours),
            "finalise" => Some(ChantierStatut::Finalise),
            _ => None,
        }
    }
}

/// What the caller must do after a milestone toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEffect {
    Stamped,
    Cleared,
    /// `planifie` is only set by completing the scheduling sub-flow.
    OpenScheduling,
    /// `termine` was stamped; finalization must run next.
    Finalize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chantier {
    pub id: String,
    pub opportunite_id: String,
    pub client_id: String,
    pub statut: ChantierStatut,
    pub commande_passee: bool,
    pub date_commande_passee: Option<DateTime<Utc>>,
    pub commande_recue: bool,
    pub date_commande_recue: Option<DateTime<Utc>>,
    pub planifie: bool,
    pub date_planification: Option<DateTime<Utc>>,
    pub termine: bool,
    pub date_termine: Option<DateTime<Utc>>,
    pub date_finalisation: Option<DateTime<Utc>>,
    pub description_probleme: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Chantier {
    pub fn new(
        id: String,
        opportunite_id: String,
        client_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            opportunite_id,
            client_id,
            statut: ChantierStatut::EnCours,
            commande_passee: false,
            date_commande_passee: None,
            commande_recue: false,
            date_commande_recue: None,
            planifie: false,
            date_planification: None,
            termine: false,
            date_termine: None,
            date_finalisation: None,
            description_probleme: None,
            created_at: now,
        }
    }

    pub fn jalon(&self, jalon: Jalon) -> (bool, Option<DateTime<Utc>>) {
        match jalon {
            Jalon::CommandePassee => (self.commande_passee, self.date_commande_passee),
            Jalon::CommandeRecue => (self.commande_recue, self.date_commande_recue),
            Jalon::Planifie => (self.planifie, self.date_planification),
            Jalon::Termine => (self.termine, self.date_termine),
        }
    }

    fn set_jalon(&mut self, jalon: Jalon, done: bool, date: Option<DateTime<Utc>>) {
        let (flag, stamp) = match jalon {
            Jalon::CommandePassee => (&mut self.commande_passee, &mut self.date_commande_passee),
            Jalon::CommandeRecue => (&mut self.commande_recue, &mut self.date_commande_recue),
            Jalon::Planifie => (&mut self.planifie, &mut self.date_planification),
            Jalon::Termine => (&mut self.termine, &mut self.date_termine),
        };
        *flag = done;
        *stamp = date;
    }

    pub fn completed_count(&self) -> usize {
        Jalon::ALL.iter().filter(|j| self.jalon(**j).0).count()
    }

    /// Fraction of milestones reached, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.completed_count() as f64 / Jalon::ALL.len() as f64
    }

    pub fn progress_percent(&self) -> u32 {
        (self.progress() * 100.0).round() as u32
    }

    pub fn is_finalise(&self) -> bool {
        self.statut == ChantierStatut::Finalise
    }

    pub fn toggle(&mut self, jalon: Jalon, now: DateTime<Utc>) -> ToggleEffect {
        let (done, _) = self.jalon(jalon);
        if done {
            self.set_jalon(jalon, false, None);
            return ToggleEffect::Cleared;
        }
        match jalon {
            Jalon::Planifie => ToggleEffect::OpenScheduling,
            Jalon::Termine => {
                self.set_jalon(jalon, true, Some(now));
                ToggleEffect::Finalize
            }
            _ => {
                self.set_jalon(jalon, true, Some(now));
                ToggleEffect::Stamped
            }
        }
    }

    /// Completion of the scheduling sub-flow.
    pub fn mark_planned(&mut self, now: DateTime<Utc>) {
        self.set_jalon(Jalon::Planifie, true, Some(now));
    }

    /// Inline date edit. Only dates of reached milestones are editable.
    pub fn set_date(&mut self, jalon: Jalon, date: DateTime<Utc>) -> bool {
        let (done, _) = self.jalon(jalon);
        if !done {
            return false;
        }
        self.set_jalon(jalon, true, Some(date));
        true
    }

    /// One-way: there is no transition back to `en_cours`.
    pub fn finalise(&mut self, now: DateTime<Utc>) {
        if self.statut == ChantierStatut::EnCours {
            self.statut = ChantierStatut::Finalise;
            self.date_finalisation = Some(now);
        }
    }

    /// Pairs of dated milestones whose dates run backwards. Display-only.
    pub fn out_of_order(&self) -> Vec<(Jalon, Jalon)> {
        let dated: Vec<(Jalon, DateTime<Utc>)> = Jalon::ALL
            .iter()
            .filter_map(|j| match self.jalon(*j) {
                (true, Some(d)) => Some((*j, d)),
                _ => None,
            })
            .collect();

        dated
            .windows(2)
            .filter(|w| w[1].1 < w[0].1)
            .map(|w| (w[0].0, w[1].0))
            .collect()
    }
}
