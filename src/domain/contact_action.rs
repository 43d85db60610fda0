// src/domain/contact_action.rs

use chrono::{DateTime, Utc};

use crate::domain::client::clean;
use crate::errors::ServerError;

/// The two contact-tracking lists. They share a shape but not a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactList {
    Commerciale,
    Prospection,
}

impl ContactList {
    pub fn table(self) -> &'static str {
        match self {
            ContactList::Commerciale => "actions_commerciales",
            ContactList::Prospection => "prospection_actions",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            ContactList::Commerciale => "/actions-commerciales",
            ContactList::Prospection => "/prospection",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ContactList::Commerciale => "Actions commerciales",
            ContactList::Prospection => "Prospection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactStatut {
    AContacter,
    Contacte,
}

impl ContactStatut {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatut::AContacter => "a_contacter",
            ContactStatut::Contacte => "contacte",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "a_contacter" => Some(ContactStatut::AContacter),
            "contacte" => Some(ContactStatut::Contacte),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContactStatut::AContacter => "À contacter",
            ContactStatut::Contacte => "Contacté",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactAction {
    pub id: String,
    pub nom_contact: String,
    pub entreprise: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub responsable: String,
    pub statut: ContactStatut,
    pub commentaire: Option<String>,
    pub date_contact: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ContactAction {
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        match self.statut {
            ContactStatut::AContacter => {
                self.statut = ContactStatut::Contacte;
                self.date_contact = Some(now);
            }
            ContactStatut::Contacte => {
                self.statut = ContactStatut::AContacter;
                self.date_contact = None;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContactAction {
    pub nom_contact: String,
    pub entreprise: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub responsable: String,
    pub commentaire: Option<String>,
}

impl NewContactAction {
    pub fn validate(mut self) -> Result<Self, ServerError> {
        self.nom_contact = self.nom_contact.trim().to_string();
        self.responsable = self.responsable.trim().to_string();
        if self.nom_contact.is_empty() {
            return Err(ServerError::Validation("Le nom du contact est obligatoire".into()));
        }
        if self.responsable.is_empty() {
            return Err(ServerError::Validation("Un responsable est obligatoire".into()));
        }
        self.entreprise = clean(self.entreprise.as_deref());
        self.telephone = clean(self.telephone.as_deref());
        self.email = clean(self.email.as_deref());
        self.commentaire = clean(self.commentaire.as_deref());
        Ok(self)
    }
}
