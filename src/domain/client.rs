// src/domain/client.rs

use chrono::{DateTime, Utc};

use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub id: String,
    pub civilite: Option<String>,
    pub nom: String,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub code_postal: Option<String>,
    pub ville: Option<String>,
    pub extrabat_id: Option<String>,
    pub ltv_actif: bool,
    pub ltv_date_inscription: Option<DateTime<Utc>>,
    pub ltv_score: i64,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn display_name(&self) -> String {
        match self.prenom.as_deref() {
            Some(p) if !p.is_empty() => format!("{} {}", p, self.nom),
            _ => self.nom.clone(),
        }
    }

    pub fn full_address(&self) -> String {
        [
            self.adresse.as_deref(),
            self.code_postal.as_deref(),
            self.ville.as_deref(),
        ]
        .iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Contact fields shared by every client-creating form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFields {
    pub civilite: Option<String>,
    pub nom: String,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub code_postal: Option<String>,
    pub ville: Option<String>,
}

/// Trims and turns blank strings into `None`.
pub fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ContactFields {
    /// Full prospect form: only the name is mandatory.
    pub fn validate_prospect(mut self) -> Result<Self, ServerError> {
        self.nom = self.nom.trim().to_string();
        if self.nom.is_empty() {
            return Err(ServerError::Validation("Le nom est obligatoire".into()));
        }
        Ok(self)
    }

    /// Quick entry: a name plus one way to call back.
    pub fn validate_quick_entry(self) -> Result<Self, ServerError> {
        let fields = self.validate_prospect()?;
        if fields.telephone.is_none() && fields.email.is_none() {
            return Err(ServerError::Validation(
                "Un téléphone ou un email est obligatoire".into(),
            ));
        }
        Ok(fields)
    }

    /// Completion form: everything the ERP needs to hold the client record.
    pub fn validate_completion(self) -> Result<Self, ServerError> {
        let fields = self.validate_prospect()?;
        let mut missing = Vec::new();
        if fields.adresse.is_none() {
            missing.push("adresse");
        }
        if fields.code_postal.is_none() {
            missing.push("code postal");
        }
        if fields.ville.is_none() {
            missing.push("ville");
        }
        if fields.telephone.is_none() && fields.email.is_none() {
            missing.push("téléphone ou email");
        }
        if !missing.is_empty() {
            return Err(ServerError::Validation(format!(
                "Champs obligatoires manquants : {}",
                missing.join(", ")
            )));
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(nom: &str) -> ContactFields {
        ContactFields {
            nom: nom.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(named("").validate_prospect().is_err());
        assert!(named("   \t").validate_prospect().is_err());
    }

    #[test]
    fn name_is_trimmed() {
        let f = named("  Durand ").validate_prospect().unwrap();
        assert_eq!(f.nom, "Durand");
    }

    #[test]
    fn quick_entry_needs_a_contact_channel() {
        assert!(named("Durand").validate_quick_entry().is_err());
        let mut f = named("Durand");
        f.telephone = Some("0600000000".into());
        assert!(f.validate_quick_entry().is_ok());
    }

    #[test]
    fn completion_lists_missing_fields() {
        let mut f = named("Durand");
        f.email = Some("d@example.com".into());
        f.ville = Some("Lyon".into());
        let err = f.validate_completion().unwrap_err().to_string();
        assert!(err.contains("adresse"));
        assert!(err.contains("code postal"));
        assert!(!err.contains("ville"));
    }

    #[test]
    fn clean_drops_blank_values() {
        assert_eq!(clean(Some("  ")), None);
        assert_eq!(clean(Some(" a ")), Some("a".to_string()));
        assert_eq!(clean(None), None);
    }
}
