// src/mailer.rs

use reqwest::blocking::Client;
use serde::Serialize;

use crate::config::FunctionsConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Missing recipient: {0}")]
    MissingRecipient(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
}

/// Transactional messages, one hosted function each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    AvisGoogle,
    Parrainage,
    ContratMaintenance,
    Telesurveillance,
    Ppms,
    Sms,
}

impl MailKind {
    pub const ALL: [MailKind; 6] = [
        MailKind::AvisGoogle,
        MailKind::Parrainage,
        MailKind::ContratMaintenance,
        MailKind::Telesurveillance,
        MailKind::Ppms,
        MailKind::Sms,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            MailKind::AvisGoogle => "avis-google",
            MailKind::Parrainage => "parrainage",
            MailKind::ContratMaintenance => "contrat-maintenance",
            MailKind::Telesurveillance => "telesurveillance",
            MailKind::Ppms => "ppms",
            MailKind::Sms => "sms",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == s)
    }

    pub fn function_name(self) -> &'static str {
        match self {
            MailKind::AvisGoogle => "send-avis-google-email",
            MailKind::Parrainage => "send-parrainage-email",
            MailKind::ContratMaintenance => "send-contrat-maintenance-email",
            MailKind::Telesurveillance => "send-telesurveillance-email",
            MailKind::Ppms => "send-ppms-email",
            MailKind::Sms => "send-sms-notification",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MailKind::AvisGoogle => "Demande d'avis Google",
            MailKind::Parrainage => "Programme de parrainage",
            MailKind::ContratMaintenance => "Contrat de maintenance",
            MailKind::Telesurveillance => "Télésurveillance",
            MailKind::Ppms => "PPMS",
            MailKind::Sms => "SMS",
        }
    }

    /// SMS goes to a phone number, everything else to an email address.
    pub fn is_sms(self) -> bool {
        matches!(self, MailKind::Sms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailRequest {
    pub to: String,
    pub nom: String,
    pub prenom: Option<String>,
}

impl MailRequest {
    /// Fails when the recipient is absent or blank.
    pub fn new(
        kind: MailKind,
        to: Option<&str>,
        nom: &str,
        prenom: Option<&str>,
    ) -> Result<Self, MailerError> {
        let to = to.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
            MailerError::MissingRecipient(if kind.is_sms() {
                "aucun numéro de téléphone".to_string()
            } else {
                "aucune adresse email".to_string()
            })
        })?;

        Ok(Self {
            to: to.to_string(),
            nom: nom.to_string(),
            prenom: prenom.map(str::to_string),
        })
    }
}

pub trait MailSender: Send + Sync {
    fn send(&self, kind: MailKind, req: &MailRequest) -> Result<(), MailerError>;
}

pub struct MailFunctions {
    base_url: String,
    api_key: String,
    client: Client,
}

impl MailFunctions {
    pub fn new(config: &FunctionsConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            client: Client::new(),
        }
    }
}

impl MailSender for MailFunctions {
    fn send(&self, kind: MailKind, req: &MailRequest) -> Result<(), MailerError> {
        let url = format!("{}/{}", self.base_url, kind.function_name());

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let error_body = resp.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MailerError::ApiError(format!(
                "{} failed: {}",
                kind.function_name(),
                error_body
            )));
        }

        tracing::info!(function = kind.function_name(), "mail function called");
        Ok(())
    }
}
