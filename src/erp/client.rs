// client.rs
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::config::ErpConfig;
use crate::domain::client::ContactFields;
use crate::erp::models::{
    classify_folder, parse_client, parse_client_list, parse_documents, parse_folders, parse_id,
    parse_options, parse_users, Appointment, ClientCodes, ClientDocuments, ErpClient, ErpUser,
    ParamKind, ParamOption,
};
use crate::erp::ErpError;

const USER_AGENT: &str = concat!("crm_chantiers/", env!("CARGO_PKG_VERSION"));

/// Operations the CRM needs from the ERP.
pub trait ErpApi: Send + Sync {
    fn search_clients(&self, query: &str) -> Result<Vec<ErpClient>, ErpError>;
    /// Returns the new ERP client id.
    fn create_client(&self, fields: &ContactFields, codes: &ClientCodes) -> Result<String, ErpError>;
    fn get_client(&self, id: &str) -> Result<ErpClient, ErpError>;
    /// Returns the new appointment id.
    fn create_appointment(&self, rdv: &Appointment) -> Result<String, ErpError>;
    fn update_appointment(&self, id: &str, rdv: &Appointment) -> Result<(), ErpError>;
    fn delete_appointment(&self, id: &str) -> Result<(), ErpError>;
    fn client_documents(&self, client_id: &str) -> Result<ClientDocuments, ErpError>;
    fn parameters(&self, kind: ParamKind) -> Result<Vec<ParamOption>, ErpError>;
    fn users(&self) -> Result<Vec<ErpUser>, ErpError>;
}

pub struct ExtrabatClient {
    client: Client,
    base_url: String,
    api_key: String,
    security_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientPayload<'a> {
    civilite: Option<&'a str>,
    nom: &'a str,
    prenom: Option<&'a str>,
    email: Option<&'a str>,
    telephone: Option<&'a str>,
    adresse: Option<&'a str>,
    code_postal: Option<&'a str>,
    ville: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origine_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_adresse_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_telephone_id: Option<&'a str>,
}

impl<'a> ClientPayload<'a> {
    fn new(f: &'a ContactFields, codes: &'a ClientCodes) -> Self {
        Self {
            civilite: f.civilite.as_deref(),
            nom: &f.nom,
            prenom: f.prenom.as_deref(),
            email: f.email.as_deref(),
            telephone: f.telephone.as_deref(),
            adresse: f.adresse.as_deref(),
            code_postal: f.code_postal.as_deref(),
            ville: f.ville.as_deref(),
            origine_id: codes.origine_id.as_deref(),
            type_adresse_id: codes.type_adresse_id.as_deref(),
            type_telephone_id: codes.type_telephone_id.as_deref(),
        }
    }
}

impl ExtrabatClient {
    pub fn new(config: &ErpConfig) -> Result<Self, ErpError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ErpError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            security_key: config.security_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(%method, %url, "extrabat request");

        self.client
            .request(method, url)
            .header("X-EXTRABAT-API-KEY", &self.api_key)
            .header("X-EXTRABAT-SECURITY", &self.security_key)
    }

    /// Sends the request and decodes the body. An empty body decodes to `Null`.
    fn send(&self, req: RequestBuilder, what: &str) -> Result<Value, ErpError> {
        let resp = req.send().map_err(|e| ErpError::Network(e.to_string()))?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ErpError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ErpError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().map_err(|e| ErpError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ErpError::JsonParse(e.to_string()))
    }
}

impl ErpApi for ExtrabatClient {
    fn search_clients(&self, query: &str) -> Result<Vec<ErpClient>, ErpError> {
        let req = self.request(Method::GET, "v2/clients").query(&[("q", query)]);
        let v = self.send(req, "client search")?;
        parse_client_list(&v)
    }

    fn create_client(&self, fields: &ContactFields, codes: &ClientCodes) -> Result<String, ErpError> {
        let req = self
            .request(Method::POST, "v2/client")
            .json(&ClientPayload::new(fields, codes));
        let v = self.send(req, "client creation")?;
        parse_id(&v)
    }

    fn get_client(&self, id: &str) -> Result<ErpClient, ErpError> {
        let req = self.request(Method::GET, &format!("v2/client/{id}"));
        let v = self.send(req, &format!("client {id}"))?;
        parse_client(&v)
    }

    fn create_appointment(&self, rdv: &Appointment) -> Result<String, ErpError> {
        let req = self
            .request(Method::POST, "v1/agenda/rendez-vous")
            .json(rdv);
        let v = self.send(req, "appointment creation")?;
        parse_id(&v)
    }

    fn update_appointment(&self, id: &str, rdv: &Appointment) -> Result<(), ErpError> {
        let req = self
            .request(Method::PUT, &format!("v1/agenda/rendez-vous/{id}"))
            .json(rdv);
        self.send(req, &format!("appointment {id}"))?;
        Ok(())
    }

    fn delete_appointment(&self, id: &str) -> Result<(), ErpError> {
        let req = self.request(Method::DELETE, &format!("v1/agenda/rendez-vous/{id}"));
        self.send(req, &format!("appointment {id}"))?;
        Ok(())
    }

    fn client_documents(&self, client_id: &str) -> Result<ClientDocuments, ErpError> {
        let req = self.request(Method::GET, &format!("v2/client/{client_id}/dossiers"));
        let folders = parse_folders(&self.send(req, &format!("folders of client {client_id}"))?)?;

        let mut out = ClientDocuments::default();
        for folder in folders {
            let Some(kind) = classify_folder(&folder.nom) else {
                continue;
            };
            let req = self.request(Method::GET, &format!("v2/dossier/{}/documents", folder.id));
            let v = self.send(req, &format!("documents of folder {}", folder.id))?;
            out.extend(parse_documents(kind, &folder, &v)?);
        }
        Ok(out)
    }

    fn parameters(&self, kind: ParamKind) -> Result<Vec<ParamOption>, ErpError> {
        let req = self.request(Method::GET, kind.path());
        let v = self.send(req, kind.path())?;
        parse_options(&v)
    }

    fn users(&self) -> Result<Vec<ErpUser>, ErpError> {
        let path = ParamKind::Utilisateurs.path();
        let v = self.send(self.request(Method::GET, path), path)?;
        parse_users(&v)
    }
}
