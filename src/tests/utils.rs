use crate::db::connection::{init_db, Database};
use crate::db::{chantiers, clients, opportunities};
use crate::domain::client::ContactFields;
use crate::erp::{
    Appointment, ClientCodes, ClientDocuments, ErpApi, ErpClient, ErpError, ErpUser, ParamKind,
    ParamOption,
};
use crate::mailer::{MailKind, MailRequest, MailSender, MailerError};
use crate::state::AppState;
use astra::{Body, Response};
use chrono::{DateTime, TimeZone, Utc};
use http::{Method, Request};
use std::collections::HashMap;
use std::io::Read;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Fixed clock for every test.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
}

/// A test database whose directory is removed on drop.
pub struct TestDb {
    db: Database,
    _dir: TempDir,
}

impl Deref for TestDb {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

/// App state over a [`TestDb`]; derefs to [`AppState`].
pub struct TestApp {
    app: AppState,
    _dir: TempDir,
}

impl Deref for TestApp {
    type Target = AppState;

    fn deref(&self) -> &AppState {
        &self.app
    }
}

impl DerefMut for TestApp {
    fn deref_mut(&mut self) -> &mut AppState {
        &mut self.app
    }
}

/// Initialize a fresh test DB using the production schema
pub fn init_test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("temp dir: {e}"));
    let path = dir.path().join("crm_test.sqlite");
    let db = Database::new(path.to_string_lossy().to_string());

    init_db(&db, "sql/schema.sql")
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    TestDb { db, _dir: dir }
}

pub fn fake_app(erp: FakeErp) -> TestApp {
    let TestDb { db, _dir } = init_test_db();
    TestApp {
        app: AppState {
            db,
            erp: Box::new(erp),
            mailer: Box::new(FakeMailer::default()),
        },
        _dir,
    }
}

/// Client with an email and an address but no phone, one won opportunity
/// and its worksite. Returns the worksite id.
pub fn seed_chantier(db: &Database) -> String {
    db.with_conn(|conn| {
        let fields = ContactFields {
            nom: "Moreau".into(),
            prenom: Some("Claire".into()),
            email: Some("claire.moreau@example.fr".into()),
            adresse: Some("18 rue Victor Hugo".into()),
            code_postal: Some("69002".into()),
            ville: Some("Lyon".into()),
            ..Default::default()
        };
        let client_id = clients::insert_client(conn, &fields, None, now())?;
        let opp_id = opportunities::insert_opportunite(
            conn,
            &opportunities::NewOpportunite {
                client_id: &client_id,
                titre: "Vidéosurveillance boutique",
                description: None,
                montant_estime: Some(4200.0),
                saisie_rapide: false,
            },
            now(),
        )?;
        chantiers::upsert_for_opportunity(conn, &opp_id, &client_id, now())?;
        let chantier = chantiers::find_by_opportunity(conn, &opp_id)?
            .ok_or(crate::errors::ServerError::NotFound)?;
        Ok(chantier.id)
    })
    .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, form: &[(&str, &str)]) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form)
        .finish();
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub fn body_string(mut resp: Response) -> String {
    let mut bytes = Vec::new();
    resp.body_mut().reader().read_to_end(&mut bytes).unwrap();
    String::from_utf8(bytes).unwrap()
}

#[derive(Default)]
struct FakeErpState {
    clients: HashMap<String, ErpClient>,
    users: Vec<ErpUser>,
    last_codes: Option<ClientCodes>,
    next_client: usize,
    created: usize,
    updated: usize,
    deleted: usize,
    failing: bool,
}

/// In-memory ERP. Clones share state so a test can inspect calls after
/// handing one to the app.
#[derive(Clone, Default)]
pub struct FakeErp {
    state: Arc<Mutex<FakeErpState>>,
}

impl FakeErp {
    /// Every call fails with a network error.
    pub fn failing() -> Self {
        let erp = Self::default();
        erp.state.lock().unwrap().failing = true;
        erp
    }

    pub fn with_client(self, id: &str, nom: &str) -> Self {
        self.state.lock().unwrap().clients.insert(
            id.to_string(),
            ErpClient {
                id: id.to_string(),
                nom: nom.to_string(),
                email: Some(format!("{}@example.fr", nom.to_lowercase())),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_user(self, id: &str, nom: &str, actif: bool) -> Self {
        self.state.lock().unwrap().users.push(ErpUser {
            id: id.to_string(),
            nom: nom.to_string(),
            prenom: None,
            actif,
        });
        self
    }

    /// Codes sent with the last created client.
    pub fn last_codes(&self) -> Option<ClientCodes> {
        self.state.lock().unwrap().last_codes.clone()
    }

    pub fn created(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn updated(&self) -> usize {
        self.state.lock().unwrap().updated
    }

    pub fn deleted(&self) -> usize {
        self.state.lock().unwrap().deleted
    }

    fn check(&self) -> Result<(), ErpError> {
        if self.state.lock().unwrap().failing {
            Err(ErpError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

impl ErpApi for FakeErp {
    fn search_clients(&self, query: &str) -> Result<Vec<ErpClient>, ErpError> {
        self.check()?;
        let q = query.to_lowercase();
        Ok(self
            .state
            .lock()
            .unwrap()
            .clients
            .values()
            .filter(|c| c.nom.to_lowercase().contains(&q))
            .cloned()
            .collect())
    }

    fn create_client(&self, fields: &ContactFields, codes: &ClientCodes) -> Result<String, ErpError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.next_client += 1;
        state.last_codes = Some(codes.clone());
        let id = format!("erp-{}", state.next_client);
        state.clients.insert(
            id.clone(),
            ErpClient {
                id: id.clone(),
                civilite: fields.civilite.clone(),
                nom: fields.nom.clone(),
                prenom: fields.prenom.clone(),
                email: fields.email.clone(),
                telephone: fields.telephone.clone(),
                adresse: fields.adresse.clone(),
                code_postal: fields.code_postal.clone(),
                ville: fields.ville.clone(),
            },
        );
        Ok(id)
    }

    fn get_client(&self, id: &str) -> Result<ErpClient, ErpError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .clients
            .get(id)
            .cloned()
            .ok_or_else(|| ErpError::NotFound(format!("client {id}")))
    }

    fn create_appointment(&self, _rdv: &Appointment) -> Result<String, ErpError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.created += 1;
        Ok(format!("rdv-{}", state.created))
    }

    fn update_appointment(&self, _id: &str, _rdv: &Appointment) -> Result<(), ErpError> {
        self.check()?;
        self.state.lock().unwrap().updated += 1;
        Ok(())
    }

    fn delete_appointment(&self, _id: &str) -> Result<(), ErpError> {
        self.check()?;
        self.state.lock().unwrap().deleted += 1;
        Ok(())
    }

    fn client_documents(&self, _client_id: &str) -> Result<ClientDocuments, ErpError> {
        self.check()?;
        Ok(ClientDocuments::default())
    }

    fn parameters(&self, kind: ParamKind) -> Result<Vec<ParamOption>, ErpError> {
        self.check()?;
        let labels: &[&str] = match kind {
            ParamKind::Civilites => &["M.", "Mme"],
            ParamKind::OriginesContact => &["Salon", "Recommandation"],
            ParamKind::TypesAdresse => &["Principale", "Chantier"],
            ParamKind::TypesTelephone => &["Mobile", "Fixe"],
            ParamKind::Utilisateurs => &[],
        };
        Ok(labels
            .iter()
            .enumerate()
            .map(|(i, l)| ParamOption {
                id: (i + 1).to_string(),
                libelle: l.to_string(),
            })
            .collect())
    }

    fn users(&self) -> Result<Vec<ErpUser>, ErpError> {
        self.check()?;
        Ok(self.state.lock().unwrap().users.clone())
    }
}

/// Records the hosted function names it was asked to call.
#[derive(Clone, Default)]
pub struct FakeMailer {
    sent: Arc<Mutex<Vec<String>>>,
}

impl FakeMailer {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailSender for FakeMailer {
    fn send(&self, kind: MailKind, _req: &MailRequest) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push(kind.function_name().to_string());
        Ok(())
    }
}

/// First column of the first row, for ids the routes don't echo back.
pub fn scalar(db: &Database, sql: &str) -> String {
    db.with_conn(|conn| Ok(conn.query_row(sql, [], |r| r.get::<_, String>(0))?))
        .unwrap()
}

pub fn count(db: &Database, table: &str) -> i64 {
    db.with_conn(|conn| {
        Ok(conn.query_row(&format!("select count(*) from {table}"), [], |r| r.get(0))?)
    })
    .unwrap()
}

pub fn location(resp: &Response) -> String {
    resp.headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
