use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::client::ContactFields;
use crate::erp::ErpError;

// client
//  ├── id                          (number or string)
//  ├── civilite                    (string, or { libelle })
//  ├── nom | raisonSociale
//  ├── prenom
//  ├── email | emails[].email
//  ├── telephone | telephones[].number
//  └── adresses[]
//       ├── description
//       ├── codePostal
//       └── ville
//
// Older accounts return the address flat on the client (adresse, codePostal, ville).

/// Keys a dated ERP record may carry its date under, in lookup order.
pub const DATE_KEYS: [&str; 5] = ["date", "dateCreation", "date_creation", "createdAt", "created_at"];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErpClient {
    pub id: String,
    pub civilite: Option<String>,
    pub nom: String,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub code_postal: Option<String>,
    pub ville: Option<String>,
}

impl ErpClient {
    pub fn display_name(&self) -> String {
        match &self.prenom {
            Some(p) => format!("{} {p}", self.nom),
            None => self.nom.clone(),
        }
    }

    pub fn to_contact_fields(&self) -> ContactFields {
        ContactFields {
            civilite: self.civilite.clone(),
            nom: self.nom.clone(),
            prenom: self.prenom.clone(),
            email: self.email.clone(),
            telephone: self.telephone.clone(),
            adresse: self.adresse.clone(),
            code_postal: self.code_postal.clone(),
            ville: self.ville.clone(),
        }
    }
}

/// Payload for an agenda entry. One appointment per technician.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub utilisateur_id: String,
    pub client_id: Option<String>,
    pub objet: String,
    pub description: String,
    pub adresse: String,
    pub debut: DateTime<Utc>,
    pub fin: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Devis,
    Commande,
    Facture,
}

impl DocumentKind {
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Devis => "Devis",
            DocumentKind::Commande => "Commandes",
            DocumentKind::Facture => "Factures",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErpDocument {
    pub id: String,
    pub kind: DocumentKind,
    pub libelle: String,
    pub dossier: String,
    pub date: DateTime<Utc>,
    pub montant: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientDocuments {
    pub devis: Vec<ErpDocument>,
    pub commandes: Vec<ErpDocument>,
    pub factures: Vec<ErpDocument>,
}

impl ClientDocuments {
    pub fn extend(&mut self, docs: Vec<ErpDocument>) {
        for doc in docs {
            match doc.kind {
                DocumentKind::Devis => self.devis.push(doc),
                DocumentKind::Commande => self.commandes.push(doc),
                DocumentKind::Facture => self.factures.push(doc),
            }
        }
        for list in [&mut self.devis, &mut self.commandes, &mut self.factures] {
            list.sort_by(|a, b| b.date.cmp(&a.date));
        }
    }

    pub fn sections(&self) -> [(DocumentKind, &[ErpDocument]); 3] {
        [
            (DocumentKind::Devis, self.devis.as_slice()),
            (DocumentKind::Commande, self.commandes.as_slice()),
            (DocumentKind::Facture, self.factures.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub id: String,
    pub nom: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Civilites,
    OriginesContact,
    TypesAdresse,
    TypesTelephone,
    Utilisateurs,
}

impl ParamKind {
    pub fn path(self) -> &'static str {
        match self {
            ParamKind::Civilites => "v1/parametres/civilites",
            ParamKind::OriginesContact => "v1/parametres/origines-contact",
            ParamKind::TypesAdresse => "v1/parametres/types-adresse",
            ParamKind::TypesTelephone => "v1/parametres/types-telephone",
            ParamKind::Utilisateurs => "v1/utilisateurs",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamOption {
    pub id: String,
    pub libelle: String,
}

/// ERP reference codes picked on the completion form, sent with a new client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientCodes {
    pub origine_id: Option<String>,
    pub type_adresse_id: Option<String>,
    pub type_telephone_id: Option<String>,
}

/// An ERP user; only active ones can be booked as technicians.
#[derive(Debug, Clone, PartialEq)]
pub struct ErpUser {
    pub id: String,
    pub nom: String,
    pub prenom: Option<String>,
    pub actif: bool,
}

fn summarize(v: &Value) -> String {
    let raw = v.to_string();
    if raw.chars().count() > 120 {
        let head: String = raw.chars().take(120).collect();
        format!("{head}…")
    } else {
        raw
    }
}

fn text(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| text(v, k))
}

fn first_nested(v: &Value, list_key: &str, keys: &[&str]) -> Option<String> {
    v.get(list_key)?
        .as_array()?
        .iter()
        .find_map(|item| first_text(item, keys))
}

/// Accepts a bare array or an object wrapping one under any of `wrappers`.
fn as_list<'a>(v: &'a Value, wrappers: &[&str]) -> Result<&'a Vec<Value>, ErpError> {
    if let Some(items) = v.as_array() {
        return Ok(items);
    }
    wrappers
        .iter()
        .find_map(|k| v.get(*k).and_then(Value::as_array))
        .ok_or_else(|| ErpError::UnexpectedShape(format!("expected a list, got {}", summarize(v))))
}

pub fn parse_id(v: &Value) -> Result<String, ErpError> {
    first_text(v, &["id", "code"])
        .ok_or_else(|| ErpError::UnexpectedShape(format!("no id in {}", summarize(v))))
}

pub fn parse_client(v: &Value) -> Result<ErpClient, ErpError> {
    if !v.is_object() {
        return Err(ErpError::UnexpectedShape(format!(
            "client is not an object: {}",
            summarize(v)
        )));
    }

    let id = parse_id(v)?;
    let nom = first_text(v, &["nom", "raisonSociale", "raison_sociale"])
        .ok_or_else(|| ErpError::UnexpectedShape(format!("client {id} has no name")))?;

    let civilite = match v.get("civilite") {
        Some(c @ Value::Object(_)) => first_text(c, &["libelle", "label"]),
        _ => text(v, "civilite"),
    };

    let email = text(v, "email").or_else(|| first_nested(v, "emails", &["email", "adresse"]));
    let telephone = first_text(v, &["telephone", "portable"])
        .or_else(|| first_nested(v, "telephones", &["number", "numero"]));

    let first_address = v
        .get("adresses")
        .and_then(Value::as_array)
        .and_then(|a| a.first());
    let (adresse, code_postal, ville) = match first_address {
        Some(a) => (
            first_text(a, &["description", "adresse", "rue"]),
            first_text(a, &["codePostal", "cp"]),
            text(a, "ville"),
        ),
        None => (
            first_text(v, &["adresse", "rue"]),
            first_text(v, &["codePostal", "code_postal", "cp"]),
            text(v, "ville"),
        ),
    };

    Ok(ErpClient {
        id,
        civilite,
        nom,
        prenom: text(v, "prenom"),
        email,
        telephone,
        adresse,
        code_postal,
        ville,
    })
}

pub fn parse_client_list(v: &Value) -> Result<Vec<ErpClient>, ErpError> {
    as_list(v, &["data", "clients"])?
        .iter()
        .map(parse_client)
        .collect()
}

fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

/// Reads the record's date from the first key of [`DATE_KEYS`] that is present.
/// A record with no date, or an unreadable one, is an error.
pub fn parse_date(v: &Value) -> Result<DateTime<Utc>, ErpError> {
    for key in DATE_KEYS {
        if let Some(raw) = v.get(key).and_then(Value::as_str) {
            return parse_date_str(raw).ok_or_else(|| {
                ErpError::UnexpectedShape(format!("unreadable date {raw:?} under {key}"))
            });
        }
    }
    Err(ErpError::UnexpectedShape(format!(
        "no date under any of {DATE_KEYS:?} in {}",
        summarize(v)
    )))
}

fn fold(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Folder names are free text in the ERP.
pub fn classify_folder(name: &str) -> Option<DocumentKind> {
    let folded = fold(name);
    if folded.contains("devis") {
        Some(DocumentKind::Devis)
    } else if folded.contains("commande") || folded.contains("bdc") {
        Some(DocumentKind::Commande)
    } else if folded.contains("facture") {
        Some(DocumentKind::Facture)
    } else {
        None
    }
}

pub fn parse_folders(v: &Value) -> Result<Vec<Folder>, ErpError> {
    as_list(v, &["data", "dossiers"])?
        .iter()
        .map(|f| {
            Ok(Folder {
                id: parse_id(f)?,
                nom: first_text(f, &["libelle", "nom", "name"]).unwrap_or_default(),
            })
        })
        .collect()
}

fn parse_amount(v: &Value) -> Option<f64> {
    ["montantTTC", "montant_ttc", "montant"].iter().find_map(|k| match v.get(*k)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    })
}

pub fn parse_documents(
    kind: DocumentKind,
    folder: &Folder,
    v: &Value,
) -> Result<Vec<ErpDocument>, ErpError> {
    as_list(v, &["data", "documents"])?
        .iter()
        .map(|d| {
            Ok(ErpDocument {
                id: parse_id(d)?,
                kind,
                libelle: first_text(d, &["libelle", "nom", "titre", "name"])
                    .unwrap_or_else(|| folder.nom.clone()),
                dossier: folder.nom.clone(),
                date: parse_date(d)?,
                montant: parse_amount(d),
            })
        })
        .collect()
}

/// Users carry split names and an optional `actif` flag (missing means active).
pub fn parse_users(v: &Value) -> Result<Vec<ErpUser>, ErpError> {
    as_list(v, &["data", "utilisateurs"])?
        .iter()
        .map(|u| {
            let id = parse_id(u)?;
            let nom = first_text(u, &["nom", "libelle", "login"])
                .ok_or_else(|| ErpError::UnexpectedShape(format!("user {id} has no name")))?;
            let actif = match u.get("actif") {
                Some(Value::Bool(b)) => *b,
                Some(Value::Number(n)) => n.as_i64() != Some(0),
                _ => true,
            };
            Ok(ErpUser {
                id,
                nom,
                prenom: text(u, "prenom"),
                actif,
            })
        })
        .collect()
}

/// Parameter lists come back either as a list of records or as an `id -> label` map.
pub fn parse_options(v: &Value) -> Result<Vec<ParamOption>, ErpError> {
    if let Ok(items) = as_list(v, &["data"]) {
        return items
            .iter()
            .map(|item| {
                let id = parse_id(item)?;
                let libelle = first_text(item, &["libelle", "label"])
                    .or_else(|| {
                        let parts: Vec<String> = ["prenom", "nom"]
                            .iter()
                            .filter_map(|k| text(item, k))
                            .collect();
                        (!parts.is_empty()).then(|| parts.join(" "))
                    })
                    .ok_or_else(|| ErpError::UnexpectedShape(format!("option {id} has no label")))?;
                Ok(ParamOption { id, libelle })
            })
            .collect();
    }

    let map = v
        .as_object()
        .ok_or_else(|| ErpError::UnexpectedShape(format!("unexpected options {}", summarize(v))))?;
    map.iter()
        .map(|(id, label)| match label {
            Value::String(s) => Ok(ParamOption {
                id: id.clone(),
                libelle: s.clone(),
            }),
            other => Err(ErpError::UnexpectedShape(format!(
                "option {id} has label {}",
                summarize(other)
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_client_shape() {
        let v = json!({
            "id": 4512,
            "civilite": { "id": 1, "libelle": "M." },
            "nom": "Durand",
            "prenom": "Paul",
            "emails": [{ "email": "paul@durand.fr" }],
            "telephones": [{ "number": "0601020304" }],
            "adresses": [{ "description": "3 rue des Lilas", "codePostal": "69003", "ville": "Lyon" }]
        });
        let c = parse_client(&v).unwrap();
        assert_eq!(c.id, "4512");
        assert_eq!(c.civilite.as_deref(), Some("M."));
        assert_eq!(c.email.as_deref(), Some("paul@durand.fr"));
        assert_eq!(c.telephone.as_deref(), Some("0601020304"));
        assert_eq!(c.code_postal.as_deref(), Some("69003"));
        assert_eq!(c.display_name(), "Durand Paul");
    }

    #[test]
    fn parses_flat_client_shape() {
        let v = json!({
            "id": "A-9",
            "raisonSociale": "SCI Les Tilleuls",
            "email": "contact@tilleuls.fr",
            "adresse": "12 avenue Foch",
            "codePostal": "75016",
            "ville": "Paris"
        });
        let c = parse_client(&v).unwrap();
        assert_eq!(c.nom, "SCI Les Tilleuls");
        assert_eq!(c.adresse.as_deref(), Some("12 avenue Foch"));
        assert_eq!(c.prenom, None);
    }

    #[test]
    fn client_without_name_is_rejected() {
        let err = parse_client(&json!({ "id": 1 })).unwrap_err();
        assert!(matches!(err, ErpError::UnexpectedShape(_)));
    }

    #[test]
    fn date_falls_back_through_known_keys() {
        let d = parse_date(&json!({ "createdAt": "2024-03-05T10:00:00Z" })).unwrap();
        assert_eq!(d.to_rfc3339(), "2024-03-05T10:00:00+00:00");

        let d = parse_date(&json!({ "date_creation": "2024-03-05 08:30:00" })).unwrap();
        assert_eq!(d.format("%H:%M").to_string(), "08:30");

        let d = parse_date(&json!({ "date": "05/03/2024" })).unwrap();
        assert_eq!(d.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn missing_or_garbled_date_is_a_typed_error() {
        assert!(matches!(
            parse_date(&json!({ "libelle": "Devis 12" })),
            Err(ErpError::UnexpectedShape(_))
        ));
        assert!(matches!(
            parse_date(&json!({ "date": "hier" })),
            Err(ErpError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn folders_are_classified_ignoring_case_and_accents() {
        assert_eq!(classify_folder("DÉVIS signés"), Some(DocumentKind::Devis));
        assert_eq!(classify_folder("Bons de commande"), Some(DocumentKind::Commande));
        assert_eq!(classify_folder("BDC 2024"), Some(DocumentKind::Commande));
        assert_eq!(classify_folder("Factures"), Some(DocumentKind::Facture));
        assert_eq!(classify_folder("Photos chantier"), None);
    }

    #[test]
    fn documents_are_sorted_newest_first() {
        let folder = Folder {
            id: "9".into(),
            nom: "Factures".into(),
        };
        let docs = parse_documents(
            DocumentKind::Facture,
            &folder,
            &json!({ "data": [
                { "id": 1, "libelle": "F-001", "date": "2024-01-10", "montantTTC": "1 200,50" },
                { "id": 2, "date": "2024-02-10", "montant": 300 }
            ]}),
        )
        .unwrap();

        let mut all = ClientDocuments::default();
        all.extend(docs);
        assert_eq!(all.factures.len(), 2);
        assert_eq!(all.factures[0].id, "2");
        assert_eq!(all.factures[0].libelle, "Factures");
        assert_eq!(all.factures[0].montant, Some(300.0));
        // thousands separator is not understood
        assert_eq!(all.factures[1].montant, None);
    }

    #[test]
    fn options_accept_list_and_map_shapes() {
        let list = parse_options(&json!([{ "id": 1, "libelle": "M." }, { "id": 2, "libelle": "Mme" }])).unwrap();
        assert_eq!(list[1].libelle, "Mme");

        let users = parse_options(&json!({ "data": [{ "id": 7, "nom": "Martin", "prenom": "Léa" }] })).unwrap();
        assert_eq!(users[0].libelle, "Léa Martin");

        let map = parse_options(&json!({ "3": "Salon" })).unwrap();
        assert_eq!(map[0].id, "3");

        assert!(parse_options(&json!("nope")).is_err());
    }

    #[test]
    fn users_default_to_active() {
        let users = parse_users(&json!({ "data": [
            { "id": 7, "nom": "Martin", "prenom": "Léa" },
            { "id": 8, "nom": "Petit", "actif": 0 },
            { "id": 9, "libelle": "Atelier", "actif": true }
        ]}))
        .unwrap();
        assert_eq!(users.len(), 3);
        assert!(users[0].actif);
        assert_eq!(users[0].prenom.as_deref(), Some("Léa"));
        assert!(!users[1].actif);
        assert_eq!(users[2].nom, "Atelier");

        assert!(matches!(
            parse_users(&json!([{ "id": 3 }])),
            Err(ErpError::UnexpectedShape(_))
        ));
    }
}
