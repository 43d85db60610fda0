use crate::domain::chantier::Jalon;
use crate::domain::client::{clean, ContactFields};
use crate::domain::contact_action::{ContactList, ContactStatut, NewContactAction};
use crate::domain::dates::{datetime_input_value, parse_date_input};
use crate::domain::intervention::{validate_rows, InterventionRow, RowError};
use crate::domain::ltv::LtvStatut;
use crate::erp::{ClientCodes, ParamKind, ParamOption};
use crate::errors::ServerError;
use crate::mailer::MailKind;
use crate::responses::{html_response, html_with_status, redirect, text_response, ResultResp};
use crate::spreadsheets::export_chantiers_xlsx;
use crate::state::AppState;
use crate::templates::pages;
use crate::workflows::contact_actions::ContactFilter;
use crate::workflows::ltv::ActionEdit;
use crate::workflows::pipeline::{NewProspect, StatusChange};
use crate::workflows::{chantier, client_dashboard, contact_actions, ltv, pipeline, planning};
use astra::Request;
use chrono::Utc;
use std::io::Read;

const MAX_BODY: u64 = 256 * 1024;
const MAX_ROWS: usize = 50;

pub fn handle(mut req: Request, app: &AppState) -> ResultResp {
    let now = Utc::now();
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = Form::parse(req.uri().query().unwrap_or_default().as_bytes());
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    tracing::debug!(%method, %path, "request");

    match (method.as_str(), segments.as_slice()) {
        ("GET", []) => {
            let columns = pipeline::overview(&app.db, now)?;
            html_response(pages::pipeline_page(&columns, &pipeline::status_choices()))
        }
        ("GET", ["health"]) => text_response("ok"),

        // pipeline
        ("POST", ["prospects"]) => {
            let form = read_form(&mut req)?;
            let prospect = NewProspect {
                fields: contact_fields(&form),
                titre: form.opt("titre"),
                description: form.opt("description"),
                montant_estime: parse_amount(form.get("montant_estime"))?,
            };
            pipeline::create_prospect(&app.db, prospect, now)?;
            redirect("/")
        }
        ("POST", ["prospects", "rapide"]) => {
            let form = read_form(&mut req)?;
            let titre = form.opt("titre");
            pipeline::quick_entry(&app.db, contact_fields(&form), titre.as_deref(), now)?;
            redirect("/")
        }
        ("POST", ["opportunites", id, "statut"]) => {
            let form = read_form(&mut req)?;
            match pipeline::set_status(&app.db, id, form.get("statut").unwrap_or_default(), now)? {
                StatusChange::Applied => redirect("/"),
                StatusChange::NeedsCompletion => completion_form(
                    app,
                    id,
                    None,
                    Some("Complétez la fiche client avant de passer l'opportunité en gagné.".into()),
                    409,
                ),
            }
        }
        ("GET", ["opportunites", id, "completion"]) => {
            completion_form(app, id, query.opt("q"), None, 200)
        }
        ("POST", ["opportunites", id, "completion"]) => {
            let form = read_form(&mut req)?;
            let existing = form.opt("extrabat_id");
            let codes = ClientCodes {
                origine_id: form.opt("origine_id"),
                type_adresse_id: form.opt("type_adresse_id"),
                type_telephone_id: form.opt("type_telephone_id"),
            };
            match pipeline::complete_and_win(app, id, contact_fields(&form), &codes, existing.as_deref(), now) {
                Ok(()) => redirect("/chantiers"),
                Err(ServerError::Validation(msg)) => completion_form(app, id, None, Some(msg), 400),
                Err(e) => Err(e),
            }
        }
        ("POST", ["opportunites", id, "interactions"]) => {
            let form = read_form(&mut req)?;
            pipeline::log_interaction(
                &app.db,
                id,
                form.get("kind").unwrap_or_default(),
                form.get("contenu").unwrap_or_default(),
                now,
            )?;
            redirect(&back(&req, "/"))
        }

        // worksites
        ("GET", ["chantiers"]) => html_response(pages::chantiers_page(&chantier::tracker(&app.db)?)),
        ("GET", ["chantiers", "export.xlsx"]) => {
            export_chantiers_xlsx(&chantier::tracker(&app.db)?, now)
        }
        ("POST", ["chantiers", id, "jalons", slug]) => {
            let jalon = Jalon::parse(slug).ok_or(ServerError::NotFound)?;
            match chantier::toggle_milestone(&app.db, id, jalon, now)? {
                chantier::MilestoneOutcome::OpenScheduling => {
                    redirect(&format!("/chantiers/{id}/planification"))
                }
                _ => redirect("/chantiers"),
            }
        }
        ("POST", ["chantiers", id, "dates", slug]) => {
            let jalon = Jalon::parse(slug).ok_or(ServerError::NotFound)?;
            let form = read_form(&mut req)?;
            chantier::set_milestone_date(&app.db, id, jalon, form.get("date").unwrap_or_default())?;
            redirect("/chantiers")
        }
        ("GET", ["chantiers", id, "planification"]) => {
            // a stale technician list still lets the page render
            if let Err(e) = planning::sync_employes(app) {
                tracing::warn!(error = %e, "employee sync failed");
            }
            let ctx = planning::context(app, id)?;
            let mut rows: Vec<InterventionRow> = ctx
                .interventions
                .iter()
                .map(|i| InterventionRow {
                    debut: datetime_input_value(i.date_debut),
                    fin: datetime_input_value(i.date_fin),
                    techniciens: i.techniciens.iter().map(|t| t.employe_id.clone()).collect(),
                    notes: i.notes.clone().unwrap_or_default(),
                })
                .collect();
            let wanted = query
                .get("rows")
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0)
                .min(MAX_ROWS);
            if rows.len() < wanted {
                rows.resize_with(wanted, InterventionRow::default);
            }
            html_response(planning_form(ctx, rows, Vec::new(), None))
        }
        ("POST", ["chantiers", id, "planification"]) => {
            let form = read_form(&mut req)?;
            let rows = intervention_rows(&form);
            let description = form.opt("description");
            let ctx = planning::context(app, id)?;
            match validate_rows(&rows, &planning::bookable_ids(&ctx)) {
                Ok(planned) => {
                    planning::submit(app, id, &planned, description.as_deref(), now)?;
                    redirect("/chantiers")
                }
                Err(errors) => html_with_status(400, planning_form(ctx, rows, errors, description)),
            }
        }
        ("POST", ["employes", "sync"]) => {
            planning::sync_employes(app)?;
            redirect(&back(&req, "/chantiers"))
        }

        // LTV programme
        ("GET", ["ltv"]) => html_response(pages::ltv_page(&ltv::board(&app.db, now)?)),
        ("POST", ["ltv", "actions", id, "toggle"]) => {
            ltv::toggle_action(&app.db, id, now)?;
            redirect(&back(&req, "/ltv"))
        }
        ("POST", ["ltv", "actions", id]) => {
            let form = read_form(&mut req)?;
            ltv::edit_action(&app.db, id, action_edit(&form)?, now)?;
            redirect(&back(&req, "/ltv"))
        }
        ("POST", ["clients", id, "ltv"]) => {
            ltv::enroll_manually(&app.db, id, now)?;
            redirect(&back(&req, "/ltv"))
        }
        ("POST", ["clients", id, "envoyer", modele]) => {
            let kind = MailKind::parse(modele).ok_or(ServerError::NotFound)?;
            ltv::send_message(app, id, kind)?;
            redirect(&back(&req, "/ltv"))
        }

        ("GET", ["dashboard-client", extrabat_id]) => {
            let dashboard = client_dashboard::load(app, extrabat_id, now)?;
            html_response(pages::client_dashboard_page(&dashboard))
        }

        // contact lists
        ("GET", [list]) if contact_list(list).is_some() => {
            let list = contact_list(list).ok_or(ServerError::NotFound)?;
            let filter = ContactFilter {
                responsable: query.opt("responsable"),
                statut: query.get("statut").and_then(ContactStatut::parse),
            };
            let actions = contact_actions::list(&app.db, list, &filter)?;
            html_response(pages::contact_actions_page(list, &filter, &actions))
        }
        ("POST", [list]) if contact_list(list).is_some() => {
            let list = contact_list(list).ok_or(ServerError::NotFound)?;
            let form = read_form(&mut req)?;
            let new = NewContactAction {
                nom_contact: form.get("nom_contact").unwrap_or_default().to_string(),
                entreprise: form.opt("entreprise"),
                telephone: form.opt("telephone"),
                email: form.opt("email"),
                responsable: form.get("responsable").unwrap_or_default().to_string(),
                commentaire: form.opt("commentaire"),
            };
            contact_actions::create(&app.db, list, new, now)?;
            redirect(list.path())
        }
        ("POST", [list, id, "toggle"]) if contact_list(list).is_some() => {
            let list = contact_list(list).ok_or(ServerError::NotFound)?;
            contact_actions::toggle(&app.db, list, id, now)?;
            redirect(list.path())
        }

        _ => Err(ServerError::NotFound),
    }
}

fn contact_list(segment: &str) -> Option<ContactList> {
    [ContactList::Commerciale, ContactList::Prospection]
        .into_iter()
        .find(|l| l.path().trim_start_matches('/') == segment)
}

/// Decoded urlencoded pairs. Keys may repeat (checkbox groups).
struct Form(Vec<(String, String)>);

impl Form {
    fn parse(bytes: &[u8]) -> Self {
        Form(url::form_urlencoded::parse(bytes).into_owned().collect())
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed value, `None` when blank.
    fn opt(&self, key: &str) -> Option<String> {
        clean(self.get(key))
    }

    fn get_all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

fn read_form(req: &mut Request) -> Result<Form, ServerError> {
    let mut bytes = Vec::new();
    req.body_mut()
        .reader()
        .take(MAX_BODY)
        .read_to_end(&mut bytes)
        .map_err(|e| ServerError::BadRequest(format!("unreadable form body: {e}")))?;
    Ok(Form::parse(&bytes))
}

/// Path of the page that posted the form, when it is one of ours.
fn back(req: &Request, fallback: &str) -> String {
    req.headers()
        .get("Referer")
        .and_then(|v| v.to_str().ok())
        .and_then(|r| url::Url::parse(r).ok())
        .map(|u| match u.query() {
            Some(q) => format!("{}?{q}", u.path()),
            None => u.path().to_string(),
        })
        .unwrap_or_else(|| fallback.to_string())
}

fn contact_fields(form: &Form) -> ContactFields {
    ContactFields {
        civilite: form.opt("civilite"),
        nom: form.get("nom").unwrap_or_default().to_string(),
        prenom: form.opt("prenom"),
        email: form.opt("email"),
        telephone: form.opt("telephone"),
        adresse: form.opt("adresse"),
        code_postal: form.opt("code_postal"),
        ville: form.opt("ville"),
    }
}

fn parse_amount(raw: Option<&str>) -> Result<Option<f64>, ServerError> {
    match clean(raw) {
        None => Ok(None),
        Some(s) => s
            .replace(',', ".")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ServerError::Validation(format!("Montant invalide : {s}"))),
    }
}

fn action_edit(form: &Form) -> Result<ActionEdit, ServerError> {
    let statut = form
        .get("statut")
        .and_then(LtvStatut::parse)
        .ok_or_else(|| ServerError::Validation("Statut inconnu".into()))?;
    let date_echeance = match form.opt("date_echeance") {
        None => None,
        Some(raw) => Some(
            parse_date_input(&raw)
                .ok_or_else(|| ServerError::Validation(format!("Date invalide : {raw}")))?,
        ),
    };
    let nombre_parrainages = match form.opt("nombre_parrainages") {
        None => 0,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ServerError::Validation(format!("Nombre invalide : {raw}")))?,
    };
    Ok(ActionEdit {
        statut,
        commentaire: form.opt("commentaire"),
        date_echeance,
        nombre_parrainages,
    })
}

fn intervention_rows(form: &Form) -> Vec<InterventionRow> {
    let count = form
        .get("rows")
        .and_then(|n| n.trim().parse::<usize>().ok())
        .unwrap_or(0)
        .min(MAX_ROWS);
    (0..count)
        .map(|i| InterventionRow {
            debut: form.get(&format!("debut_{i}")).unwrap_or_default().to_string(),
            fin: form.get(&format!("fin_{i}")).unwrap_or_default().to_string(),
            techniciens: form.get_all(&format!("techniciens_{i}")),
            notes: form.get(&format!("notes_{i}")).unwrap_or_default().to_string(),
        })
        .collect()
}

fn planning_form(
    ctx: planning::PlanningContext,
    rows: Vec<InterventionRow>,
    errors: Vec<RowError>,
    description: Option<String>,
) -> maud::Markup {
    let description = description
        .or_else(|| ctx.chantier.description_probleme.clone())
        .unwrap_or_default();
    pages::planning_page(&pages::PlanningVm {
        chantier: ctx.chantier,
        client: ctx.client,
        employes: ctx.employes,
        rows,
        errors,
        description,
    })
}

/// Completion form with ERP matches for `query` (defaults to the client's name).
/// ERP lookups here are optional: failures are shown or skipped, never fatal.
fn completion_form(
    app: &AppState,
    opportunite_id: &str,
    query: Option<String>,
    message: Option<String>,
    status: u16,
) -> ResultResp {
    let (opportunite, client) = pipeline::completion_context(&app.db, opportunite_id)?;
    let query = query.unwrap_or_else(|| client.nom.clone());

    let matches = if query.is_empty() {
        Ok(Vec::new())
    } else {
        app.erp.search_clients(&query).map_err(|e| {
            tracing::warn!(error = %e, "ERP client search failed");
            e.to_string()
        })
    };
    let lookup = |kind: ParamKind| -> Vec<ParamOption> {
        app.erp.parameters(kind).unwrap_or_else(|e| {
            tracing::warn!(?kind, error = %e, "parameter lookup failed");
            Vec::new()
        })
    };
    let params = pages::CompletionParams {
        civilites: lookup(ParamKind::Civilites),
        origines: lookup(ParamKind::OriginesContact),
        types_adresse: lookup(ParamKind::TypesAdresse),
        types_telephone: lookup(ParamKind::TypesTelephone),
    };

    let vm = pages::CompletionVm {
        opportunite,
        client,
        query,
        matches,
        params,
        message,
    };
    html_with_status(status, pages::completion_page(&vm))
}
