use crate::db::interactions::INTERACTION_KINDS;
use crate::domain::client::Client;
use crate::domain::opportunity::Opportunite;
use crate::erp::{ErpClient, ParamOption};
use crate::templates::components::{select, submit_button, text_input};
use crate::templates::{card, desktop_layout, error_panel};
use crate::workflows::pipeline::{PipelineColumn, PipelineRow};
use maud::{html, Markup};

pub fn pipeline_page(columns: &[PipelineColumn], choices: &[(String, String)]) -> Markup {
    desktop_layout(
        "Pipeline",
        "/",
        html! {
            h1 { "Pipeline commercial" }
            div class="columns" {
                @for column in columns {
                    div id={ "col-" (column.key) } {
                        h3 { (column.label) " " span class="muted" { "(" (column.rows.len()) ")" } }
                        @for row in &column.rows {
                            (opportunity_card(row, choices))
                        }
                    }
                }
            }
            (card("Saisie rapide", None, quick_entry_form()))
            (card("Nouveau prospect", None, prospect_form()))
        },
    )
}

fn opportunity_card(row: &PipelineRow, choices: &[(String, String)]) -> Markup {
    let opp = &row.opportunite;
    html! {
        section class="card" {
            strong { (opp.titre) }
            p {
                (row.client.display_name())
                @if let Some(id) = &row.client.extrabat_id {
                    " · " a href={ "/dashboard-client/" (id) } { "fiche" }
                }
            }
            @if let Some(m) = opp.montant_estime {
                p class="muted" { (format!("{m:.0} €")) }
            }
            p class="muted" {
                @match row.days_since_contact {
                    Some(d) => { "Dernier échange il y a " (d) " j" },
                    None => { "Aucun échange" },
                }
            }
            @if opp.saisie_rapide && row.client.extrabat_id.is_none() {
                p { a href={ "/opportunites/" (opp.id) "/completion" } { "Compléter la fiche" } }
            }
            form method="post" action={ "/opportunites/" (opp.id) "/statut" } {
                (select("Statut", "statut", choices, Some(opp.statut.as_str())))
                (submit_button("Appliquer"))
            }
            details {
                summary { "Noter un échange" }
                form method="post" action={ "/opportunites/" (opp.id) "/interactions" } {
                    select name="kind" {
                        @for (value, label) in INTERACTION_KINDS {
                            option value=(value) { (label) }
                        }
                    }
                    textarea name="contenu" required {}
                    (submit_button("Enregistrer"))
                }
            }
        }
    }
}

fn contact_inputs(values: Option<&Client>) -> Markup {
    html! {
        (text_input("Nom", "nom", values.map(|c| c.nom.as_str()), true))
        (text_input("Prénom", "prenom", values.and_then(|c| c.prenom.as_deref()), false))
        (text_input("Email", "email", values.and_then(|c| c.email.as_deref()), false))
        (text_input("Téléphone", "telephone", values.and_then(|c| c.telephone.as_deref()), false))
        (text_input("Adresse", "adresse", values.and_then(|c| c.adresse.as_deref()), false))
        (text_input("Code postal", "code_postal", values.and_then(|c| c.code_postal.as_deref()), false))
        (text_input("Ville", "ville", values.and_then(|c| c.ville.as_deref()), false))
    }
}

fn quick_entry_form() -> Markup {
    html! {
        form method="post" action="/prospects/rapide" {
            (text_input("Nom", "nom", None, true))
            (text_input("Téléphone", "telephone", None, false))
            (text_input("Email", "email", None, false))
            (text_input("Projet", "titre", None, false))
            (submit_button("Créer"))
        }
    }
}

fn prospect_form() -> Markup {
    html! {
        form method="post" action="/prospects" {
            (contact_inputs(None))
            (text_input("Projet", "titre", None, false))
            label { "Description" textarea name="description" {} }
            label { "Montant estimé" input type="number" step="0.01" name="montant_estime"; }
            (submit_button("Créer le prospect"))
        }
    }
}

pub struct CompletionVm {
    pub opportunite: Opportunite,
    pub client: Client,
    pub query: String,
    /// ERP search results; the error is shown inline.
    pub matches: Result<Vec<ErpClient>, String>,
    pub params: CompletionParams,
    pub message: Option<String>,
}

/// ERP reference lists for the create form. An unavailable list is empty.
#[derive(Default)]
pub struct CompletionParams {
    pub civilites: Vec<ParamOption>,
    pub origines: Vec<ParamOption>,
    pub types_adresse: Vec<ParamOption>,
    pub types_telephone: Vec<ParamOption>,
}

fn by_id(options: &[ParamOption]) -> Vec<(String, String)> {
    options.iter().map(|o| (o.id.clone(), o.libelle.clone())).collect()
}

pub fn completion_page(vm: &CompletionVm) -> Markup {
    let base = format!("/opportunites/{}/completion", vm.opportunite.id);
    let civilites: Vec<(String, String)> = vm
        .params
        .civilites
        .iter()
        .map(|c| (c.libelle.clone(), c.libelle.clone()))
        .collect();

    desktop_layout(
        "Compléter la fiche client",
        "/",
        html! {
            h1 { "Compléter la fiche : " (vm.client.display_name()) }
            p class="muted" { (vm.opportunite.titre) }
            @if let Some(msg) = &vm.message {
                p class="warning" { (msg) }
            }

            section class="card" {
                h2 { "Rechercher dans Extrabat" }
                form method="get" action=(base) {
                    input type="search" name="q" value=(vm.query);
                    (submit_button("Rechercher"))
                }
                @match &vm.matches {
                    Ok(found) if found.is_empty() && !vm.query.is_empty() => {
                        p class="muted" { "Aucun résultat" }
                    },
                    Ok(found) => {
                        @for c in found {
                            form method="post" action=(base) {
                                input type="hidden" name="extrabat_id" value=(c.id);
                                input type="hidden" name="nom" value=(c.nom);
                                @if let Some(p) = &c.prenom { input type="hidden" name="prenom" value=(p); }
                                @if let Some(e) = &c.email { input type="hidden" name="email" value=(e); }
                                @if let Some(t) = &c.telephone { input type="hidden" name="telephone" value=(t); }
                                @if let Some(a) = &c.adresse { input type="hidden" name="adresse" value=(a); }
                                @if let Some(cp) = &c.code_postal { input type="hidden" name="code_postal" value=(cp); }
                                @if let Some(v) = &c.ville { input type="hidden" name="ville" value=(v); }
                                (c.display_name()) " "
                                (submit_button("Lier ce client"))
                            }
                        }
                    },
                    Err(e) => { (error_panel(e, &base)) },
                }
            }

            (card("Créer le client dans Extrabat", None, html! {
                form method="post" action=(base) {
                    (select("Civilité", "civilite", &civilites, vm.client.civilite.as_deref()))
                    (contact_inputs(Some(&vm.client)))
                    @if !vm.params.origines.is_empty() {
                        (select("Origine du contact", "origine_id", &by_id(&vm.params.origines), None))
                    }
                    @if !vm.params.types_adresse.is_empty() {
                        (select("Type d'adresse", "type_adresse_id", &by_id(&vm.params.types_adresse), None))
                    }
                    @if !vm.params.types_telephone.is_empty() {
                        (select("Type de téléphone", "type_telephone_id", &by_id(&vm.params.types_telephone), None))
                    }
                    (submit_button("Créer et passer en gagné"))
                }
            }))
        },
    )
}
