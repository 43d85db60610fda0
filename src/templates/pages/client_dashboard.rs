use crate::domain::dates::{format_date, format_datetime};
use crate::templates::components::{score_badge, submit_button};
use crate::templates::pages::ltv::{actions_list, message_buttons};
use crate::templates::{card, desktop_layout, error_panel};
use crate::workflows::client_dashboard::ClientDashboard;
use maud::{html, Markup};

pub fn client_dashboard_page(d: &ClientDashboard) -> Markup {
    let retry = format!("/dashboard-client/{}", d.erp_client.id);
    let client = &d.client;

    desktop_layout(
        &client.display_name(),
        "",
        html! {
            h1 { (client.display_name()) }
            @if d.materialized {
                p class="muted" { "Fiche locale créée depuis Extrabat." }
            }
            p {
                @if let Some(e) = &client.email { (e) " · " }
                @if let Some(t) = &client.telephone { (t) " · " }
                (client.full_address())
            }
            p class="muted" {
                @match d.days_since_contact {
                    Some(n) => { "Dernier échange il y a " (n) " jours" },
                    None => { "Aucun échange enregistré" },
                }
            }

            section class="card" {
                h2 { "Programme LTV" }
                @if client.ltv_actif {
                    (score_badge(client.ltv_score))
                    @if let Some(n) = d.days_in_programme {
                        p class="muted" { "Inscrit depuis " (n) " jours" }
                    }
                    @if d.needs_follow_up {
                        p class="warning" { "Relance à prévoir" }
                    }
                    (actions_list(&d.actions))
                } @else {
                    form method="post" action={ "/clients/" (client.id) "/ltv" } {
                        (submit_button("Inscrire au programme"))
                    }
                }
                (message_buttons(&client.id))
            }

            section class="card" {
                h2 { "Documents Extrabat" }
                @match &d.documents {
                    Ok(docs) => {
                        @for (kind, list) in docs.sections() {
                            h3 { (kind.label()) " (" (list.len()) ")" }
                            @if !list.is_empty() {
                                table {
                                    @for doc in list {
                                        tr {
                                            td { (format_date(doc.date)) }
                                            td { (doc.libelle) }
                                            td class="muted" { (doc.dossier) }
                                            td { @if let Some(m) = doc.montant { (format!("{m:.2} €")) } }
                                        }
                                    }
                                }
                            }
                        }
                    },
                    Err(e) => { (error_panel(&format!("Documents indisponibles : {e}"), &retry)) },
                }
            }

            (card("Opportunités", Some(d.opportunites.len()), html! {
                ul {
                    @for o in &d.opportunites {
                        li {
                            (o.titre) " "
                            span class="muted" { (o.current().as_str()) }
                        }
                    }
                }
            }))

            (card("Chantiers", Some(d.chantiers.len()), html! {
                ul {
                    @for c in &d.chantiers {
                        li {
                            a href={ "/chantiers/" (c.id) "/planification" } { (c.progress_percent()) " %" }
                            " " span class="muted" { (c.statut.as_str()) }
                        }
                    }
                }
            }))

            (card("Échanges", Some(d.interactions.len()), html! {
                ul {
                    @for i in &d.interactions {
                        li { (format_datetime(i.date_interaction)) " · " strong { (i.kind) } " " (i.contenu) }
                    }
                }
            }))
        },
    )
}
