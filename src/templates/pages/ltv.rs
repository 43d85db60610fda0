use crate::domain::dates::format_date;
use crate::domain::ltv::{group_by_categorie, LtvAction, LtvStatut};
use crate::mailer::MailKind;
use crate::templates::components::{score_badge, submit_button};
use crate::templates::desktop_layout;
use crate::workflows::ltv::LtvCard;
use maud::{html, Markup};

const STATUTS: [LtvStatut; 4] = [
    LtvStatut::AFaire,
    LtvStatut::EnCours,
    LtvStatut::Fait,
    LtvStatut::Refuse,
];

pub fn ltv_page(cards: &[LtvCard]) -> Markup {
    desktop_layout(
        "Programme LTV",
        "/ltv",
        html! {
            h1 { "Programme LTV" }
            @if cards.is_empty() {
                p class="muted" { "Aucun client inscrit." }
            }
            @for card in cards {
                (ltv_card(card))
            }
        },
    )
}

fn ltv_card(card: &LtvCard) -> Markup {
    let client = &card.client;
    html! {
        section class="card" id={ "client-" (client.id) } {
            h2 {
                @match &client.extrabat_id {
                    Some(id) => { a href={ "/dashboard-client/" (id) } { (client.display_name()) } },
                    None => { (client.display_name()) },
                }
            }
            (score_badge(client.ltv_score))
            @if card.needs_follow_up {
                p class="warning" { "Relance à prévoir" }
            }
            (actions_list(&card.actions))
            (message_buttons(&client.id))
        }
    }
}

pub fn actions_list(actions: &[LtvAction]) -> Markup {
    html! {
        @for (categorie, items) in group_by_categorie(actions) {
            h3 { (categorie.label()) }
            ul {
                @for a in items {
                    li {
                        form method="post" action={ "/ltv/actions/" (a.id) "/toggle" } style="display:inline" {
                            button type="submit" {
                                @if a.statut == LtvStatut::Fait { "☑" } @else { "☐" }
                            }
                        }
                        " " (a.nom) " "
                        span class="muted" {
                            (a.statut.label())
                            @if let Some(d) = a.date_action { " · " (format_date(d)) }
                            @if a.nombre_parrainages > 0 { " · " (a.nombre_parrainages) " parrainage(s)" }
                        }
                        details {
                            summary { "Modifier" }
                            (edit_form(a))
                        }
                    }
                }
            }
        }
    }
}

fn edit_form(a: &LtvAction) -> Markup {
    html! {
        form method="post" action={ "/ltv/actions/" (a.id) } {
            select name="statut" {
                @for s in STATUTS {
                    option value=(s.as_str()) selected[s == a.statut] { (s.label()) }
                }
            }
            label { "Échéance"
                input type="date" name="date_echeance"
                    value=[a.date_echeance.map(|d| d.format("%Y-%m-%d").to_string())];
            }
            label { "Parrainages"
                input type="number" min="0" name="nombre_parrainages" value=(a.nombre_parrainages);
            }
            label { "Commentaire"
                textarea name="commentaire" { (a.commentaire.as_deref().unwrap_or_default()) }
            }
            (submit_button("Enregistrer"))
        }
    }
}

pub fn message_buttons(client_id: &str) -> Markup {
    html! {
        div class="messages" {
            @for kind in MailKind::ALL {
                form method="post" action={ "/clients/" (client_id) "/envoyer/" (kind.slug()) } style="display:inline" {
                    button type="submit" { (kind.label()) }
                }
            }
        }
    }
}
