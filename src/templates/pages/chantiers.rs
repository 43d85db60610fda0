use crate::db::chantiers::ChantierListItem;
use crate::domain::chantier::{ChantierStatut, Jalon};
use crate::domain::dates::{datetime_input_value, format_date};
use crate::templates::components::{progress_bar, submit_button};
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn chantiers_page(items: &[ChantierListItem]) -> Markup {
    desktop_layout(
        "Chantiers",
        "/chantiers",
        html! {
            h1 { "Suivi des chantiers" }
            p { a href="/chantiers/export.xlsx" { "Exporter (xlsx)" } }
            @if items.is_empty() {
                p class="muted" { "Aucun chantier. Passez une opportunité en gagné pour en créer un." }
            }
            @for item in items {
                (chantier_card(item))
            }
        },
    )
}

fn chantier_card(item: &ChantierListItem) -> Markup {
    let c = &item.chantier;
    let base = format!("/chantiers/{}", c.id);
    let warnings = c.out_of_order();

    html! {
        section class="card" id={ "chantier-" (c.id) } {
            h2 { (item.client_nom) " · " (item.opportunite_titre) }
            (progress_bar(c.progress_percent()))
            @if c.statut == ChantierStatut::Finalise {
                p class="muted" {
                    "Finalisé"
                    @if let Some(d) = c.date_finalisation { " le " (format_date(d)) }
                }
            }
            table {
                @for jalon in Jalon::ALL {
                    @let (done, date) = c.jalon(jalon);
                    tr {
                        td {
                            form method="post" action={ (base) "/jalons/" (jalon.slug()) } {
                                button type="submit" class="btn" {
                                    @if done { "☑ " } @else { "☐ " }
                                    (jalon.label())
                                }
                            }
                        }
                        td {
                            @if done {
                                form method="post" action={ (base) "/dates/" (jalon.slug()) } {
                                    input type="datetime-local" name="date"
                                        value=[date.map(datetime_input_value)];
                                    (submit_button("Modifier"))
                                }
                            }
                        }
                    }
                }
            }
            @for (earlier, later) in &warnings {
                p class="warning" {
                    (later.label()) " est daté avant " (earlier.label())
                }
            }
            p { a href={ (base) "/planification" } { "Planification" } }
        }
    }
}
