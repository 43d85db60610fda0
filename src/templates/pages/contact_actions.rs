use crate::domain::contact_action::{ContactAction, ContactList, ContactStatut};
use crate::domain::dates::format_date;
use crate::templates::components::{submit_button, text_input};
use crate::templates::{card, desktop_layout};
use crate::workflows::contact_actions::ContactFilter;
use maud::{html, Markup};

pub fn contact_actions_page(list: ContactList, filter: &ContactFilter, actions: &[ContactAction]) -> Markup {
    let path = list.path();
    desktop_layout(
        list.title(),
        path,
        html! {
            h1 { (list.title()) }

            form method="get" action=(path) {
                (text_input("Responsable", "responsable", filter.responsable.as_deref(), false))
                select name="statut" {
                    option value="" { "Tous" }
                    @for s in [ContactStatut::AContacter, ContactStatut::Contacte] {
                        option value=(s.as_str()) selected[filter.statut == Some(s)] { (s.label()) }
                    }
                }
                (submit_button("Filtrer"))
            }

            table {
                tr { th { "Contact" } th { "Entreprise" } th { "Coordonnées" } th { "Responsable" } th { "Statut" } }
                @for a in actions {
                    tr {
                        td { (a.nom_contact) }
                        td { (a.entreprise.as_deref().unwrap_or_default()) }
                        td {
                            (a.telephone.as_deref().unwrap_or_default()) " "
                            (a.email.as_deref().unwrap_or_default())
                        }
                        td { (a.responsable) }
                        td {
                            form method="post" action={ (path) "/" (a.id) "/toggle" } {
                                button type="submit" {
                                    (a.statut.label())
                                    @if let Some(d) = a.date_contact { " le " (format_date(d)) }
                                }
                            }
                        }
                    }
                }
            }

            (card("Nouveau contact", None, html! {
                form method="post" action=(path) {
                    (text_input("Contact", "nom_contact", None, true))
                    (text_input("Entreprise", "entreprise", None, false))
                    (text_input("Téléphone", "telephone", None, false))
                    (text_input("Email", "email", None, false))
                    (text_input("Responsable", "responsable", None, true))
                    label { "Commentaire" textarea name="commentaire" {} }
                    (submit_button("Ajouter"))
                }
            }))
        },
    )
}
