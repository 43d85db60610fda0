use crate::templates::{desktop_layout, error_panel};
use maud::{html, Markup};

pub fn error_page(status: u16, message: &str, retry: &str) -> Markup {
    let title = match status {
        400 => "Saisie invalide",
        404 => "Introuvable",
        409 => "Action impossible",
        502 => "Service externe indisponible",
        _ => "Erreur",
    };
    desktop_layout(
        title,
        "",
        html! {
            h1 { (title) }
            (error_panel(message, retry))
        },
    )
}
