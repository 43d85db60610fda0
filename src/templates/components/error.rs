use maud::{html, Markup};

/// Inline failure notice with a link to try the same page again.
pub fn error_panel(message: &str, retry: &str) -> Markup {
    html! {
        div class="error-panel" role="alert" {
            p { (message) }
            a href=(retry) { "Réessayer" }
        }
    }
}
