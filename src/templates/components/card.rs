use maud::{html, Markup};

/// Titled panel. With a `count`, the title carries it and an empty list
/// shows a placeholder instead of `body`.
pub fn card(title: &str, count: Option<usize>, body: Markup) -> Markup {
    html! {
        section class="card" {
            div class="card-header" {
                h2 { (title) }
                @if let Some(n) = count {
                    span class="count" { (n) }
                }
            }
            @if count == Some(0) {
                p class="muted" { "Aucun élément" }
            } @else {
                (body)
            }
        }
    }
}
