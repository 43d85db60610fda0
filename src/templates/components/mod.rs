use maud::{html, Markup};

pub mod card;
pub mod error;
pub mod form;
pub mod progress;

pub use card::card;
pub use error::error_panel;
pub use form::{select, text_input};
pub use progress::{progress_bar, score_badge};

pub fn submit_button(label: &str) -> Markup {
    html! {
        button class="btn" type="submit" { (label) }
    }
}
