use crate::domain::ltv::ScoreBand;
use maud::{html, Markup};

pub fn progress_bar(percent: u32) -> Markup {
    html! {
        div class="progress" title={ (percent) "%" } {
            div style={ "width: " (percent) "%" } {}
        }
    }
}

pub fn score_badge(score: i64) -> Markup {
    let band = ScoreBand::from_score(score);
    html! {
        span class={ "score " (band.css_class()) } {
            strong { (score) "/10" } " · " (band.label())
        }
    }
}
