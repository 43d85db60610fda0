use maud::{html, Markup, PreEscaped, DOCTYPE};

const NAV: [(&str, &str); 5] = [
    ("/", "Pipeline"),
    ("/chantiers", "Chantiers"),
    ("/ltv", "Programme LTV"),
    ("/actions-commerciales", "Actions commerciales"),
    ("/prospection", "Prospection"),
];

const STYLES: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; background: #f8fafc; }
header { display: flex; align-items: center; gap: 2rem; padding: .75rem 1.5rem; background: #fff; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
header nav ul { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }
header nav a { color: #374151; text-decoration: none; }
header nav a.active { color: #524ed2; font-weight: 600; }
main { max-width: 1200px; margin: 1.5rem auto; padding: 0 1rem; }
.card { background: #fff; border-radius: 8px; padding: 1rem 1.25rem; margin-bottom: 1rem; box-shadow: 0 1px 2px rgba(0,0,0,.06); }
.card-header { display: flex; align-items: baseline; gap: .5rem; }
.card-header .count { background: #eef1f5; border-radius: 999px; padding: 0 .5rem; font-size: .85rem; }
.columns { display: grid; grid-template-columns: repeat(5, 1fr); gap: .75rem; }
.progress { background: #e5e7eb; border-radius: 4px; height: .5rem; }
.progress > div { background: #524ed2; height: 100%; border-radius: 4px; }
.band-high { color: #047857; } .band-mid { color: #b45309; } .band-low { color: #b91c1c; }
.error-panel { border-left: 4px solid #dc2626; background: #fef2f2; padding: .75rem 1rem; }
.warning { color: #b45309; }
.muted { color: #6b7280; font-size: .9em; }
table { width: 100%; border-collapse: collapse; } td, th { padding: .4rem; border-bottom: 1px solid #e5e7eb; text-align: left; }
"#;

pub fn desktop_layout(title: &str, active: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="fr" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · CRM Chantiers" }
                style { (PreEscaped(STYLES)) }
                script src="https://unpkg.com/htmx.org@1.9.12" defer {};
            }
            body {
                header {
                    strong { "CRM Chantiers" }
                    nav {
                        ul {
                            @for (href, label) in NAV {
                                li {
                                    a href=(href) class=[(href == active).then_some("active")] { (label) }
                                }
                            }
                        }
                    }
                }
                main { (content) }
            }
        }
    }
}
