use crate::db::employes::Employe;
use crate::domain::chantier::Chantier;
use crate::domain::client::Client;
use crate::domain::intervention::{InterventionRow, RowError};
use crate::templates::components::submit_button;
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub struct PlanningVm {
    pub chantier: Chantier,
    pub client: Client,
    pub employes: Vec<Employe>,
    pub rows: Vec<InterventionRow>,
    pub errors: Vec<RowError>,
    pub description: String,
}

pub fn planning_page(vm: &PlanningVm) -> Markup {
    // one blank row so the form is never empty
    let blank = [InterventionRow::default()];
    let rows: &[InterventionRow] = if vm.rows.is_empty() { &blank } else { &vm.rows };

    desktop_layout(
        "Planification",
        "/chantiers",
        html! {
            h1 { "Planification : " (vm.client.display_name()) }
            p class="muted" { (vm.client.full_address()) }

            form method="post" action={ "/chantiers/" (vm.chantier.id) "/planification" } {
                label {
                    "Description du problème"
                    textarea name="description" { (vm.description) }
                }
                input type="hidden" name="rows" value=(rows.len());

                @for (i, row) in rows.iter().enumerate() {
                    fieldset {
                        legend { "Intervention " (i + 1) }
                        @for err in vm.errors.iter().filter(|e| e.position == i) {
                            p class="warning" { (err.message) }
                        }
                        label { "Début" input type="datetime-local" name={ "debut_" (i) } value=(row.debut); }
                        label { "Fin" input type="datetime-local" name={ "fin_" (i) } value=(row.fin); }
                        div {
                            @for e in &vm.employes {
                                label {
                                    input type="checkbox" name={ "techniciens_" (i) } value=(e.id)
                                        checked[row.techniciens.contains(&e.id)];
                                    (e.display_name())
                                    @if e.extrabat_id.is_none() {
                                        span class="muted" { " (hors agenda)" }
                                    }
                                }
                            }
                        }
                        label { "Notes" input type="text" name={ "notes_" (i) } value=(row.notes); }
                    }
                }
                (submit_button("Valider la planification"))
            }

            form method="get" action={ "/chantiers/" (vm.chantier.id) "/planification" } {
                input type="hidden" name="rows" value=(rows.len() + 1);
                button type="submit" { "Ajouter une intervention" }
            }
        },
    )
}
