// src/domain/intervention.rs

use chrono::{DateTime, Utc};

use crate::domain::dates::parse_datetime_input;

/// A stored visit window with its technicians.
#[derive(Debug, Clone, PartialEq)]
pub struct Intervention {
    pub id: String,
    pub chantier_id: String,
    pub position: i64,
    pub date_debut: DateTime<Utc>,
    pub date_fin: DateTime<Utc>,
    pub notes: Option<String>,
    pub techniciens: Vec<InterventionTechnicien>,
}

/// Technician assignment; `extrabat_rdv_id` keys the remote calendar entry.
#[derive(Debug, Clone, PartialEq)]
pub struct InterventionTechnicien {
    pub employe_id: String,
    pub extrabat_rdv_id: Option<String>,
}

/// One row of the scheduling form, as submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterventionRow {
    pub debut: String,
    pub fin: String,
    pub techniciens: Vec<String>,
    pub notes: String,
}

/// A validated row, ready to be saved at `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedIntervention {
    pub position: i64,
    pub date_debut: DateTime<Utc>,
    pub date_fin: DateTime<Utc>,
    pub technicien_ids: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub position: usize,
    pub message: String,
}

/// Validates every row against the bookable technician ids; errors are
/// collected per row so the form can show them inline.
pub fn validate_rows(
    rows: &[InterventionRow],
    bookable: &[String],
) -> Result<Vec<PlannedIntervention>, Vec<RowError>> {
    if rows.is_empty() {
        return Err(vec![RowError {
            position: 0,
            message: "Ajoutez au moins une intervention".into(),
        }]);
    }

    let mut planned = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (position, row) in rows.iter().enumerate() {
        let label = position + 1;
        let techniciens: Vec<String> = row
            .techniciens
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let unknown = techniciens.iter().any(|t| !bookable.contains(t));
        if techniciens.is_empty() {
            errors.push(RowError {
                position,
                message: format!("Intervention {label} : sélectionnez au moins un technicien"),
            });
        } else if unknown {
            errors.push(RowError {
                position,
                message: format!("Intervention {label} : technicien inconnu ou inactif"),
            });
        }

        let debut = parse_datetime_input(&row.debut);
        let fin = parse_datetime_input(&row.fin);
        match (debut, fin) {
            (Some(d), Some(f)) if f > d => {
                if !techniciens.is_empty() && !unknown {
                    let notes = row.notes.trim();
                    planned.push(PlannedIntervention {
                        position: position as i64,
                        date_debut: d,
                        date_fin: f,
                        technicien_ids: techniciens,
                        notes: (!notes.is_empty()).then(|| notes.to_string()),
                    });
                }
            }
            (Some(_), Some(_)) => errors.push(RowError {
                position,
                message: format!("Intervention {label} : la fin doit suivre le début"),
            }),
            _ => errors.push(RowError {
                position,
                message: format!("Intervention {label} : dates de début et de fin obligatoires"),
            }),
        }
    }

    if errors.is_empty() {
        Ok(planned)
    } else {
        Err(errors)
    }
}
