use crate::db::chantiers::ChantierListItem;
use crate::domain::chantier::Jalon;
use crate::domain::dates::format_date;
use crate::errors::ServerError;
use crate::responses::xlsx_response;
use crate::responses::ResultResp;
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook};

const HEADERS: [&str; 12] = [
    "Client",
    "Opportunité",
    "Statut",
    "Avancement (%)",
    "Commande passée",
    "Commande reçue",
    "Planifié",
    "Terminé",
    "Date de finalisation",
    "Problème",
    "Dates incohérentes",
    "Créé le",
];

fn xlsx_err(what: &str) -> impl Fn(rust_xlsxwriter::XlsxError) -> ServerError + '_ {
    move |e| ServerError::XlsxError(format!("Failed to write {what}: {e}"))
}

/// Tracker workbook, one row per worksite. Milestone cells hold the stamp date, or are empty.
pub fn chantiers_workbook(items: &[ChantierListItem]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(xlsx_err(header))?;
    }

    for (i, item) in items.iter().enumerate() {
        let r = (i + 1) as u32;
        let c = &item.chantier;

        worksheet
            .write_string(r, 0, &item.client_nom)
            .map_err(xlsx_err("client"))?;
        worksheet
            .write_string(r, 1, &item.opportunite_titre)
            .map_err(xlsx_err("opportunity"))?;
        worksheet
            .write_string(r, 2, c.statut.as_str())
            .map_err(xlsx_err("status"))?;
        worksheet
            .write_number(r, 3, c.progress_percent() as f64)
            .map_err(xlsx_err("progress"))?;

        for (offset, jalon) in Jalon::ALL.iter().enumerate() {
            let cell = match c.jalon(*jalon) {
                (true, Some(d)) => format_date(d),
                (true, None) => "oui".to_string(),
                (false, _) => String::new(),
            };
            worksheet
                .write_string(r, 4 + offset as u16, &cell)
                .map_err(xlsx_err(jalon.slug()))?;
        }

        let finalisation = c.date_finalisation.map(format_date).unwrap_or_default();
        worksheet
            .write_string(r, 8, &finalisation)
            .map_err(xlsx_err("finalization date"))?;
        worksheet
            .write_string(r, 9, c.description_probleme.as_deref().unwrap_or(""))
            .map_err(xlsx_err("problem"))?;
        worksheet
            .write_string(r, 10, if c.out_of_order().is_empty() { "" } else { "oui" })
            .map_err(xlsx_err("date check"))?;
        worksheet
            .write_string(r, 11, &format_date(c.created_at))
            .map_err(xlsx_err("creation date"))?;
    }

    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
}

pub fn export_chantiers_xlsx(items: &[ChantierListItem], now: DateTime<Utc>) -> ResultResp {
    let buffer = chantiers_workbook(items)?;
    tracing::info!(rows = items.len(), "worksite tracker exported");
    xlsx_response(buffer, &format!("chantiers_{}.xlsx", now.format("%Y-%m-%d")))
}
