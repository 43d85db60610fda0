use crate::db::employes::insert_employe;
use crate::router::handle;
use crate::tests::utils::{
    body_string, count, fake_app, get, location, post_form, scalar, seed_chantier, FakeErp,
};

#[test]
fn toggle_stamps_and_redirects_to_tracker() {
    let app = fake_app(FakeErp::default());
    let id = seed_chantier(&app.db);

    let resp = handle(post_form(&format!("/chantiers/{id}/jalons/commande_passee"), &[]), &app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/chantiers");
    assert_eq!(scalar(&app.db, "select cast(commande_passee as text) from chantiers"), "1");

    let body = body_string(handle(get("/chantiers"), &app).unwrap());
    assert!(body.contains("25%"));
}

#[test]
fn planifie_toggle_opens_scheduling() {
    let app = fake_app(FakeErp::default());
    let id = seed_chantier(&app.db);

    let resp = handle(post_form(&format!("/chantiers/{id}/jalons/planifie"), &[]), &app).unwrap();
    assert_eq!(location(&resp), format!("/chantiers/{id}/planification"));
    assert_eq!(scalar(&app.db, "select cast(planifie as text) from chantiers"), "0");
}

#[test]
fn termine_finalizes_once() {
    let app = fake_app(FakeErp::default());
    let id = seed_chantier(&app.db);
    let uri = format!("/chantiers/{id}/jalons/termine");

    handle(post_form(&uri, &[]), &app).unwrap();
    assert_eq!(scalar(&app.db, "select statut from chantiers"), "finalise");
    assert_eq!(scalar(&app.db, "select cast(ltv_actif as text) from clients"), "1");
    let actions = count(&app.db, "ltv_actions");
    assert!(actions > 0);

    // untick then tick again: no second checklist
    handle(post_form(&uri, &[]), &app).unwrap();
    handle(post_form(&uri, &[]), &app).unwrap();
    assert_eq!(count(&app.db, "ltv_actions"), actions);
    assert_eq!(scalar(&app.db, "select statut from chantiers"), "finalise");
}

#[test]
fn unknown_milestone_is_not_found() {
    let app = fake_app(FakeErp::default());
    let id = seed_chantier(&app.db);
    let err = handle(post_form(&format!("/chantiers/{id}/jalons/livre"), &[]), &app).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn date_edit_requires_reached_milestone() {
    let app = fake_app(FakeErp::default());
    let id = seed_chantier(&app.db);
    let uri = format!("/chantiers/{id}/dates/commande_recue");

    let err = handle(post_form(&uri, &[("date", "2026-04-20T10:00")]), &app).unwrap_err();
    assert_eq!(err.status_code(), 400);

    handle(post_form(&format!("/chantiers/{id}/jalons/commande_recue"), &[]), &app).unwrap();
    let resp = handle(post_form(&uri, &[("date", "2026-04-20T10:00")]), &app).unwrap();
    assert_eq!(resp.status(), 303);
    assert!(scalar(&app.db, "select date_commande_recue from chantiers").starts_with("2026-04-20"));
}

#[test]
fn planning_row_without_technician_is_rejected() {
    let app = fake_app(FakeErp::default());
    let id = seed_chantier(&app.db);

    let resp = handle(
        post_form(
            &format!("/chantiers/{id}/planification"),
            &[
                ("rows", "1"),
                ("debut_0", "2026-06-02T08:00"),
                ("fin_0", "2026-06-02T12:00"),
            ],
        ),
        &app,
    )
    .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(body_string(resp).contains("Intervention 1 : sélectionnez au moins un technicien"));
    assert_eq!(count(&app.db, "chantier_interventions"), 0);
}

#[test]
fn planning_page_syncs_erp_users_then_books_them() {
    let erp = FakeErp::default()
        .with_user("u-7", "Roux", true)
        .with_user("u-9", "Vidal", false);
    let app = fake_app(erp.clone());
    let id = seed_chantier(&app.db);

    let page = body_string(handle(get(&format!("/chantiers/{id}/planification")), &app).unwrap());
    assert!(page.contains("Roux"));
    assert!(!page.contains("Vidal"));
    let tech = scalar(&app.db, "select id from employes where extrabat_id = 'u-7'");

    let resp = handle(
        post_form(
            &format!("/chantiers/{id}/planification"),
            &[
                ("rows", "1"),
                ("description", "Sirène muette"),
                ("debut_0", "2026-06-02T08:00"),
                ("fin_0", "2026-06-02T12:00"),
                ("techniciens_0", tech.as_str()),
            ],
        ),
        &app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(scalar(&app.db, "select cast(planifie as text) from chantiers"), "1");
    assert_eq!(scalar(&app.db, "select description_probleme from chantiers"), "Sirène muette");
    assert_eq!(erp.created(), 1);
}

#[test]
fn unknown_technician_is_a_row_error_not_a_server_error() {
    let app = fake_app(FakeErp::default().with_user("u-7", "Roux", true));
    let id = seed_chantier(&app.db);

    let resp = handle(
        post_form(
            &format!("/chantiers/{id}/planification"),
            &[
                ("rows", "1"),
                ("debut_0", "2026-06-02T08:00"),
                ("fin_0", "2026-06-02T12:00"),
                ("techniciens_0", "u-7"),
            ],
        ),
        &app,
    )
    .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(body_string(resp).contains("Intervention 1 : technicien inconnu ou inactif"));
    assert_eq!(count(&app.db, "chantier_interventions"), 0);
    assert_eq!(scalar(&app.db, "select cast(planifie as text) from chantiers"), "0");
}

#[test]
fn employee_sync_route_fills_the_picker() {
    let app = fake_app(FakeErp::default().with_user("u-7", "Roux", true));

    let resp = handle(post_form("/employes/sync", &[]), &app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(count(&app.db, "employes"), 1);
}

#[test]
fn planning_page_renders_when_erp_is_down() {
    let app = fake_app(FakeErp::failing());
    let id = seed_chantier(&app.db);
    app.db
        .with_conn(|conn| insert_employe(conn, "Blanc", None, None))
        .unwrap();

    let resp = handle(get(&format!("/chantiers/{id}/planification")), &app).unwrap();
    assert_eq!(resp.status(), 200);
    assert!(body_string(resp).contains("Blanc"));
}

#[test]
fn export_is_a_workbook() {
    let app = fake_app(FakeErp::default());
    seed_chantier(&app.db);

    let resp = handle(get("/chantiers/export.xlsx"), &app).unwrap();
    assert_eq!(resp.status(), 200);
    let content_type = resp.headers().get("Content-Type").unwrap().to_str().unwrap();
    assert!(content_type.contains("spreadsheetml"));
}
