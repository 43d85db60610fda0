use crate::router::handle;
use crate::state::AppState;
use crate::tests::utils::{
    body_string, fake_app, get, location, post_form, scalar, seed_chantier, FakeErp, FakeMailer,
};

/// Seeded worksite, finalized. Returns the client id.
fn enrolled(app: &AppState) -> String {
    let id = seed_chantier(&app.db);
    handle(post_form(&format!("/chantiers/{id}/jalons/termine"), &[]), app).unwrap();
    scalar(&app.db, "select client_id from chantiers")
}

fn first_action(app: &AppState) -> String {
    scalar(&app.db, "select id from ltv_actions order by ordre limit 1")
}

#[test]
fn board_lists_enrolled_clients() {
    let app = fake_app(FakeErp::default());
    enrolled(&app);

    let body = body_string(handle(get("/ltv"), &app).unwrap());
    assert!(body.contains("Moreau"));
    assert!(body.contains("Potentiel inexploité"));
}

#[test]
fn toggle_redirects_back_and_marks_done() {
    let app = fake_app(FakeErp::default());
    enrolled(&app);
    let action = first_action(&app);

    let resp = handle(post_form(&format!("/ltv/actions/{action}/toggle"), &[]), &app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/ltv");
    assert_eq!(scalar(&app.db, &format!("select statut from ltv_actions where id = '{action}'")), "fait");
}

#[test]
fn edit_rejects_negative_referrals() {
    let app = fake_app(FakeErp::default());
    enrolled(&app);
    let uri = format!("/ltv/actions/{}", first_action(&app));

    let err = handle(
        post_form(&uri, &[("statut", "fait"), ("nombre_parrainages", "-1")]),
        &app,
    )
    .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let resp = handle(
        post_form(
            &uri,
            &[
                ("statut", "en_cours"),
                ("nombre_parrainages", "2"),
                ("date_echeance", "2026-07-01"),
                ("commentaire", "Voisin intéressé"),
            ],
        ),
        &app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(scalar(&app.db, "select statut from ltv_actions where nombre_parrainages = 2"), "en_cours");
}

#[test]
fn send_message_checks_recipient_and_template() {
    let mailer = FakeMailer::default();
    let mut app = fake_app(FakeErp::default());
    app.mailer = Box::new(mailer.clone());
    let client = enrolled(&app);

    // no phone on the seeded client
    let err = handle(post_form(&format!("/clients/{client}/envoyer/sms"), &[]), &app).unwrap_err();
    assert_eq!(err.status_code(), 400);

    let err = handle(post_form(&format!("/clients/{client}/envoyer/carte-voeux"), &[]), &app).unwrap_err();
    assert_eq!(err.status_code(), 404);

    let resp = handle(post_form(&format!("/clients/{client}/envoyer/parrainage"), &[]), &app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(mailer.sent(), vec!["send-parrainage-email".to_string()]);
}

#[test]
fn manual_enrollment_has_no_checklist() {
    let app = fake_app(FakeErp::default().with_client("E-5", "Lefebvre"));
    handle(get("/dashboard-client/E-5"), &app).unwrap();
    let client = scalar(&app.db, "select id from clients");

    let resp = handle(post_form(&format!("/clients/{client}/ltv"), &[]), &app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(scalar(&app.db, "select cast(ltv_actif as text) from clients"), "1");

    let body = body_string(handle(get("/ltv"), &app).unwrap());
    assert!(body.contains("Lefebvre"));
}
