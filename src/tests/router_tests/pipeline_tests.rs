use crate::router::handle;
use crate::tests::utils::{body_string, count, fake_app, get, location, post_form, scalar, FakeErp};

fn quick_prospect(app: &crate::state::AppState) -> String {
    let resp = handle(
        post_form(
            "/prospects/rapide",
            &[("nom", "Dupuis"), ("telephone", "06 12 34 56 78")],
        ),
        app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);
    scalar(&app.db, "select id from opportunites limit 1")
}

#[test]
fn whitespace_name_is_rejected_before_anything_is_stored() {
    let app = fake_app(FakeErp::default());
    let err = handle(post_form("/prospects", &[("nom", "   ")]), &app).unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(count(&app.db, "clients"), 0);
    assert_eq!(count(&app.db, "opportunites"), 0);
}

#[test]
fn quick_entry_shows_in_prospection_column() {
    let app = fake_app(FakeErp::default());
    quick_prospect(&app);

    let resp = handle(get("/"), &app).unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_string(resp);
    assert!(body.contains("Dupuis"));
    assert!(body.contains("Compléter la fiche"));
}

#[test]
fn win_without_erp_link_opens_completion_form() {
    let app = fake_app(FakeErp::default());
    let opp = quick_prospect(&app);

    let resp = handle(post_form(&format!("/opportunites/{opp}/statut"), &[("statut", "gagne")]), &app).unwrap();
    assert_eq!(resp.status(), 409);
    let body = body_string(resp);
    assert!(body.contains("Compléter la fiche"));
    assert!(body.contains(r#"name="origine_id""#));
    assert!(body.contains("Recommandation"));
    assert!(body.contains(r#"name="type_telephone_id""#));
    assert_eq!(count(&app.db, "chantiers"), 0);
}

#[test]
fn incomplete_completion_is_re_rendered() {
    let app = fake_app(FakeErp::default());
    let opp = quick_prospect(&app);

    let resp = handle(
        post_form(&format!("/opportunites/{opp}/completion"), &[("nom", "Dupuis")]),
        &app,
    )
    .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(body_string(resp).contains("Champs obligatoires manquants"));
}

#[test]
fn completion_creates_erp_client_and_worksite() {
    let erp = FakeErp::default();
    let app = fake_app(erp.clone());
    let opp = quick_prospect(&app);

    let resp = handle(
        post_form(
            &format!("/opportunites/{opp}/completion"),
            &[
                ("nom", "Dupuis"),
                ("telephone", "06 12 34 56 78"),
                ("adresse", "4 place Bellecour"),
                ("code_postal", "69002"),
                ("ville", "Lyon"),
                ("origine_id", "2"),
                ("type_telephone_id", "1"),
            ],
        ),
        &app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/chantiers");
    assert_eq!(scalar(&app.db, "select extrabat_id from clients"), "erp-1");
    let codes = erp.last_codes().unwrap();
    assert_eq!(codes.origine_id.as_deref(), Some("2"));
    assert_eq!(codes.type_adresse_id, None);
    assert_eq!(codes.type_telephone_id.as_deref(), Some("1"));
    assert_eq!(scalar(&app.db, "select statut_final from opportunites"), "gagne");

    let body = body_string(handle(get("/chantiers"), &app).unwrap());
    assert!(body.contains("Dupuis"));
}

#[test]
fn backward_move_is_a_conflict() {
    let app = fake_app(FakeErp::default());
    let opp = quick_prospect(&app);
    let uri = format!("/opportunites/{opp}/statut");

    handle(post_form(&uri, &[("statut", "relance_1")]), &app).unwrap();
    let err = handle(post_form(&uri, &[("statut", "devis_transmis")]), &app).unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert_eq!(scalar(&app.db, "select statut from opportunites"), "relance_1");
}

#[test]
fn interaction_needs_content() {
    let app = fake_app(FakeErp::default());
    let opp = quick_prospect(&app);
    let uri = format!("/opportunites/{opp}/interactions");

    let err = handle(post_form(&uri, &[("kind", "appel"), ("contenu", " ")]), &app).unwrap_err();
    assert_eq!(err.status_code(), 400);

    let resp = handle(post_form(&uri, &[("kind", "appel"), ("contenu", "Rappeler lundi")]), &app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(count(&app.db, "interactions"), 1);
}

#[test]
fn health_and_unknown_routes() {
    let app = fake_app(FakeErp::default());
    assert_eq!(body_string(handle(get("/health"), &app).unwrap()), "ok");
    assert_eq!(handle(get("/nulle-part"), &app).unwrap_err().status_code(), 404);
}
