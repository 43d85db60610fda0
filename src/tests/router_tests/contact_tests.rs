use crate::router::handle;
use crate::tests::utils::{body_string, count, fake_app, get, location, post_form, scalar, FakeErp};

#[test]
fn create_filter_and_toggle() {
    let app = fake_app(FakeErp::default());

    let resp = handle(
        post_form(
            "/prospection",
            &[("nom_contact", "Mairie de Bron"), ("responsable", "Julie")],
        ),
        &app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/prospection");
    handle(
        post_form(
            "/prospection",
            &[("nom_contact", "Collège Ampère"), ("responsable", "Karim")],
        ),
        &app,
    )
    .unwrap();

    let body = body_string(handle(get("/prospection?responsable=Julie"), &app).unwrap());
    assert!(body.contains("Mairie de Bron"));
    assert!(!body.contains("Collège Ampère"));

    let id = scalar(&app.db, "select id from prospection_actions where responsable = 'Julie'");
    handle(post_form(&format!("/prospection/{id}/toggle"), &[]), &app).unwrap();
    assert_eq!(
        scalar(&app.db, &format!("select statut from prospection_actions where id = '{id}'")),
        "contacte"
    );

    let body = body_string(handle(get("/prospection?statut=a_contacter"), &app).unwrap());
    assert!(body.contains("Collège Ampère"));
    assert!(!body.contains("Mairie de Bron"));
}

#[test]
fn lists_do_not_share_rows() {
    let app = fake_app(FakeErp::default());
    handle(
        post_form(
            "/actions-commerciales",
            &[("nom_contact", "SCI Bellevue"), ("responsable", "Julie")],
        ),
        &app,
    )
    .unwrap();

    assert_eq!(count(&app.db, "actions_commerciales"), 1);
    assert_eq!(count(&app.db, "prospection_actions"), 0);
}

#[test]
fn blank_responsable_is_rejected() {
    let app = fake_app(FakeErp::default());
    let err = handle(
        post_form(
            "/actions-commerciales",
            &[("nom_contact", "SCI Bellevue"), ("responsable", " ")],
        ),
        &app,
    )
    .unwrap_err();
    assert_eq!(err.status_code(), 400);
}
