use crate::router::handle;
use crate::tests::utils::{body_string, count, fake_app, get, FakeErp};

#[test]
fn first_visit_creates_local_client() {
    let app = fake_app(FakeErp::default().with_client("E-12", "Garnier"));

    let resp = handle(get("/dashboard-client/E-12"), &app).unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_string(resp);
    assert!(body.contains("Garnier"));
    assert!(body.contains("Fiche locale créée"));
    assert!(body.contains("Inscrire au programme"));

    handle(get("/dashboard-client/E-12"), &app).unwrap();
    assert_eq!(count(&app.db, "clients"), 1);
}

#[test]
fn unknown_erp_id_is_not_found() {
    let app = fake_app(FakeErp::default());
    let err = handle(get("/dashboard-client/E-404"), &app).unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(count(&app.db, "clients"), 0);
}

#[test]
fn erp_outage_is_a_bad_gateway() {
    let app = fake_app(FakeErp::failing());
    let err = handle(get("/dashboard-client/E-12"), &app).unwrap_err();
    assert_eq!(err.status_code(), 502);
}
