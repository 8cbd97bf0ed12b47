use actix_web::{http::StatusCode, test, web, App};

use obra_control_server::{
    config::AppConfig,
    models::session::{SessionMiddlewareFactory, ROLE_HEADER, USER_HEADER},
    routes,
};

fn config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "FILES_DIR" => Some(std::env::temp_dir().join("obra-control-api").display().to_string()),
        _ => None,
    })
    .unwrap()
}

#[actix_web::test]
async fn anonymous_requests_are_rejected() {
    let app = test::init_service(
        App::new()
            .wrap(SessionMiddlewareFactory)
            .app_data(web::Data::new(config()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/sites").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn interns_cannot_create_sites() {
    let app = test::init_service(
        App::new()
            .wrap(SessionMiddlewareFactory)
            .app_data(web::Data::new(config()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/sites")
        .insert_header((USER_HEADER, "pasante-rinconada"))
        .insert_header((ROLE_HEADER, "pasante"))
        .set_json(serde_json::json!({
            "code": "OB-001",
            "name": "Rinconada Baja",
            "total_budget": 250000.0
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn store_errors_surface_as_codes() {
    let app = test::init_service(
        App::new()
            .wrap(SessionMiddlewareFactory)
            .app_data(web::Data::new(config()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/sites/OB-001/kpis")
        .insert_header((USER_HEADER, "jefe"))
        .insert_header((ROLE_HEADER, "jefe"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = test::read_body(res).await;
    assert_eq!(body, "DATABASE_UNAVAILABLE");
}

#[actix_web::test]
async fn file_names_cannot_escape_the_files_dir() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(config()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/files?kind=photo&name=..%2F.env")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/files?kind=receipt&name=missing.png")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
