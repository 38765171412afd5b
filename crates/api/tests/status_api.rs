//! Integration tests for the service status probe endpoints.

mod common;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use sqlx::PgPool;

use common::{body_json, build_test_app_with_services, get as get_with_identity};

/// Serve a stub health endpoint on an ephemeral port; returns its URL.
async fn spawn_stub(status: StatusCode) -> String {
    let app = Router::new().route("/hc", get(move || async move { (status, "stub") }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/hc")
}

#[sqlx::test(migrations = "../db/migrations")]
async fn healthy_service_reports_ok(pool: PgPool) {
    let url = spawn_stub(StatusCode::OK).await;
    let app = build_test_app_with_services(pool, vec![("upload-consumer".into(), Some(url))]);

    let response = get_with_identity(app.router.clone(), "/status/upload-consumer").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "OK");
    assert!(json["message"].as_str().unwrap().contains("upload-consumer"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_2xx_service_reports_warning(pool: PgPool) {
    let url = spawn_stub(StatusCode::SERVICE_UNAVAILABLE).await;
    let app = build_test_app_with_services(pool, vec![("kafka".into(), Some(url))]);

    let json = body_json(get_with_identity(app.router.clone(), "/status/kafka").await).await;
    assert_eq!(json["status"], "WARNING");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unreachable_service_reports_error(pool: PgPool) {
    // Nothing listens on this port.
    let app = build_test_app_with_services(
        pool,
        vec![("database".into(), Some("http://127.0.0.1:9/hc".into()))],
    );

    let json = body_json(get_with_identity(app.router.clone(), "/status/database").await).await;
    assert_eq!(json["status"], "ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn service_without_url_reports_unchecked(pool: PgPool) {
    let app = build_test_app_with_services(pool, vec![("chart-service".into(), None)]);

    let json = body_json(get_with_identity(app.router.clone(), "/status/chart-service").await).await;
    assert_eq!(json["status"], "UNCHECKED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_service_is_not_found(pool: PgPool) {
    let app = build_test_app_with_services(pool, vec![("kafka".into(), None)]);

    let response = get_with_identity(app.router.clone(), "/status/nonexistent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["errorTitle"], "Not Found");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn mixed_results_aggregate_to_degraded(pool: PgPool) {
    let ok = spawn_stub(StatusCode::OK).await;
    let ok2 = spawn_stub(StatusCode::OK).await;
    let bad = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = build_test_app_with_services(
        pool,
        vec![
            ("a".into(), Some(ok)),
            ("b".into(), Some(ok2)),
            ("c".into(), Some(bad)),
        ],
    );

    let json = body_json(get_with_identity(app.router.clone(), "/status").await).await;
    assert_eq!(json["health"], "degraded");
    assert_eq!(json["services"]["a"]["status"], "OK");
    assert_eq!(json["services"]["c"]["status"], "WARNING");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn all_ok_aggregates_to_healthy(pool: PgPool) {
    let ok = spawn_stub(StatusCode::OK).await;
    let ok2 = spawn_stub(StatusCode::OK).await;
    let app = build_test_app_with_services(
        pool,
        vec![("a".into(), Some(ok)), ("b".into(), Some(ok2))],
    );

    let json = body_json(get_with_identity(app.router.clone(), "/status").await).await;
    assert_eq!(json["health"], "healthy");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unchecked_only_aggregates_to_unknown(pool: PgPool) {
    let app = build_test_app_with_services(
        pool,
        vec![("a".into(), None), ("b".into(), None)],
    );

    let json = body_json(get_with_identity(app.router.clone(), "/status").await).await;
    assert_eq!(json["health"], "unknown");
    assert_eq!(json["services"]["a"]["status"], "UNCHECKED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn one_slow_service_does_not_block_the_rest(pool: PgPool) {
    // "Slow" here is a black-holed connection that only resolves via the
    // probe timeout; the healthy service must still be reported.
    let ok = spawn_stub(StatusCode::OK).await;
    let app = build_test_app_with_services(
        pool,
        vec![
            ("fast".into(), Some(ok)),
            ("dead".into(), Some("http://127.0.0.1:9/hc".into())),
        ],
    );

    let json = body_json(get_with_identity(app.router.clone(), "/status").await).await;
    assert_eq!(json["services"]["fast"]["status"], "OK");
    assert_eq!(json["services"]["dead"]["status"], "ERROR");
    assert_eq!(json["health"], "degraded");
}
