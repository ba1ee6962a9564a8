mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use common::*;
use wayfarer::server;

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(service()))
                .configure(server::configure("/v1/".to_string())),
        )
        .await
    };
}

fn login_body(username: &str, event_uuid: &str, unix_timestamp: i64, ip_address: &str) -> Value {
    json!({
        "username": username,
        "unix_timestamp": unix_timestamp,
        "event_uuid": event_uuid,
        "ip_address": ip_address,
    })
}

#[actix_web::test]
async fn test_first_login_returns_current_geo_only() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("bob", "85ad929a-db03-4bf4-9541-8f728fa12e42", 1514764800, LONDON_IP))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "currentGeo": { "lat": 51.5074, "lon": -0.1278, "radius": 10 } }));
}

#[actix_web::test]
async fn test_impossible_travel_response_shape() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("alice", "a", 1000, NEW_YORK_IP))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("alice", "b", 1060, LONDON_IP))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["travelToCurrentGeoSuspicious"], true);
    assert!(body.get("travelFromCurrentGeoSuspicious").is_none());
    assert!(body.get("subsequentIpAccess").is_none());

    let preceding = &body["precedingIpAccess"];
    assert_eq!(preceding["ip"], NEW_YORK_IP);
    assert_eq!(preceding["unix_timestamp"], 1000);
    assert_eq!(preceding["lat"], 40.7128);
    assert_eq!(preceding["radius"], 5);
    let speed = preceding["speed"].as_i64().unwrap();
    assert!((332_700..=335_700).contains(&speed), "speed was {}", speed);
}

#[actix_web::test]
async fn test_subsequent_login_reported() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("alice", "later", 1000 + 8 * 3600, NEW_YORK_IP))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("alice", "earlier", 1000, NEW_YORK_IP))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["travelFromCurrentGeoSuspicious"], false);
    assert_eq!(body["subsequentIpAccess"]["speed"], 0);
    assert!(body.get("precedingIpAccess").is_none());
}

#[actix_web::test]
async fn test_invalid_ip_rejected() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("alice", "a", 1000, "999.1.1.1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("999.1.1.1"));
}

#[actix_web::test]
async fn test_malformed_json_rejected() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/v1/")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"username": "alice", "unix_timestamp": "soon"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_unresolvable_ip_is_unprocessable() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("alice", "a", 1000, UNKNOWN_IP))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_event_id_conflict() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("alice", "shared", 1000, NEW_YORK_IP))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/v1/")
        .set_json(login_body("bob", "shared", 1000, NEW_YORK_IP))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_health() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_get_on_ingest_path_not_allowed() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/v1/").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}
