use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use printer_scan_rs::classify::QueryTransport;
use printer_scan_rs::config::{ScanConfig, PRINTER_TYPE_VALUE};
use printer_scan_rs::error::{ProbeError, QueryError};
use printer_scan_rs::probe::EchoTransport;
use printer_scan_rs::scan::Scanner;
use printer_scan_rs::server::{router, AppState};
use printer_scan_rs::types::ScanRange;
use tower::ServiceExt;

/// Every host is up; only `.2` is a printer.
struct OnePrinter;

#[async_trait]
impl EchoTransport for OnePrinter {
    async fn echo(&self, _address: Ipv4Addr) -> Result<(), ProbeError> {
        Ok(())
    }
}

#[async_trait]
impl QueryTransport for OnePrinter {
    async fn get(&self, address: Ipv4Addr, _oid: &[u64]) -> Result<String, QueryError> {
        if address.octets()[3] == 2 {
            Ok(PRINTER_TYPE_VALUE.to_string())
        } else {
            Err(QueryError::EmptyResponse)
        }
    }
}

fn app(range: ScanRange) -> axum::Router {
    let transport = Arc::new(OnePrinter);
    let scanner = Scanner::new(ScanConfig::default(), transport.clone(), transport);
    router(AppState::new(scanner, range))
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn scan_returns_printer_list() {
    let resp = app(ScanRange::new("10.0.0", 1, 3, 2))
        .oneshot(Request::post("/api/scan").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        serde_json::json!({ "printers": ["10.0.0.2"] })
    );
}

#[tokio::test]
async fn scan_that_cannot_run_is_a_server_error() {
    let resp = app(ScanRange::new("10.0.0", 1, 3, 0))
        .oneshot(Request::post("/api/scan").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("batch size"));
}

#[tokio::test]
async fn health_is_ok() {
    let resp = app(ScanRange::new("10.0.0", 1, 1, 1))
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
