//! Booking lifecycle against an in-memory booking API

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use bookcheck_common::BookingPayload;
use bookcheck_e2e::{ApiResponse, BookerConfig, BookingApi, BookingLifecycle, E2eResult};

const TOKEN: &str = "abc123";

/// Mimics restful-booker, with switches for the ways a real deployment
/// misbehaves
#[derive(Default)]
struct FakeBooker {
    bookings: Mutex<HashMap<u64, Value>>,
    next_id: Mutex<u64>,
    /// Echo `totalprice` back as a string
    stringly_prices: bool,
    /// Accept the delete but keep the booking
    sticky_delete: bool,
}

impl FakeBooker {
    fn stored(&self, payload: &BookingPayload) -> Value {
        let mut value = payload.to_value();
        if self.stringly_prices {
            value["totalprice"] = json!(payload.totalprice.to_string());
        }
        value
    }
}

#[async_trait]
impl BookingApi for FakeBooker {
    async fn ping(&self) -> E2eResult<ApiResponse> {
        Ok(ApiResponse::new(201, json!("Created")))
    }

    async fn auth(&self, username: &str, password: &str) -> E2eResult<ApiResponse> {
        // restful-booker answers bad credentials with 200 and no token
        if username == "admin" && password == "password123" {
            Ok(ApiResponse::new(200, json!({ "token": TOKEN })))
        } else {
            Ok(ApiResponse::new(200, json!({ "reason": "Bad credentials" })))
        }
    }

    async fn create(&self, payload: &BookingPayload) -> E2eResult<ApiResponse> {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = *next;
        let booking = self.stored(payload);
        self.bookings.lock().unwrap().insert(id, booking.clone());
        Ok(ApiResponse::new(200, json!({ "bookingid": id, "booking": booking })))
    }

    async fn get(&self, id: u64) -> E2eResult<ApiResponse> {
        match self.bookings.lock().unwrap().get(&id) {
            Some(booking) => Ok(ApiResponse::new(200, booking.clone())),
            None => Ok(ApiResponse::new(404, json!("Not Found"))),
        }
    }

    async fn update(&self, id: u64, token: &str, payload: &BookingPayload) -> E2eResult<ApiResponse> {
        if token != TOKEN {
            return Ok(ApiResponse::new(403, json!("Forbidden")));
        }
        let booking = self.stored(payload);
        self.bookings.lock().unwrap().insert(id, booking.clone());
        Ok(ApiResponse::new(200, booking))
    }

    async fn delete(&self, id: u64, token: &str) -> E2eResult<ApiResponse> {
        if token != TOKEN {
            return Ok(ApiResponse::new(403, json!("Forbidden")));
        }
        if !self.sticky_delete {
            self.bookings.lock().unwrap().remove(&id);
        }
        Ok(ApiResponse::new(201, json!("Created")))
    }
}

fn config() -> BookerConfig {
    BookerConfig {
        seed: Some(42),
        ..Default::default()
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn step_names(result: &bookcheck_e2e::TestResult) -> Vec<&str> {
    result.steps.iter().map(|s| s.name.as_str()).collect()
}

#[tokio::test]
async fn test_full_lifecycle_passes() {
    let api = FakeBooker::default();
    let result = BookingLifecycle::new(&api, &config()).with_today(today()).run().await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        step_names(&result),
        vec!["ping", "auth", "create", "get", "update", "delete", "verify_deleted"]
    );
    let checked: Vec<_> = result.validations.iter().map(|v| v.step.as_str()).collect();
    assert_eq!(checked, vec!["create", "get", "update"]);
    assert!(result.validations.iter().all(|v| v.report.valid));
    assert!(api.bookings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_credentials_stop_at_auth() {
    let api = FakeBooker::default();
    let config = BookerConfig {
        password: "wrong".to_string(),
        ..config()
    };
    let result = BookingLifecycle::new(&api, &config).with_today(today()).run().await;

    assert!(!result.success);
    assert_eq!(step_names(&result), vec!["ping", "auth"]);
    assert!(!result.steps[1].success);
    assert!(result.error.as_deref().unwrap().contains("no token"));
    assert!(api.bookings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_string_price_fails_create_validation() {
    let api = FakeBooker {
        stringly_prices: true,
        ..Default::default()
    };
    let result = BookingLifecycle::new(&api, &config()).with_today(today()).run().await;

    assert!(!result.success);
    assert_eq!(step_names(&result).last(), Some(&"create"));
    assert_eq!(result.validations.len(), 1);

    let report = &result.validations[0].report;
    assert!(!report.valid);
    assert!(report.has_type_error("totalprice"));
    assert!(report.has_value_error("totalprice"));
    assert_eq!(report.summary.total_errors, 2);
}

#[tokio::test]
async fn test_booking_surviving_delete_is_reported() {
    let api = FakeBooker {
        sticky_delete: true,
        ..Default::default()
    };
    let result = BookingLifecycle::new(&api, &config()).with_today(today()).run().await;

    assert!(!result.success);
    let last = result.steps.last().unwrap();
    assert_eq!(last.name, "verify_deleted");
    assert_eq!(last.error.as_deref(), Some("verify_deleted: expected HTTP 404, got 200"));
}

#[tokio::test]
async fn test_same_seed_same_bookings() {
    let keep = || FakeBooker {
        sticky_delete: true,
        ..Default::default()
    };
    let (first, second) = (keep(), keep());
    BookingLifecycle::new(&first, &config()).with_today(today()).run().await;
    BookingLifecycle::new(&second, &config()).with_today(today()).run().await;

    let first = first.bookings.lock().unwrap().clone();
    let second = second.bookings.lock().unwrap().clone();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}
