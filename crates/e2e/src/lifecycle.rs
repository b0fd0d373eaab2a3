//! Booking API lifecycle: auth, create, read, update, delete, verify

use std::time::Instant;

use bookcheck_common::{booking, validate, BookingPayload, RecordSchema, ValidationReport};
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::booker::{ApiResponse, BookingApi};
use crate::config::BookerConfig;
use crate::error::{E2eError, E2eResult};
use crate::runner::{StepResult, TestResult, ValidationRecord};

pub const LIFECYCLE_TEST_NAME: &str = "booking-lifecycle";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    Ping,
    Auth,
    Create,
    Get,
    Update,
    Delete,
    VerifyDeleted,
}

impl LifecycleStep {
    pub const ALL: [LifecycleStep; 7] = [
        LifecycleStep::Ping,
        LifecycleStep::Auth,
        LifecycleStep::Create,
        LifecycleStep::Get,
        LifecycleStep::Update,
        LifecycleStep::Delete,
        LifecycleStep::VerifyDeleted,
    ];
}

impl std::fmt::Display for LifecycleStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleStep::Ping => write!(f, "ping"),
            LifecycleStep::Auth => write!(f, "auth"),
            LifecycleStep::Create => write!(f, "create"),
            LifecycleStep::Get => write!(f, "get"),
            LifecycleStep::Update => write!(f, "update"),
            LifecycleStep::Delete => write!(f, "delete"),
            LifecycleStep::VerifyDeleted => write!(f, "verify_deleted"),
        }
    }
}

/// Values carried from one step to the next
#[derive(Debug, Default)]
struct LifecycleState {
    token: Option<String>,
    booking_id: Option<u64>,
    current: Option<BookingPayload>,
    validations: Vec<ValidationRecord>,
}

/// Runs the booking lifecycle against any [`BookingApi`]
pub struct BookingLifecycle<'a, A: BookingApi + ?Sized> {
    api: &'a A,
    username: String,
    password: String,
    schema: &'static RecordSchema,
    rng: StdRng,
    today: NaiveDate,
}

impl<'a, A: BookingApi + ?Sized> BookingLifecycle<'a, A> {
    pub fn new(api: &'a A, config: &BookerConfig) -> Self {
        let schema = if config.strict_dates {
            booking::strict_schema()
        } else {
            booking::schema()
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            api,
            username: config.username.clone(),
            password: config.password.clone(),
            schema,
            rng,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin the reference date used for generated bookings
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Execute every step in order, stopping at the first failure
    pub async fn run(mut self) -> TestResult {
        let start = Instant::now();
        let mut state = LifecycleState::default();
        let mut steps = Vec::new();
        let mut failure = None;

        for step in LifecycleStep::ALL {
            let step_start = Instant::now();
            let outcome = self.execute(step, &mut state).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => {
                    info!("✓ {} ({} ms)", step, duration_ms);
                    steps.push(StepResult::passed(step.to_string(), duration_ms));
                }
                Err(e) => {
                    error!("✗ {} - {}", step, e);
                    steps.push(StepResult::failed(step.to_string(), duration_ms, e.to_string()));
                    failure = Some(format!("{}: {}", step, e));
                    break;
                }
            }
        }

        TestResult {
            name: LIFECYCLE_TEST_NAME.to_string(),
            success: failure.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            validations: state.validations,
            error: failure,
        }
    }

    async fn execute(&mut self, step: LifecycleStep, state: &mut LifecycleState) -> E2eResult<()> {
        match step {
            LifecycleStep::Ping => {
                let response = self.api.ping().await?;
                expect_status("ping", &response, 201)
            }
            LifecycleStep::Auth => {
                let response = self.api.auth(&self.username, &self.password).await?;
                expect_status("auth", &response, 200)?;
                let token = response.body.get("token").and_then(Value::as_str).ok_or_else(|| {
                    E2eError::AssertionFailed(format!("auth response has no token: {}", response.body))
                })?;
                state.token = Some(token.to_string());
                Ok(())
            }
            LifecycleStep::Create => {
                let payload = BookingPayload::generate(&mut self.rng, self.today);
                let response = self.api.create(&payload).await?;
                expect_status("create", &response, 200)?;

                let id = response.body.get("bookingid").and_then(Value::as_u64).ok_or_else(|| {
                    E2eError::AssertionFailed(format!(
                        "bookingid must be a number, got {}",
                        response.body.get("bookingid").unwrap_or(&Value::Null)
                    ))
                })?;
                let echoed = response.body.get("booking").unwrap_or(&Value::Null);
                self.check("create", echoed, &payload, state)?;

                info!(booking_id = id, "created booking for {} {}", payload.firstname, payload.lastname);
                state.booking_id = Some(id);
                state.current = Some(payload);
                Ok(())
            }
            LifecycleStep::Get => {
                let (id, _) = require_booking(state)?;
                let response = self.api.get(id).await?;
                expect_status("get", &response, 200)?;
                let payload = state.current.clone().ok_or_else(missing_booking)?;
                self.check("get", &response.body, &payload, state)
            }
            LifecycleStep::Update => {
                let (id, token) = require_booking(state)?;
                let original = state.current.clone().ok_or_else(missing_booking)?;
                let update = BookingPayload::random_unlike(&mut self.rng, self.today, &original);

                let response = self.api.update(id, &token, &update).await?;
                expect_status("update", &response, 200)?;
                self.check("update", &response.body, &update, state)?;

                if response.body.get("firstname").and_then(Value::as_str) == Some(original.firstname.as_str()) {
                    return Err(E2eError::AssertionFailed(format!(
                        "booking {} still carries the original firstname {:?}",
                        id, original.firstname
                    )));
                }
                state.current = Some(update);
                Ok(())
            }
            LifecycleStep::Delete => {
                let (id, token) = require_booking(state)?;
                let response = self.api.delete(id, &token).await?;
                expect_status("delete", &response, 201)
            }
            LifecycleStep::VerifyDeleted => {
                let (id, _) = require_booking(state)?;
                let response = self.api.get(id).await?;
                expect_status("verify_deleted", &response, 404)
            }
        }
    }

    fn check(
        &self,
        context: &str,
        actual: &Value,
        expected: &BookingPayload,
        state: &mut LifecycleState,
    ) -> E2eResult<()> {
        let report = validate(actual, &expected.to_value(), self.schema);
        let outcome = validation_outcome(context, &report);
        if outcome.is_err() {
            warn!("{} validation failed:\n{}", context, report);
        }
        state.validations.push(ValidationRecord {
            step: context.to_string(),
            report,
        });
        outcome
    }
}

fn validation_outcome(context: &str, report: &ValidationReport) -> E2eResult<()> {
    if report.valid {
        return Ok(());
    }
    Err(E2eError::Validation {
        context: context.to_string(),
        type_errors: report.summary.type_error_count,
        value_errors: report.summary.value_error_count,
        details: report.errors.join("; "),
    })
}

fn expect_status(operation: &str, response: &ApiResponse, expected: u16) -> E2eResult<()> {
    if response.status == expected {
        Ok(())
    } else {
        Err(E2eError::UnexpectedStatus {
            operation: operation.to_string(),
            expected,
            actual: response.status,
        })
    }
}

fn require_booking(state: &LifecycleState) -> E2eResult<(u64, String)> {
    match (state.booking_id, &state.token) {
        (Some(id), Some(token)) => Ok((id, token.clone())),
        _ => Err(missing_booking()),
    }
}

fn missing_booking() -> E2eError {
    E2eError::AssertionFailed("no booking was created by an earlier step".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_status() {
        let response = ApiResponse::new(418, Value::Null);
        assert!(expect_status("brew", &response, 418).is_ok());
        let err = expect_status("brew", &response, 200).unwrap_err();
        assert_eq!(err.to_string(), "brew: expected HTTP 200, got 418");
    }

    #[test]
    fn test_validation_outcome_carries_counts() {
        let report = ValidationReport::from_violations(vec![]);
        assert!(validation_outcome("get", &report).is_ok());

        let value = serde_json::json!({"firstname": 1});
        let report = validate(&value, &value, booking::schema());
        match validation_outcome("get", &report) {
            Err(E2eError::Validation { type_errors, value_errors, .. }) => {
                assert_eq!(type_errors, report.summary.type_error_count);
                assert_eq!(value_errors, 0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
