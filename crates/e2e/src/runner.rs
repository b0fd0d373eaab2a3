//! Test runner that orchestrates the booking lifecycle and UI flows

use std::path::PathBuf;
use std::time::Instant;

use bookcheck_common::ValidationReport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::booker::BookerClient;
use crate::config::BookerConfig;
use crate::error::{E2eError, E2eResult};
use crate::lifecycle::{BookingLifecycle, LIFECYCLE_TEST_NAME};
use crate::playwright::{PlaywrightConfig, PlaywrightDriver};
use crate::spec::FlowSpec;

/// Tag that selects the API lifecycle test
pub const API_TAG: &str = "api";

/// Environment variable that enables live runs of the e2e harness
pub const LIVE_ENV: &str = "BOOKCHECK_E2E";

/// Whether the harness should touch live services: `--live` among `args`,
/// or a truthy value of [`LIVE_ENV`].
///
/// Checked before argument parsing, since cargo hands libtest filters and
/// flags to `harness = false` targets.
pub fn live_run_requested<S: AsRef<str>>(args: &[S], env_value: Option<&str>) -> bool {
    args.iter().any(|a| a.as_ref() == "--live")
        || env_value.is_some_and(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "false" | "no" | "off"
            )
        })
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
    /// Value produced by the step, such as an evaluate result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl StepResult {
    pub fn passed(name: String, duration_ms: u64) -> Self {
        Self {
            name,
            success: true,
            duration_ms,
            error: None,
            screenshot_path: None,
            value: None,
        }
    }

    pub fn failed(name: String, duration_ms: u64, error: String) -> Self {
        Self {
            name,
            success: false,
            duration_ms,
            error: Some(error),
            screenshot_path: None,
            value: None,
        }
    }
}

/// Validation report produced while checking one API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub step: String,
    pub report: ValidationReport,
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub validations: Vec<ValidationRecord>,
    pub error: Option<String>,
}

impl TestResult {
    /// A test that could not run at all
    pub fn errored(name: &str, error: &E2eError) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration_ms: 0,
            steps: vec![],
            validations: vec![],
            error: Some(error.to_string()),
        }
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn from_results(results: Vec<TestResult>, skipped: usize, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len() + skipped,
            passed,
            failed: results.len() - passed,
            skipped,
            duration_ms,
            results,
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub booker: BookerConfig,
    pub playwright: PlaywrightConfig,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Run the booking API lifecycle
    pub run_api: bool,
    /// Run the UI flows found in `specs_dir`
    pub run_ui: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            booker: BookerConfig::default(),
            playwright: PlaywrightConfig::default(),
            specs_dir: PathBuf::from("crates/e2e/specs"),
            output_dir: PathBuf::from("test-results"),
            run_api: true,
            run_ui: true,
        }
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: RunnerConfig,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner {
    /// Create a new test runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a test runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the lifecycle and every flow, as enabled
    pub async fn run_all(&self) -> E2eResult<TestSuiteResult> {
        let flows = if self.config.run_ui {
            FlowSpec::load_all(&self.config.specs_dir)?
        } else {
            vec![]
        };
        self.run_suite(self.config.run_api, &flows).await
    }

    /// Run tests matching a tag; `api` selects the lifecycle
    pub async fn run_tagged(&self, tag: &str) -> E2eResult<TestSuiteResult> {
        let flows: Vec<FlowSpec> = if self.config.run_ui {
            FlowSpec::load_all(&self.config.specs_dir)?
                .into_iter()
                .filter(|f| f.has_tag(tag))
                .collect()
        } else {
            vec![]
        };
        self.run_suite(self.config.run_api && tag == API_TAG, &flows).await
    }

    /// Run a specific test by name
    pub async fn run_test(&self, name: &str) -> E2eResult<TestResult> {
        if name == LIFECYCLE_TEST_NAME {
            return self.run_lifecycle().await;
        }

        let flow = FlowSpec::load_all(&self.config.specs_dir)?
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {}", name)))?;
        self.run_flow(&flow).await
    }

    async fn run_suite(&self, with_lifecycle: bool, flows: &[FlowSpec]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut skipped = 0;

        info!(
            "Running {} test(s)...",
            flows.len() + usize::from(with_lifecycle)
        );

        if with_lifecycle {
            let result = self
                .run_lifecycle()
                .await
                .unwrap_or_else(|e| TestResult::errored(LIFECYCLE_TEST_NAME, &e));
            log_result(&result);
            results.push(result);
        }

        if !flows.is_empty() {
            let driver = PlaywrightDriver::new(self.config.playwright.clone());
            match driver.ensure_installed() {
                Ok(()) => {
                    for flow in flows {
                        let result = self
                            .execute_flow(&driver, flow)
                            .await
                            .unwrap_or_else(|e| TestResult::errored(&flow.name, &e));
                        log_result(&result);
                        results.push(result);
                    }
                }
                Err(e) => {
                    error!("Skipping {} UI flow(s): {}", flows.len(), e);
                    skipped = flows.len();
                }
            }
        }

        let suite = TestSuiteResult::from_results(results, skipped, start.elapsed().as_millis() as u64);

        info!("");
        info!(
            "Test Results: {} passed, {} failed, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.duration_ms
        );

        Ok(suite)
    }

    /// Run the booking API lifecycle against the configured service
    pub async fn run_lifecycle(&self) -> E2eResult<TestResult> {
        let client = BookerClient::new(self.config.booker.clone())?;
        debug!("Running {} against {}", LIFECYCLE_TEST_NAME, self.config.booker.base_url);
        Ok(BookingLifecycle::new(&client, &self.config.booker).run().await)
    }

    /// Run a single UI flow
    pub async fn run_flow(&self, flow: &FlowSpec) -> E2eResult<TestResult> {
        let driver = PlaywrightDriver::new(self.config.playwright.clone());
        driver.ensure_installed()?;
        self.execute_flow(&driver, flow).await
    }

    async fn execute_flow(&self, driver: &PlaywrightDriver, flow: &FlowSpec) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running flow: {}", flow.name);

        let steps = driver.run_flow(flow).await?;
        let error = steps
            .iter()
            .find(|s| !s.success)
            .map(|s| format!("{}: {}", s.name, s.error.as_deref().unwrap_or("unknown error")));

        Ok(TestResult {
            name: flow.name.clone(),
            success: error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            validations: vec![],
            error,
        })
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn log_result(result: &TestResult) {
    if result.success {
        info!("✓ {} ({} ms)", result.name, result.duration_ms);
    } else {
        error!(
            "✗ {} - {}",
            result.name,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}
