//! Playwright browser automation
//!
//! A flow is compiled into a single Node script so that every step shares
//! one browser page. The script reports each step on its own stdout line:
//!
//! ```text
//! @@step {"index":0,"ok":true,"ms":412,"value":null}
//! ```

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::runner::StepResult;
use crate::spec::{FlowSpec, FlowStep};

/// Prefix of the per-step report lines printed by generated scripts
pub const STEP_MARKER: &str = "@@step";

static STEP_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@step (\{.*\})\s*$").expect("step line pattern is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Used when a flow names no site of its own
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
    /// Upper bound for a whole flow
    pub timeout: Duration,
    /// Directory whose `node_modules` provides playwright
    pub work_dir: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.saucedemo.com".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            timeout: Duration::from_secs(120),
            work_dir: PathBuf::from("."),
        }
    }
}

/// One decoded `@@step` line
#[derive(Debug, Deserialize)]
struct StepLine {
    index: usize,
    ok: bool,
    ms: u64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    value: Option<Value>,
}

/// Drives flows through a Node + Playwright subprocess
pub struct PlaywrightDriver {
    config: PlaywrightConfig,
}

impl PlaywrightDriver {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    /// Check if Playwright is installed
    pub fn ensure_installed(&self) -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(&self.config.work_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Run every step of `flow` in one browser session
    pub async fn run_flow(&self, flow: &FlowSpec) -> E2eResult<Vec<StepResult>> {
        std::fs::create_dir_all(self.config.work_dir.join(&self.config.screenshot_dir))?;

        // Inside the work dir so `require('playwright')` resolves
        let script_dir = tempfile::Builder::new()
            .prefix(".bookcheck-flow-")
            .tempdir_in(&self.config.work_dir)?;
        let script_path = script_dir.path().join("flow.js");
        std::fs::write(&script_path, self.build_script(flow))?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut command = TokioCommand::new("node");
        command
            .arg(&script_path)
            .current_dir(&self.config.work_dir)
            .kill_on_drop(true);
        let output = tokio::time::timeout(self.config.timeout, command.output())
            .await
            .map_err(|_| E2eError::Timeout(format!("flow {} after {:?}", flow.name, self.config.timeout)))??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let decoded = self.decode(flow, &stdout);

        for message in reported_logs(flow, &decoded) {
            info!("[FLOW LOG] {}", message);
        }
        for (_, result) in &decoded {
            if let Some(value) = &result.value {
                debug!(step = %result.name, %value, "step returned a value");
            }
        }

        let failed = decoded.iter().any(|(_, r)| !r.success);
        if !output.status.success() && !failed {
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }
        if !failed {
            if let Some(missing) = first_unreported(flow, &decoded) {
                return Err(E2eError::StepFailed {
                    step: missing.label(),
                    reason: "script ended without reporting this step".to_string(),
                });
            }
        }
        if !stderr.trim().is_empty() {
            warn!("{} stderr: {}", flow.name, stderr.trim());
        }

        Ok(decoded.into_iter().map(|(_, result)| result).collect())
    }

    /// Decode the `@@step` lines of a script's stdout, in step order
    pub fn parse_output(&self, flow: &FlowSpec, stdout: &str) -> Vec<StepResult> {
        self.decode(flow, stdout)
            .into_iter()
            .map(|(_, result)| result)
            .collect()
    }

    /// Like [`parse_output`](Self::parse_output), keeping the step index each result reports
    fn decode(&self, flow: &FlowSpec, stdout: &str) -> Vec<(usize, StepResult)> {
        let mut results = Vec::new();

        for line in stdout.lines() {
            let Some(caps) = STEP_LINE.captures(line) else {
                continue;
            };
            let parsed: StepLine = match serde_json::from_str(&caps[1]) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Ignoring malformed step line {:?}: {}", line, e);
                    continue;
                }
            };
            let Some(step) = flow.steps.get(parsed.index) else {
                warn!("Ignoring report for unknown step {}", parsed.index);
                continue;
            };

            let mut result = if parsed.ok {
                StepResult::passed(step.label(), parsed.ms)
            } else {
                StepResult::failed(
                    step.label(),
                    parsed.ms,
                    parsed.error.unwrap_or_else(|| "unknown error".to_string()),
                )
            };
            if let (true, FlowStep::Screenshot { name, .. }) = (parsed.ok, step) {
                result.screenshot_path = Some(self.config.screenshot_dir.join(format!("{}.png", name)));
            }
            result.value = parsed.value.filter(|v| !v.is_null());
            results.push((parsed.index, result));
        }

        results
    }

    /// Build the Playwright script for a flow
    pub fn build_script(&self, flow: &FlowSpec) -> String {
        let base_url = flow.base_url.as_deref().unwrap_or(&self.config.base_url);
        let (width, height) = match &flow.viewport {
            Some(v) => (v.width, v.height),
            None => (self.config.viewport_width, self.config.viewport_height),
        };
        let mut script = String::new();

        script.push_str(&format!(
            r#"const {{ {browser} }} = require('playwright');
const {{ expect }} = require('@playwright/test');

const report = (entry) => console.log('{marker} ' + JSON.stringify(entry));
const step = async (index, body) => {{
  const started = Date.now();
  try {{
    const value = await body();
    report({{ index, ok: true, ms: Date.now() - started, value: value === undefined ? null : value }});
  }} catch (error) {{
    report({{ index, ok: false, ms: Date.now() - started, error: String((error && error.message) || error) }});
    throw error;
  }}
}};

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();

  try {{
"#,
            browser = self.config.browser.as_str(),
            marker = STEP_MARKER,
            headless = self.config.headless,
            width = width,
            height = height,
        ));

        for (i, flow_step) in flow.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, flow_step.label()));
            script.push_str(&format!("    await step({}, async () => {{\n", i));
            script.push_str(&self.step_to_js(flow_step, base_url));
            script.push_str("\n    });\n");
        }

        script.push_str(
            r#"  } catch (error) {
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Body of one step's async function
    fn step_to_js(&self, step: &FlowStep, base_url: &str) -> String {
        match step {
            FlowStep::Navigate { url, wait_for_selector } => {
                let mut js = format!("      await page.goto({});", js_str(&resolve_url(base_url, url)));
                if let Some(sel) = wait_for_selector {
                    js.push_str(&format!("\n      await page.waitForSelector({});", js_str(sel)));
                }
                js
            }
            FlowStep::Click { selector, timeout_ms } => format!(
                "      await page.click({}, {{ timeout: {} }});",
                js_str(selector),
                timeout_ms.unwrap_or(5000)
            ),
            FlowStep::Fill { selector, value } => {
                format!("      await page.fill({}, {});", js_str(selector), js_str(value))
            }
            FlowStep::Press { selector, key } => match selector {
                Some(sel) => format!("      await page.locator({}).press({});", js_str(sel), js_str(key)),
                None => format!("      await page.keyboard.press({});", js_str(key)),
            },
            FlowStep::Wait { selector, timeout_ms, state } => format!(
                "      await page.waitForSelector({}, {{ state: '{}', timeout: {} }});",
                js_str(selector),
                state.as_str(),
                timeout_ms
            ),
            FlowStep::WaitForLoad { state } => {
                format!("      await page.waitForLoadState('{}');", state.as_str())
            }
            FlowStep::Sleep { ms } => format!("      await page.waitForTimeout({});", ms),
            FlowStep::Assert { selector, visible, text, text_contains, count } => {
                let locator = format!("page.locator({})", js_str(selector));
                let mut assertions = Vec::new();

                match visible {
                    Some(true) => assertions.push(format!("      await expect({}).toBeVisible();", locator)),
                    Some(false) => assertions.push(format!("      await expect({}).toBeHidden();", locator)),
                    None => {}
                }
                if let Some(t) = text {
                    assertions.push(format!("      await expect({}).toHaveText({});", locator, js_str(t)));
                }
                if let Some(tc) = text_contains {
                    assertions.push(format!("      await expect({}).toContainText({});", locator, js_str(tc)));
                }
                if let Some(c) = count {
                    assertions.push(format!("      await expect({}).toHaveCount({});", locator, c));
                }

                assertions.join("\n")
            }
            FlowStep::Screenshot { name, selector, full_page } => {
                let path = self.config.screenshot_dir.join(format!("{}.png", name));
                let path = js_str(&path.to_string_lossy());
                match selector {
                    Some(sel) => format!("      await page.locator({}).screenshot({{ path: {} }});", js_str(sel), path),
                    None => format!("      await page.screenshot({{ path: {}, fullPage: {} }});", path, full_page),
                }
            }
            FlowStep::Evaluate { script, expected } => {
                let mut js = format!("      const value = await page.evaluate(() => {{ {} }});", script);
                if let Some(expected) = expected {
                    js.push_str(&format!(
                        r#"
      const expected = {};
      if (JSON.stringify(value) !== JSON.stringify(expected)) {{
        throw new Error('evaluate returned ' + JSON.stringify(value) + ', expected ' + JSON.stringify(expected));
      }}"#,
                        expected
                    ));
                }
                js.push_str("\n      return value;");
                js
            }
            FlowStep::Log { message } => format!("      return {};", js_str(message)),
        }
    }
}

/// Quote a string as a JavaScript literal
fn js_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Absolute URLs pass through; anything else is joined onto `base`
fn resolve_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
    }
}

/// Messages of the log steps the script reported reaching
fn reported_logs<'a>(flow: &'a FlowSpec, decoded: &[(usize, StepResult)]) -> Vec<&'a str> {
    decoded
        .iter()
        .filter_map(|(index, _)| match flow.steps.get(*index) {
            Some(FlowStep::Log { message }) => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

/// First step with no report at all
fn first_unreported<'a>(flow: &'a FlowSpec, decoded: &[(usize, StepResult)]) -> Option<&'a FlowStep> {
    flow.steps
        .iter()
        .enumerate()
        .find(|(i, _)| !decoded.iter().any(|(index, _)| index == i))
        .map(|(_, step)| step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn flow(yaml: &str) -> FlowSpec {
        FlowSpec::from_yaml(yaml).unwrap()
    }

    fn driver() -> PlaywrightDriver {
        PlaywrightDriver::new(PlaywrightConfig {
            base_url: "https://shop.test".to_string(),
            ..Default::default()
        })
    }

    const CHECKOUT: &str = r#"
name: checkout
steps:
  - action: navigate
    url: /cart.html
  - action: fill
    selector: '#first-name'
    value: "O'Brien"
  - action: screenshot
    name: cart
  - action: evaluate
    script: return document.title;
    expected: Swag Labs
"#;

    #[test_case("https://shop.test", "/", "https://shop.test/" ; "root")]
    #[test_case("https://shop.test/", "inventory.html", "https://shop.test/inventory.html" ; "relative")]
    #[test_case("https://shop.test", "http://other.test/x", "http://other.test/x" ; "absolute")]
    fn test_resolve_url(base: &str, url: &str, expected: &str) {
        assert_eq!(resolve_url(base, url), expected);
    }

    #[test]
    fn test_script_runs_all_steps_in_one_page() {
        let script = driver().build_script(&flow(CHECKOUT));

        assert_eq!(script.matches("browser.newContext").count(), 1);
        assert!(script.contains(r#"await page.goto("https://shop.test/cart.html");"#));
        assert!(script.contains(r##"await page.fill("#first-name", "O'Brien");"##));
        assert!(script.contains("fullPage: false"));
        assert!(script.contains(r#"const expected = "Swag Labs";"#));
        for i in 0..4 {
            assert!(script.contains(&format!("await step({}, async", i)));
        }
    }

    #[test]
    fn test_flow_base_url_wins() {
        let mut spec = flow(CHECKOUT);
        spec.base_url = Some("https://www.saucedemo.com".to_string());
        let script = driver().build_script(&spec);
        assert!(script.contains("https://www.saucedemo.com/cart.html"));
    }

    #[test]
    fn test_parse_output() {
        let spec = flow(CHECKOUT);
        let stdout = concat!(
            "@@step {\"index\":0,\"ok\":true,\"ms\":300,\"value\":null}\n",
            "noise from the page\n",
            "@@step {\"index\":2,\"ok\":true,\"ms\":40,\"value\":null}\n",
            "@@step {\"index\":3,\"ok\":false,\"ms\":5,\"error\":\"evaluate returned \\\"Shop\\\"\"}\n",
            "@@step {\"index\":9,\"ok\":true,\"ms\":1}\n",
        );

        let results = driver().parse_output(&spec, stdout);
        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert_eq!(results[0].name, "navigate:/cart.html");
        assert_eq!(
            results[1].screenshot_path,
            Some(PathBuf::from("test-results/screenshots/cart.png"))
        );
        assert!(!results[2].success);
        assert_eq!(results[2].error.as_deref(), Some("evaluate returned \"Shop\""));
    }

    #[test]
    fn test_parse_output_keeps_values() {
        let spec = flow("name: v\nsteps:\n  - action: evaluate\n    script: return 3;\n");
        let results = driver().parse_output(&spec, "@@step {\"index\":0,\"ok\":true,\"ms\":2,\"value\":3}");
        assert_eq!(results[0].value, Some(serde_json::json!(3)));
    }

    const LOGGED: &str = r#"
name: logged
steps:
  - action: navigate
    url: /
  - action: log
    message: on the inventory page
  - action: click
    selector: '#add'
"#;

    #[test]
    fn test_logs_follow_reported_index() {
        let spec = flow(LOGGED);
        let stdout = concat!(
            "@@step {\"index\":0,\"ok\":true,\"ms\":300\n",
            "@@step {\"index\":1,\"ok\":true,\"ms\":0}\n",
            "@@step {\"index\":2,\"ok\":true,\"ms\":12}\n",
        );

        let decoded = driver().decode(&spec, stdout);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].0, 1);
        assert_eq!(reported_logs(&spec, &decoded), vec!["on the inventory page"]);
        assert_eq!(
            first_unreported(&spec, &decoded).map(FlowStep::label),
            Some("navigate:/".to_string())
        );
    }

    #[test]
    fn test_every_step_reported() {
        let spec = flow(LOGGED);
        let stdout = concat!(
            "@@step {\"index\":2,\"ok\":true,\"ms\":12}\n",
            "@@step {\"index\":0,\"ok\":true,\"ms\":300}\n",
            "@@step {\"index\":1,\"ok\":true,\"ms\":0}\n",
        );

        let decoded = driver().decode(&spec, stdout);
        assert!(first_unreported(&spec, &decoded).is_none());
        assert!(reported_logs(&spec, &[]).is_empty());
    }
}
