use crate::error::RelayError;
use crate::models::scan::{BranchType, Measures, ScanContext};
use crate::models::sonar::{Measure, MeasuresResponse};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use log::debug;

/// Metrics requested for every analysis, overall first, then new code.
pub const METRIC_KEYS: [&str; 11] = [
    "alert_status",
    "bugs",
    "code_smells",
    "vulnerabilities",
    "coverage",
    "duplicated_lines_density",
    "new_bugs",
    "new_code_smells",
    "new_vulnerabilities",
    "new_coverage",
    "new_duplicated_lines_density",
];

pub struct SonarClient {
    client: reqwest::Client,
}

impl SonarClient {
    /// The client picks up `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` from the
    /// environment.
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("sonar-dingtalk-relay"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub fn measures_url(ctx: &ScanContext) -> String {
        format!("{}/api/measures/component", ctx.server_url)
    }

    pub fn measures_query(ctx: &ScanContext) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("additionalFields", "metrics".to_string()),
            ("component", ctx.project_key.clone()),
            ("metricKeys", METRIC_KEYS.join(",")),
        ];

        if !ctx.branch_name.is_empty() {
            match ctx.branch_type {
                BranchType::PullRequest => query.push(("pullRequest", ctx.branch_name.clone())),
                BranchType::Branch => query.push(("branch", ctx.branch_name.clone())),
            }
        }

        query
    }

    pub async fn fetch_measures(&self, ctx: &ScanContext) -> Result<Measures, RelayError> {
        let url = Self::measures_url(ctx);
        debug!("GET {} component={} branch={}", url, ctx.project_key, ctx.branch_name);

        let mut request = self.client.get(&url).query(&Self::measures_query(ctx));
        if let Some(token) = &ctx.sonar_token {
            request = request.basic_auth(token, None::<&str>);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            debug!("SonarQube API error {}: {}", status, error_text);
            return Err(RelayError::network(format!("SonarQube API error: {}", status)));
        }

        let response_text = response.text().await?;
        debug!("Raw measures response length: {} bytes", response_text.len());

        match serde_json::from_str::<MeasuresResponse>(&response_text) {
            Ok(parsed) => {
                if let Some(key) = parsed.component_key() {
                    debug!("Measures for component {}: {} records", key, parsed.measures().len());
                }
                Ok(extract_measures(parsed.measures()))
            }
            Err(e) => {
                debug!("Failed to parse measures JSON: {}", e);
                debug!("Response preview: {}", preview(&response_text));
                Err(RelayError::decode(format!("Failed to parse SonarQube measures response: {}", e)))
            }
        }
    }
}

fn preview(text: &str) -> &str {
    let mut end = text.len().min(500);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Value of the first record named `metric`: its `value`, else its
/// `period.value`, else empty. Non-string values count as empty.
pub fn find_measure(measures: &[Measure], metric: &str) -> String {
    measures
        .iter()
        .find(|m| m.metric() == Some(metric))
        .and_then(Measure::reported_value)
        .unwrap_or_default()
        .to_string()
}

pub fn extract_measures(measures: &[Measure]) -> Measures {
    Measures {
        alert_status: find_measure(measures, "alert_status"),
        bugs: find_measure(measures, "bugs"),
        vulnerabilities: find_measure(measures, "vulnerabilities"),
        code_smells: find_measure(measures, "code_smells"),
        coverage: find_measure(measures, "coverage"),
        duplicated_lines_density: find_measure(measures, "duplicated_lines_density"),
        new_bugs: find_measure(measures, "new_bugs"),
        new_vulnerabilities: find_measure(measures, "new_vulnerabilities"),
        new_code_smells: find_measure(measures, "new_code_smells"),
        new_coverage: find_measure(measures, "new_coverage"),
        new_duplicated_lines_density: find_measure(measures, "new_duplicated_lines_density"),
    }
}
