use crate::error::RelayError;
use crate::models::scan::{BranchType, ScanContext};
use serde::Deserialize;
use serde_json::Value;

/// Query string of `POST /dingtalk`.
#[derive(Debug, Deserialize, Default)]
pub struct WebhookQuery {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub sonar_token: Option<String>,
}

/// Body SonarQube posts when an analysis finishes. Every field is optional and
/// kept loosely typed; the shape varies between SonarQube editions and versions.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SonarWebhook {
    #[serde(default)]
    pub server_url: Option<Value>,
    #[serde(default)]
    pub project: Option<Value>,
    #[serde(default)]
    pub branch: Option<Value>,
    #[serde(default)]
    pub revision: Option<Value>,
    #[serde(default)]
    pub analysed_at: Option<Value>,
}

/// String value of `parent[key]`, or empty if the parent is not an object, the
/// key is missing or the value is not a string.
pub fn string_field(parent: Option<&Value>, key: &str) -> String {
    parent
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn as_string(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

pub fn parse_webhook(query: &WebhookQuery, body: &[u8]) -> Result<ScanContext, RelayError> {
    if query.access_token.trim().is_empty() {
        return Err(RelayError::validation("missing access token"));
    }

    let body: Value = serde_json::from_slice(body)?;
    if !body.is_object() {
        return Err(RelayError::decode("webhook body is not a JSON object"));
    }
    let hook: SonarWebhook = serde_json::from_value(body)?;

    let project = hook.project.as_ref();
    let branch = hook.branch.as_ref();

    Ok(ScanContext {
        access_token: query.access_token.clone(),
        sonar_token: query.sonar_token.clone().filter(|t| !t.is_empty()),
        server_url: as_string(hook.server_url.as_ref())
            .trim_end_matches('/')
            .to_string(),
        project_name: string_field(project, "name"),
        project_key: string_field(project, "key"),
        project_url: string_field(project, "url"),
        branch_name: string_field(branch, "name"),
        branch_url: string_field(branch, "url"),
        branch_type: BranchType::from_sonar(&string_field(branch, "type")),
        revision: as_string(hook.revision.as_ref()),
        analysed_at: as_string(hook.analysed_at.as_ref()),
        ..Default::default()
    })
}
