use serde::Deserialize;
use serde_json::Value;

/// Response of `GET /api/measures/component`.
#[derive(Debug, Deserialize, Default)]
pub struct MeasuresResponse {
    #[serde(default)]
    pub component: Option<Component>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Component {
    #[serde(default)]
    pub key: Option<Value>,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

/// Overall metrics carry `value`; new code metrics on older servers only
/// carry `period.value`. Fields stay untyped so one odd record only loses
/// its own value.
#[derive(Debug, Deserialize, Default)]
pub struct Measure {
    #[serde(default)]
    pub metric: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub period: Option<Value>,
}

impl Measure {
    pub fn metric(&self) -> Option<&str> {
        self.metric.as_ref().and_then(Value::as_str)
    }

    /// `value` if it is a string, else `period.value` if that is a string.
    pub fn reported_value(&self) -> Option<&str> {
        match &self.value {
            Some(value) => value.as_str(),
            None => self
                .period
                .as_ref()
                .and_then(|p| p.get("value"))
                .and_then(Value::as_str),
        }
    }
}

impl MeasuresResponse {
    pub fn component_key(&self) -> Option<&str> {
        self.component
            .as_ref()
            .and_then(|c| c.key.as_ref())
            .and_then(Value::as_str)
    }

    pub fn measures(&self) -> &[Measure] {
        self.component
            .as_ref()
            .map(|c| c.measures.as_slice())
            .unwrap_or_default()
    }
}
