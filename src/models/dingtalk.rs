use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MarkdownMessage {
    pub title: String,
    pub text: String,
}

/// Body of a robot `send` call.
#[derive(Debug, Serialize)]
pub struct RobotMessage<'a> {
    pub msgtype: &'static str,
    pub markdown: &'a MarkdownMessage,
}

impl<'a> RobotMessage<'a> {
    pub fn markdown(message: &'a MarkdownMessage) -> Self {
        Self {
            msgtype: "markdown",
            markdown: message,
        }
    }
}

/// Acknowledgment returned by the robot endpoint. `errcode` is left untyped so
/// a malformed code is reported as a delivery failure, not a decode failure.
#[derive(Debug, Deserialize, Default)]
pub struct RobotAck {
    #[serde(default)]
    pub errcode: Option<Value>,
    #[serde(default)]
    pub errmsg: Option<String>,
}

impl RobotAck {
    pub fn code(&self) -> Option<i64> {
        self.errcode.as_ref().and_then(Value::as_i64)
    }
}
