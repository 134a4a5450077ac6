pub mod dingtalk;
pub mod report;
pub mod sonar;
