pub mod dingtalk;
pub mod scan;
pub mod sonar;
pub mod webhook;
