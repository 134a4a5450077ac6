pub mod dingtalk;
