use clap::Parser;
use std::time::Duration;

pub const DEFAULT_DINGTALK_URL: &str = "https://oapi.dingtalk.com/robot/send";

/// Relays SonarQube analysis webhooks to DingTalk group robots.
#[derive(Parser, Debug, Clone)]
#[command(name = "sonar-dingtalk-relay")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 9010)]
    pub port: u16,

    /// SonarQube has multi-branch support (Developer edition or the community
    /// branch plugin); links in messages then point at the branch result page
    #[arg(long, visible_alias = "mb", env = "MULTI_BRANCH")]
    pub multi_branch: bool,

    /// DingTalk robot send endpoint
    #[arg(long, env = "DINGTALK_URL", default_value = DEFAULT_DINGTALK_URL)]
    pub dingtalk_url: String,

    /// Timeout for calls to SonarQube and DingTalk, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_ones() {
        let config = Config::try_parse_from(["sonar-dingtalk-relay"]).unwrap();
        assert!(!config.multi_branch);
        assert_eq!(config.dingtalk_url, DEFAULT_DINGTALK_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "sonar-dingtalk-relay",
            "-H",
            "127.0.0.1",
            "-p",
            "8000",
            "--mb",
            "--timeout-secs",
            "3",
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert!(config.multi_branch);
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
    }
}
