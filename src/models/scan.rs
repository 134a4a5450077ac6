use serde::Serialize;

pub const PULL_REQUEST: &str = "PULL_REQUEST";

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchType {
    PullRequest,
    #[default]
    Branch,
}

impl BranchType {
    /// SonarQube reports `PULL_REQUEST`, `BRANCH`, `LONG` or `SHORT`; only
    /// pull requests need different handling.
    pub fn from_sonar(raw: &str) -> Self {
        if raw == PULL_REQUEST {
            Self::PullRequest
        } else {
            Self::Branch
        }
    }
}

/// Everything known about one finished analysis. Built by the webhook parser,
/// extended with `measures` by the SonarQube client, then read by the renderer.
#[derive(Debug, Serialize, Clone, Default)]
pub struct ScanContext {
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub sonar_token: Option<String>,

    pub server_url: String,
    pub project_name: String,
    pub project_key: String,
    pub project_url: String,

    /// Branch name, or the pull request id for pull request analyses.
    pub branch_name: String,
    pub branch_url: String,
    pub branch_type: BranchType,

    pub revision: String,
    pub analysed_at: String,

    pub measures: Measures,
}

impl ScanContext {
    pub fn dashboard_url(&self) -> String {
        format!("{}/dashboard?id={}", self.server_url, self.project_key)
    }
}

/// Metric values as SonarQube reports them. Missing metrics stay empty.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Measures {
    pub alert_status: String,

    pub bugs: String,
    pub vulnerabilities: String,
    pub code_smells: String,
    pub coverage: String,
    pub duplicated_lines_density: String,

    pub new_bugs: String,
    pub new_vulnerabilities: String,
    pub new_code_smells: String,
    pub new_coverage: String,
    pub new_duplicated_lines_density: String,
}
