//! Markdown report for a DingTalk robot.
//!
//! Rendering never fails: every value is a string and empty values are
//! rendered as empty.

use crate::models::dingtalk::MarkdownMessage;
use crate::models::scan::ScanContext;
use chrono::{DateTime, FixedOffset};

const SUCCESS_PIC: &str = "http://s1.ax1x.com/2020/10/29/BGMeTe.png";
const FAILURE_PIC: &str = "http://s1.ax1x.com/2020/10/29/BGMZwD.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Success,
    Failure,
}

impl StatusIndicator {
    pub fn from_alert_status(alert_status: &str) -> Self {
        if alert_status == "OK" {
            Self::Success
        } else {
            Self::Failure
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Success => "#52C41A",
            Self::Failure => "#F5222D",
        }
    }

    pub fn picture(&self) -> &'static str {
        match self {
            Self::Success => SUCCESS_PIC,
            Self::Failure => FAILURE_PIC,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "通过",
            Self::Failure => "未通过",
        }
    }
}

pub fn title(ctx: &ScanContext) -> String {
    format!("{}[{}]代码扫描报告", ctx.project_name, ctx.branch_name)
}

/// Where "view details" points: the branch result page when SonarQube
/// supports branches, the project dashboard otherwise.
pub fn details_url(ctx: &ScanContext, multi_branch: bool) -> String {
    if multi_branch {
        ctx.branch_url.clone()
    } else {
        ctx.dashboard_url()
    }
}

fn metrics_line(
    prefix: &str,
    bugs: &str,
    vulnerabilities: &str,
    code_smells: &str,
    coverage: &str,
    duplicated: &str,
) -> String {
    format!(
        "{p}Bugs: {} | {p}漏洞: {} | {p}异味: {} | 覆盖率: {}% | 重复率: {}%",
        bugs,
        vulnerabilities,
        code_smells,
        coverage,
        duplicated,
        p = prefix
    )
}

fn link_or_text(text: &str, url: &str) -> String {
    if url.is_empty() {
        text.to_string()
    } else {
        format!("[{}]({})", text, url)
    }
}

/// SonarQube sends `2016-11-18T10:46:28+0100`; unknown formats are shown as is.
fn format_analysed_at(raw: &str) -> String {
    DateTime::<FixedOffset>::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn render(ctx: &ScanContext, multi_branch: bool) -> MarkdownMessage {
    let m = &ctx.measures;
    let status = StatusIndicator::from_alert_status(&m.alert_status);
    let title = title(ctx);

    let project_link = if ctx.project_url.is_empty() {
        ctx.dashboard_url()
    } else {
        ctx.project_url.clone()
    };

    let mut lines = vec![
        format!("### {}", title),
        format!("![{}]({})", status.label(), status.picture()),
        format!(
            "**质量阈: <font color=\"{}\">{}</font>** ({})",
            status.color(),
            status.label(),
            m.alert_status
        ),
        String::new(),
        format!("- 项目: {}", link_or_text(&ctx.project_name, &project_link)),
        format!("- 分支: {}", link_or_text(&ctx.branch_name, &ctx.branch_url)),
    ];

    if !ctx.revision.is_empty() {
        lines.push(format!("- 提交: {}", ctx.revision));
    }
    if !ctx.analysed_at.is_empty() {
        lines.push(format!("- 扫描时间: {}", format_analysed_at(&ctx.analysed_at)));
    }

    lines.extend([
        String::new(),
        "#### 新代码".to_string(),
        metrics_line(
            "新增",
            &m.new_bugs,
            &m.new_vulnerabilities,
            &m.new_code_smells,
            &m.new_coverage,
            &m.new_duplicated_lines_density,
        ),
        String::new(),
        "#### 整体".to_string(),
        metrics_line(
            "",
            &m.bugs,
            &m.vulnerabilities,
            &m.code_smells,
            &m.coverage,
            &m.duplicated_lines_density,
        ),
        String::new(),
        format!("[查看详情]({})", details_url(ctx, multi_branch)),
    ]);

    MarkdownMessage {
        title,
        text: lines.join("\n"),
    }
}
