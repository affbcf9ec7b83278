//! Markdown report.

use super::Report;

const ALL_STATUSES_LABEL: &str = "全部状态";
const NO_ITERATIONS: &str = "- 无迭代数据";
const MISSING: &str = "-";

/// Render the report as a markdown section.
pub fn render_markdown(report: &Report) -> String {
    let filter_label = report
        .iteration_filter
        .as_deref()
        .unwrap_or(ALL_STATUSES_LABEL);

    let mut lines = vec![
        format!("## TAPD 项目状态汇报（workspace: {}）", report.workspace_id),
        String::new(),
        format!(
            "- 生成时间: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
        String::new(),
        "### 总量".to_string(),
        format!("- 需求（Story）: {}", report.counts.stories),
        format!("- 缺陷（Bug）: {}", report.counts.bugs),
        format!("- 任务（Task）: {}", report.counts.tasks),
        String::new(),
        format!("### 迭代列表（筛选: {}）", filter_label),
    ];

    if report.iterations.is_empty() {
        lines.push(NO_ITERATIONS.to_string());
    } else {
        for iteration in &report.iterations {
            lines.push(format!(
                "- #{} {} | status={} | {} ~ {}",
                iteration.id.as_deref().unwrap_or(MISSING),
                iteration.name.as_deref().unwrap_or(MISSING),
                iteration.status.as_deref().unwrap_or(MISSING),
                iteration.start_date.as_deref().unwrap_or(MISSING),
                iteration.end_date.as_deref().unwrap_or(MISSING),
            ));
        }
    }
    lines.push(String::new());

    lines.join("\n")
}
