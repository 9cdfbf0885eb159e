//! # 运行报告
//!
//! 汇总每个任务的终止状态，打印失败表格，可选导出 CSV。
//!
//! ## 依赖关系
//! - 由 `batch/runner.rs` 生成
//! - 被 `commands/` 打印和导出
//! - 使用 `tabled` 打印表格，`csv` + `serde` 导出

use crate::error::{DocflowError, Result};
use crate::models::{Category, TaskOutcome, TerminalState};

use serde::Serialize;
use std::path::Path;
use tabled::{Table, Tabled};

/// 批量处理结果
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    /// 记录一个任务结果
    pub fn record(&mut self, outcome: TaskOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    /// 某终止状态的任务数
    pub fn count(&self, state: TerminalState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    pub fn failed(&self) -> usize {
        self.count(TerminalState::FailedRetained)
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.state.is_archived())
    }

    /// 失败任务表格；无失败时返回 `None`
    pub fn failure_table(&self) -> Option<String> {
        let rows: Vec<FailureRow> = self
            .failures()
            .map(|o| {
                let (stage, kind, reason) = match &o.failure {
                    Some(f) => (f.stage.to_string(), f.kind.to_string(), f.message.clone()),
                    None => (String::new(), String::new(), String::new()),
                };
                FailureRow {
                    file: o.relative.clone(),
                    category: o.category.to_string(),
                    stage,
                    kind,
                    attempts: o.attempts,
                    reason,
                }
            })
            .collect();

        if rows.is_empty() {
            None
        } else {
            Some(Table::new(rows).to_string())
        }
    }

    /// 导出每个任务的结果
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        for o in &self.outcomes {
            wtr.serialize(CsvRow {
                file: &o.relative,
                category: o.category,
                state: o.state,
                destination: &o.destination,
                attempts: o.attempts,
                stage: o.failure.as_ref().map(|f| f.stage.to_string()),
                kind: o.failure.as_ref().map(|f| f.kind.to_string()),
                error: o.failure.as_ref().map(|f| f.message.as_str()),
            })?;
        }

        wtr.flush().map_err(|e| DocflowError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }
}

/// 失败表格行
#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Attempts")]
    attempts: u32,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// CSV 导出行
#[derive(Serialize)]
struct CsvRow<'a> {
    file: &'a str,
    category: Category,
    state: TerminalState,
    destination: &'a str,
    attempts: u32,
    stage: Option<String>,
    kind: Option<String>,
    error: Option<&'a str>,
}
