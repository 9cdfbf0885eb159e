//! # 批量执行器
//!
//! 顺序处理文件任务，每个任务恰好到达一个终止状态：
//!
//! 1. 计算目标位置（转换类别替换扩展名）
//! 2. 目标已存在 -> 记录跳过并归档，不重新处理
//! 3. 有处理器 -> 按类别重试策略调用；成功归档，失败保留源文件
//! 4. 无处理器 -> 原样复制到输出位置后归档
//!
//! 单文件失败只记录日志，不会中断整个运行。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `storage/` 的 `Sink` 与 `Archiver`
//! - 使用 `handlers/` 的 `Handler` 与 `RetryPolicy`
//! - 使用 `utils/progress.rs` 创建进度条

use super::report::RunReport;
use crate::error::HandlerError;
use crate::handlers::{Handler, RetryPolicy};
use crate::models::{
    Category, FailureKind, FileTask, Stage, TaskFailure, TaskOutcome, TerminalState,
};
use crate::storage::{Archiver, Sink};
use crate::utils::{output, progress};

use std::collections::HashMap;
use tracing::{error, info, warn};

/// 批量执行器
pub struct BatchRunner<S: Sink> {
    sink: S,
    archiver: Archiver,
    handlers: HashMap<Category, Box<dyn Handler<S::Dest>>>,
    retry: RetryPolicy,
    show_progress: bool,
}

impl<S: Sink> BatchRunner<S> {
    /// 创建新的批量执行器
    pub fn new(sink: S, archiver: Archiver, retry: RetryPolicy) -> Self {
        Self {
            sink,
            archiver,
            handlers: HashMap::new(),
            retry,
            show_progress: false,
        }
    }

    /// 为类别注册处理器；未注册的类别原样复制
    pub fn register(mut self, category: Category, handler: Box<dyn Handler<S::Dest>>) -> Self {
        self.handlers.insert(category, handler);
        self
    }

    /// 是否显示进度条和逐文件终端输出
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// 顺序处理全部任务
    pub fn run(&self, tasks: &[FileTask]) -> RunReport {
        let pb = self
            .show_progress
            .then(|| progress::create_progress_bar(tasks.len() as u64, "Processing"));

        let mut report = RunReport::default();
        for task in tasks {
            let outcome = self.process(task);

            if let Some(pb) = &pb {
                pb.suspend(|| print_outcome(&outcome));
                pb.inc(1);
            }
            report.record(outcome);
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        report
    }

    /// 处理单个任务
    pub fn process(&self, task: &FileTask) -> TaskOutcome {
        let handler = self.handlers.get(&task.category());
        let dest = self
            .sink
            .locate(task, handler.and_then(|h| h.target_extension()));
        let dest_label = self.sink.describe(&dest);

        match self.sink.exists(&dest) {
            Ok(true) => {
                info!("Skipping (already processed): {}", task.key());
                return self.finish(task, TerminalState::SkippedArchived, dest_label, 0);
            }
            Ok(false) => {}
            Err(e) => {
                return self.fail(task, dest_label, 0, Stage::Check, FailureKind::Filesystem, e.detail());
            }
        }

        if let Err(e) = self.sink.prepare(&dest) {
            return self.fail(task, dest_label, 0, Stage::Prepare, FailureKind::Filesystem, e.detail());
        }

        match handler {
            Some(handler) => {
                let (result, attempts) = self.retry.invoke(&**handler, task, &dest);
                match result {
                    Ok(()) => {
                        info!("{} ok: {} -> {}", handler.label(), task.key(), dest_label);
                        self.finish(task, TerminalState::SuccessArchived, dest_label, attempts)
                    }
                    Err(e) => {
                        if let Err(cleanup) = self.sink.discard(&dest) {
                            warn!("Cannot remove partial output {}: {}", dest_label, cleanup.detail());
                        }
                        let kind = match e {
                            HandlerError::Transient(_) => FailureKind::TransientExternal,
                            HandlerError::Permanent(_) => FailureKind::PermanentExternal,
                        };
                        self.fail(task, dest_label, attempts, Stage::Handle, kind, e.to_string())
                    }
                }
            }
            None => match self.sink.copy_raw(task.source(), &dest) {
                Ok(()) => {
                    info!("Copied unchanged: {} -> {}", task.key(), dest_label);
                    self.finish(task, TerminalState::CopiedArchived, dest_label, 0)
                }
                Err(e) => {
                    if let Err(cleanup) = self.sink.discard(&dest) {
                        warn!("Cannot remove partial copy {}: {}", dest_label, cleanup.detail());
                    }
                    self.fail(task, dest_label, 0, Stage::Handle, FailureKind::Filesystem, e.detail())
                }
            },
        }
    }

    /// 归档源文件；归档失败时源文件保留，任务记为失败
    fn finish(&self, task: &FileTask, state: TerminalState, destination: String, attempts: u32) -> TaskOutcome {
        match self.archiver.archive(task) {
            Ok(_) => {
                info!("Moved to processed: {}", task.key());
                TaskOutcome {
                    relative: task.key(),
                    category: task.category(),
                    state,
                    destination,
                    attempts,
                    failure: None,
                }
            }
            Err(e) => self.fail(task, destination, attempts, Stage::Archive, FailureKind::Filesystem, e.detail()),
        }
    }

    fn fail(
        &self,
        task: &FileTask,
        destination: String,
        attempts: u32,
        stage: Stage,
        kind: FailureKind,
        message: String,
    ) -> TaskOutcome {
        error!(
            category = %task.category(),
            stage = %stage,
            kind = %kind,
            attempts,
            "Failed to process {}: {}",
            task.key(),
            message
        );

        TaskOutcome {
            relative: task.key(),
            category: task.category(),
            state: TerminalState::FailedRetained,
            destination,
            attempts,
            failure: Some(TaskFailure { stage, kind, message }),
        }
    }
}

/// 终端逐文件输出
fn print_outcome(outcome: &TaskOutcome) {
    match outcome.state {
        TerminalState::SkippedArchived => {
            output::print_skip(&format!("{} (already processed)", outcome.relative))
        }
        TerminalState::SuccessArchived | TerminalState::CopiedArchived => {
            output::print_conversion(&outcome.relative, &outcome.destination)
        }
        TerminalState::FailedRetained => {
            let reason = outcome
                .failure
                .as_ref()
                .map(|f| f.message.as_str())
                .unwrap_or("unknown error");
            output::print_error(&format!("{}: {}", outcome.relative, reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FileCollector;
    use crate::storage::LocalTree;
    use crate::utils::logging;

    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use tempfile::TempDir;
    use tracing_subscriber::EnvFilter;

    /// 测试用转换器：记录调用，按需失败
    struct FakeConverter {
        calls: Rc<RefCell<Vec<String>>>,
        fail: Option<HandlerError>,
    }

    impl FakeConverter {
        fn ok(calls: &Rc<RefCell<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                calls: Rc::clone(calls),
                fail: None,
            })
        }

        fn failing(calls: &Rc<RefCell<Vec<String>>>, err: HandlerError) -> Box<Self> {
            Box::new(Self {
                calls: Rc::clone(calls),
                fail: Some(err),
            })
        }
    }

    impl Handler<PathBuf> for FakeConverter {
        fn label(&self) -> &str {
            "fake converter"
        }

        fn target_extension(&self) -> Option<&str> {
            Some("pdf")
        }

        fn handle(&self, task: &FileTask, dest: &PathBuf) -> Result<(), HandlerError> {
            self.calls.borrow_mut().push(task.key());
            if let Some(err) = &self.fail {
                // 留下部分产物，验证失败后会被清理
                fs::write(dest, b"partial").unwrap();
                return Err(err.clone());
            }
            fs::write(dest, format!("PDF of {}", task.key())).unwrap();
            Ok(())
        }
    }

    struct Roots {
        _tmp: TempDir,
        input: PathBuf,
        output: PathBuf,
        archive: PathBuf,
        logs: PathBuf,
    }

    fn roots() -> Roots {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("input");
        let output = tmp.path().join("output");
        let archive = tmp.path().join("archive");
        let logs = tmp.path().join("logs");
        for dir in [&input, &output, &archive, &logs] {
            fs::create_dir_all(dir).unwrap();
        }
        Roots {
            _tmp: tmp,
            input,
            output,
            archive,
            logs,
        }
    }

    fn put(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn files_under(root: &Path) -> Vec<String> {
        FileCollector::new(root)
            .collect()
            .iter()
            .map(|t| t.key())
            .collect()
    }

    fn runner(r: &Roots, retry: RetryPolicy) -> BatchRunner<LocalTree> {
        BatchRunner::new(LocalTree::new(&r.output), Archiver::new(&r.archive), retry)
    }

    fn scenario_input(r: &Roots) {
        put(&r.input, "a/report.docx", b"word");
        put(&r.input, "a/b/data.xlsx", b"excel");
        put(&r.input, "readme.txt", b"plain text\n");
    }

    /// 在临时运行日志下执行，返回报告和日志内容
    fn run_logged(r: &Roots, runner: &BatchRunner<LocalTree>) -> (RunReport, String) {
        let (file, path) = logging::open_run_log(&r.logs).unwrap();
        let subscriber = logging::run_log_subscriber(file, EnvFilter::new("info"));
        let tasks = FileCollector::new(&r.input).collect();
        let report = tracing::subscriber::with_default(subscriber, || runner.run(&tasks));
        (report, fs::read_to_string(path).unwrap())
    }

    #[test]
    fn test_full_run_converts_copies_and_archives() {
        let r = roots();
        scenario_input(&r);
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = runner(&r, RetryPolicy::default())
            .register(Category::Word, FakeConverter::ok(&calls))
            .register(Category::Excel, FakeConverter::ok(&calls));

        let (report, log) = run_logged(&r, &runner);

        assert_eq!(
            files_under(&r.output),
            vec!["a/b/data.pdf", "a/report.pdf", "readme.txt"]
        );
        assert_eq!(
            files_under(&r.archive),
            vec!["a/b/data.xlsx", "a/report.docx", "readme.txt"]
        );
        assert!(files_under(&r.input).is_empty());
        assert_eq!(fs::read(r.output.join("readme.txt")).unwrap(), b"plain text\n");

        assert_eq!(report.count(TerminalState::SuccessArchived), 2);
        assert_eq!(report.count(TerminalState::CopiedArchived), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(calls.borrow().len(), 2);

        for key in ["a/report.docx", "a/b/data.xlsx", "readme.txt"] {
            assert!(log.contains(key), "run log has no entry for {key}");
        }
        assert!(!log.contains("ERROR"));
    }

    #[test]
    fn test_failing_handler_retains_source() {
        let r = roots();
        scenario_input(&r);
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = runner(&r, RetryPolicy::default().with(Category::Word, 3))
            .register(
                Category::Word,
                FakeConverter::failing(&calls, HandlerError::Transient("locked".into())),
            )
            .register(Category::Excel, FakeConverter::ok(&calls));

        let (report, log) = run_logged(&r, &runner);

        assert!(!r.output.join("a/report.pdf").exists());
        assert!(!r.archive.join("a/report.docx").exists());
        assert!(r.input.join("a/report.docx").is_file());
        assert_eq!(
            calls.borrow().iter().filter(|k| *k == "a/report.docx").count(),
            3
        );

        let errors: Vec<&str> = log.lines().filter(|l| l.contains("ERROR")).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("a/report.docx"));
        assert!(errors[0].contains("attempts=3"));

        assert_eq!(report.failed(), 1);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.relative, "a/report.docx");
        assert_eq!(failure.attempts, 3);
        assert_eq!(
            failure.failure.as_ref().unwrap().kind,
            FailureKind::TransientExternal
        );

        // 其他文件不受影响
        assert!(r.archive.join("a/b/data.xlsx").is_file());
        assert!(r.archive.join("readme.txt").is_file());
    }

    #[test]
    fn test_handler_without_retry_runs_once() {
        let r = roots();
        put(&r.input, "deck.pptx", b"ppt");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = runner(&r, RetryPolicy::default().with(Category::Word, 3)).register(
            Category::PowerPoint,
            FakeConverter::failing(&calls, HandlerError::Transient("busy".into())),
        );

        let report = runner.run(&FileCollector::new(&r.input).collect());
        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_rerun_skips_existing_and_archives() {
        let r = roots();
        scenario_input(&r);
        put(&r.output, "a/report.pdf", b"earlier run");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = runner(&r, RetryPolicy::default())
            .register(Category::Word, FakeConverter::ok(&calls))
            .register(Category::Excel, FakeConverter::ok(&calls));

        let report = runner.run(&FileCollector::new(&r.input).collect());

        assert_eq!(*calls.borrow(), vec!["a/b/data.xlsx".to_string()]);
        assert_eq!(fs::read(r.output.join("a/report.pdf")).unwrap(), b"earlier run");
        assert!(r.archive.join("a/report.docx").is_file());
        assert_eq!(report.count(TerminalState::SkippedArchived), 1);

        // 第二次运行：输入已空，不会重复归档
        let second = runner.run(&FileCollector::new(&r.input).collect());
        assert_eq!(second.total(), 0);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_recovery_run_after_partial_failure() {
        let r = roots();
        scenario_input(&r);
        let calls = Rc::new(RefCell::new(Vec::new()));

        let broken = runner(&r, RetryPolicy::default()).register(
            Category::Word,
            FakeConverter::failing(&calls, HandlerError::Permanent("corrupt".into())),
        );
        broken.run(&FileCollector::new(&r.input).collect());
        assert_eq!(files_under(&r.input), vec!["a/report.docx"]);

        let fixed = runner(&r, RetryPolicy::default()).register(Category::Word, FakeConverter::ok(&calls));
        let report = fixed.run(&FileCollector::new(&r.input).collect());

        assert_eq!(report.count(TerminalState::SuccessArchived), 1);
        assert!(files_under(&r.input).is_empty());
        assert!(r.output.join("a/report.pdf").is_file());
    }

    #[test]
    fn test_every_task_reaches_one_terminal_state() {
        let r = roots();
        for i in 0..5 {
            put(&r.input, &format!("d{i}/doc{i}.docx"), b"w");
            put(&r.input, &format!("d{i}/note{i}.md"), b"m");
        }
        put(&r.output, "d0/doc0.pdf", b"done");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = runner(&r, RetryPolicy::default()).register(
            Category::Word,
            FakeConverter::failing(&calls, HandlerError::Permanent("bad".into())),
        );

        let tasks = FileCollector::new(&r.input).collect();
        let report = runner.run(&tasks);
        assert_eq!(report.total(), tasks.len());

        for outcome in report.outcomes() {
            let archived = r.archive.join(&outcome.relative).exists();
            let retained = r.input.join(&outcome.relative).exists();
            assert_ne!(archived, retained, "{} in both or neither", outcome.relative);
            assert_eq!(archived, outcome.state.is_archived());
        }
        // 失败不留下部分产物
        assert!(!r.output.join("d1/doc1.pdf").exists());
    }

    #[test]
    fn test_uncreatable_destination_is_per_file() {
        let r = roots();
        put(&r.input, "blocked/a.txt", b"a");
        put(&r.input, "fine/b.txt", b"b");
        // 输出目录中同名文件占位，子目录无法创建
        fs::write(r.output.join("blocked"), b"not a dir").unwrap();

        let report = runner(&r, RetryPolicy::default()).run(&FileCollector::new(&r.input).collect());

        assert_eq!(report.failed(), 1);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.relative, "blocked/a.txt");
        assert_eq!(failure.failure.as_ref().unwrap().kind, FailureKind::Filesystem);
        assert!(r.input.join("blocked/a.txt").is_file());
        assert!(r.archive.join("fine/b.txt").is_file());
    }

    #[test]
    fn test_archive_failure_retains_source_then_recovers() {
        let r = roots();
        put(&r.input, "a/report.docx", b"word");
        // 归档目录中同名文件占位，子目录无法创建
        fs::write(r.archive.join("a"), b"not a dir").unwrap();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let runner = runner(&r, RetryPolicy::default()).register(Category::Word, FakeConverter::ok(&calls));

        let first = runner.run(&FileCollector::new(&r.input).collect());

        assert_eq!(first.failed(), 1);
        let failure = first.failures().next().unwrap();
        assert_eq!(failure.failure.as_ref().unwrap().stage, Stage::Archive);
        assert_eq!(failure.failure.as_ref().unwrap().kind, FailureKind::Filesystem);
        assert!(r.output.join("a/report.pdf").is_file());
        assert!(r.input.join("a/report.docx").is_file());

        fs::remove_file(r.archive.join("a")).unwrap();
        let second = runner.run(&FileCollector::new(&r.input).collect());

        assert_eq!(second.count(TerminalState::SkippedArchived), 1);
        assert_eq!(calls.borrow().len(), 1);
        assert!(r.archive.join("a/report.docx").is_file());
        assert!(files_under(&r.input).is_empty());
    }
}
