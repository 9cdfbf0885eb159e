//! # Office 文档转换器
//!
//! 调用无界面的 LibreOffice (`soffice --headless --convert-to pdf`) 把
//! Word / Excel / PowerPoint 文档转换为 PDF。
//!
//! ## 进程生命周期
//! 每个文件启动一个子进程（Unix 上为独立进程组），由 [`ChildGuard`] 持有：
//! 正常退出时回收并清理残留的后代进程；超时或出错时整组强制结束并回收，
//! 下一个文件开始前不留残余进程。
//!
//! ## 失败分类
//! - 找不到可执行文件 -> 永久失败
//! - 非零退出码、超时 -> 瞬时失败（常见于配置文件锁、进程残留）
//! - 退出成功但没有生成 PDF -> 永久失败
//!
//! ## 依赖关系
//! - 实现 `handlers::Handler<PathBuf>`
//! - 被 `commands/convert.rs` 注册

use super::Handler;
use crate::error::HandlerError;
use crate::models::{Category, FileTask};

use std::ffi::OsString;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// LibreOffice 转换器
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    program: PathBuf,
    prefix_args: Vec<OsString>,
    filter: &'static str,
    label: String,
    timeout: Option<Duration>,
}

impl OfficeConverter {
    /// 为指定类别创建转换器；`Unsupported` 没有转换器
    pub fn new(program: impl Into<PathBuf>, category: Category) -> Option<Self> {
        let filter = match category {
            Category::Word => "writer_pdf_Export",
            Category::Excel => "calc_pdf_Export",
            Category::PowerPoint => "impress_pdf_Export",
            Category::Unsupported => return None,
        };

        Some(Self {
            program: program.into(),
            prefix_args: Vec::new(),
            filter,
            label: format!("{} converter", category),
            timeout: None,
        })
    }

    /// 单次转换的时间上限
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 在转换参数之前插入固定参数（例如脚本解释器调用）
    pub fn with_prefix_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self, source: &Path, outdir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .arg("--headless")
            .arg("--norestore")
            .arg("--nolockcheck")
            .arg("--convert-to")
            .arg(format!("pdf:{}", self.filter))
            .arg("--outdir")
            .arg(outdir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Handler<PathBuf> for OfficeConverter {
    fn label(&self) -> &str {
        &self.label
    }

    fn target_extension(&self) -> Option<&str> {
        Some("pdf")
    }

    fn handle(&self, task: &FileTask, dest: &PathBuf) -> Result<(), HandlerError> {
        let outdir = dest
            .parent()
            .ok_or_else(|| HandlerError::Permanent(format!("no parent for {}", dest.display())))?;

        let child = self
            .command(task.source(), outdir)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => HandlerError::Permanent(format!(
                    "'{}' not found in PATH",
                    self.program_name()
                )),
                _ => HandlerError::Transient(format!("failed to start '{}': {}", self.program_name(), e)),
            })?;

        debug!("Started {} (pid {}) for {}", self.program_name(), child.id(), task.key());
        let output = ChildGuard::new(child, self.program_name()).wait(self.timeout)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HandlerError::Transient(format!(
                "'{}' exited with {}: {}",
                self.program_name(),
                output.status,
                stderr.trim()
            )));
        }

        // soffice 写出 <outdir>/<源文件名主干>.pdf，与 dest 一致
        if !dest.is_file() {
            return Err(HandlerError::Permanent(format!(
                "'{}' reported success but produced no {}",
                self.program_name(),
                dest.display()
            )));
        }

        Ok(())
    }
}

/// 子进程守卫：离开作用域时结束并回收尚未退出的进程
///
/// Unix 上子进程独占一个进程组，结束时整组发送 `SIGKILL`，
/// 包括 `soffice` 包装脚本派生的 `soffice.bin` 等后代进程。
struct ChildGuard {
    child: Option<Child>,
    pid: u32,
    program: String,
}

impl ChildGuard {
    fn new(child: Child, program: String) -> Self {
        Self {
            pid: child.id(),
            child: Some(child),
            program,
        }
    }

    /// 等待退出并收集输出；管道在后台线程中持续读取，输出量不受管道缓冲限制
    fn wait(mut self, timeout: Option<Duration>) -> Result<Output, HandlerError> {
        let stdout = self.child.as_mut().and_then(|c| c.stdout.take()).map(drain);
        let stderr = self.child.as_mut().and_then(|c| c.stderr.take()).map(drain);

        let status = self.wait_status(timeout)?;

        // 主进程已退出，残留的后代进程仍可能占用管道
        #[cfg(unix)]
        {
            if kill_tree(self.pid) {
                warn!("Terminated leftover processes of '{}' (group {})", self.program, self.pid);
            }
        }

        Ok(Output {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }

    fn wait_status(&mut self, timeout: Option<Duration>) -> Result<ExitStatus, HandlerError> {
        let started = Instant::now();

        loop {
            let child = match self.child.as_mut() {
                Some(child) => child,
                None => return Err(HandlerError::Transient(format!("'{}' already reaped", self.program))),
            };

            let polled = match timeout {
                Some(_) => child.try_wait(),
                None => child.wait().map(Some),
            }
            .map_err(|e| HandlerError::Transient(format!("waiting for '{}': {}", self.program, e)))?;

            if let Some(status) = polled {
                self.child = None;
                return Ok(status);
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(HandlerError::Transient(format!(
                        "'{}' timed out after {:?}",
                        self.program, limit
                    )));
                }
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            kill_tree(self.pid);
            let _ = child.kill();
            let _ = child.wait();
            warn!("Terminated '{}' (pid {})", self.program, self.pid);
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// 结束以 `pid` 为组长的整个进程组；组内没有进程时返回 false
#[cfg(unix)]
fn kill_tree(pid: u32) -> bool {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill(2) 只读取参数；负数 pid 表示进程组
    unsafe { libc::kill(-pgid, libc::SIGKILL) == 0 }
}

#[cfg(windows)]
fn kill_tree(pid: u32) -> bool {
    Command::new("taskkill")
        .args(["/T", "/F", "/PID"])
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
fn kill_tree(_pid: u32) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// 模拟 soffice：在 --outdir 中写出 <主干>.pdf
    const FAKE_SOFFICE: &str = r#"
out=""
while [ $# -gt 1 ]; do
  if [ "$1" = "--outdir" ]; then out="$2"; shift; fi
  shift
done
name=$(basename "$1")
printf '%%PDF-1.7' > "$out/${name%.*}.pdf"
"#;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn setup(tmp: &TempDir) -> (FileTask, PathBuf) {
        let input = tmp.path().join("input/a");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("report.docx"), b"doc").unwrap();
        let task = FileTask::new(input.join("report.docx"), PathBuf::from("a/report.docx"));

        let outdir = tmp.path().join("output/a");
        fs::create_dir_all(&outdir).unwrap();
        (task, outdir.join("report.pdf"))
    }

    fn converter(script: &Path) -> OfficeConverter {
        OfficeConverter::new("sh", Category::Word)
            .unwrap()
            .with_prefix_args([script.as_os_str().to_os_string()])
    }

    #[test]
    fn test_no_converter_for_unsupported() {
        assert!(OfficeConverter::new("soffice", Category::Unsupported).is_none());
        let excel = OfficeConverter::new("soffice", Category::Excel).unwrap();
        assert_eq!(excel.target_extension(), Some("pdf"));
    }

    #[test]
    fn test_converts_into_destination() {
        let tmp = TempDir::new().unwrap();
        let (task, dest) = setup(&tmp);
        let fake = script(tmp.path(), "soffice.sh", FAKE_SOFFICE);

        converter(&fake).handle(&task, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn test_missing_program_is_permanent() {
        let tmp = TempDir::new().unwrap();
        let (task, dest) = setup(&tmp);
        let conv = OfficeConverter::new(tmp.path().join("no-such-soffice"), Category::Word).unwrap();

        let err = conv.handle(&task, &dest).unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_nonzero_exit_is_transient() {
        let tmp = TempDir::new().unwrap();
        let (task, dest) = setup(&tmp);
        let failing = script(tmp.path(), "fail.sh", "echo 'profile locked' >&2\nexit 3\n");

        let err = converter(&failing).handle(&task, &dest).unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("profile locked"));
    }

    #[test]
    fn test_success_without_output_is_permanent() {
        let tmp = TempDir::new().unwrap();
        let (task, dest) = setup(&tmp);
        let silent = script(tmp.path(), "silent.sh", "exit 0\n");

        let err = converter(&silent).handle(&task, &dest).unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_timeout_kills_child() {
        let tmp = TempDir::new().unwrap();
        let (task, dest) = setup(&tmp);
        let hang = script(tmp.path(), "hang.sh", "sleep 30\n");

        let started = Instant::now();
        let err = converter(&hang)
            .with_timeout(Some(Duration::from_millis(300)))
            .handle(&task, &dest)
            .unwrap_err();

        assert!(err.is_transient());
        assert!(err.to_string().contains("timed out after 300ms"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    /// 进程已不存在或只剩僵尸
    #[cfg(target_os = "linux")]
    fn is_gone(pid: &str) -> bool {
        match fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => true,
        }
    }

    #[cfg(target_os = "linux")]
    fn wait_gone(pid: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if is_gone(pid) {
                return true;
            }
            thread::sleep(Duration::from_millis(50));
        }
        false
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timeout_kills_descendants() {
        let tmp = TempDir::new().unwrap();
        let (task, dest) = setup(&tmp);
        let pid_file = tmp.path().join("worker.pid");
        let wrapper = script(
            tmp.path(),
            "wrapper.sh",
            &format!("sleep 30 &\necho $! > '{}'\nwait\n", pid_file.display()),
        );

        let err = converter(&wrapper)
            .with_timeout(Some(Duration::from_millis(500)))
            .handle(&task, &dest)
            .unwrap_err();
        assert!(err.is_transient());

        let pid = fs::read_to_string(&pid_file).unwrap();
        assert!(wait_gone(pid.trim()), "worker {} survived the timeout", pid.trim());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_leftover_daemon_is_swept_after_exit() {
        let tmp = TempDir::new().unwrap();
        let (task, dest) = setup(&tmp);
        let pid_file = tmp.path().join("daemon.pid");
        // 转换完成后留下一个继承了输出管道的后台进程
        let body = format!(
            "{FAKE_SOFFICE}\nsleep 30 &\necho $! > '{}'\nexit 0\n",
            pid_file.display()
        );
        let daemonizing = script(tmp.path(), "daemon.sh", &body);

        let started = Instant::now();
        converter(&daemonizing).handle(&task, &dest).unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(dest.is_file());

        let pid = fs::read_to_string(&pid_file).unwrap();
        assert!(wait_gone(pid.trim()), "daemon {} left running", pid.trim());
    }

    #[test]
    fn test_large_output_does_not_stall() {
        let tmp = TempDir::new().unwrap();
        let (task, dest) = setup(&tmp);
        let chatty = script(
            tmp.path(),
            "chatty.sh",
            &format!("{FAKE_SOFFICE}\nhead -c 200000 /dev/zero\nhead -c 100000 /dev/zero >&2\n"),
        );

        let started = Instant::now();
        converter(&chatty)
            .with_timeout(Some(Duration::from_secs(5)))
            .handle(&task, &dest)
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(fs::read(&dest).unwrap(), b"%PDF-1.7");
    }
}
