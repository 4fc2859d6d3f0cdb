#![allow(dead_code)]

use async_trait::async_trait;
use lvm_reload_stress::{CommandError, Executor, Result};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing_subscriber::fmt::MakeWriter;

const REPORT_PROGRAMS: [&str; 3] = ["pvs", "vgs", "lvs"];
const MAX_RECORDED_REPORTS: usize = 1000;

#[derive(Debug, Clone)]
pub struct Call {
    pub argv: Vec<String>,
    pub input: Option<Vec<u8>>,
}

impl Call {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.argv.iter().any(|arg| arg.contains(needle))
    }
}

/// Lets a test hold one matching command in flight.
#[derive(Clone, Default)]
pub struct Gate {
    /// Notified when the matching command starts
    pub entered: Arc<Notify>,
    /// Notify to let the matching command return
    pub release: Arc<Notify>,
}

type Matcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// In-memory executor.
///
/// Succeeds instantly unless told otherwise. Workflow commands are recorded in
/// full; report commands (`pvs`, `vgs`, `lvs`) are counted and only the first
/// few are kept, since reloaders issue them in a tight loop.
#[derive(Default)]
pub struct FakeExecutor {
    calls: Mutex<Vec<Call>>,
    reports: Mutex<Vec<Vec<String>>>,
    report_count: AtomicUsize,
    workflow_count: AtomicUsize,
    fail_every: Option<usize>,
    fail_reports: bool,
    responses: HashMap<String, String>,
    gate: Option<(Matcher, Gate)>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `n`th workflow (non-report) command.
    pub fn fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub fn fail_reports(mut self) -> Self {
        self.fail_reports = true;
        self
    }

    /// Stdout returned for `program`.
    pub fn respond(mut self, program: &str, out: &str) -> Self {
        self.responses.insert(program.to_string(), out.to_string());
        self
    }

    pub fn block_when<F>(mut self, matcher: F) -> (Self, Gate)
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        let gate = Gate::default();
        self.gate = Some((Box::new(matcher), gate.clone()));
        (self, gate)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.program().to_string()).collect()
    }

    pub fn reports(&self) -> Vec<Vec<String>> {
        self.reports.lock().unwrap().clone()
    }

    pub fn report_count(&self) -> usize {
        self.report_count.load(Ordering::SeqCst)
    }

    fn failure(argv: &[String]) -> CommandError {
        CommandError::new(argv, Some(5), String::new(), "injected failure".to_string())
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn execute(&self, argv: &[String], input: Option<&[u8]>) -> Result<String> {
        // Behave like a real call: give other tasks a chance to run.
        tokio::task::yield_now().await;

        let program = argv[0].as_str();
        if REPORT_PROGRAMS.contains(&program) && !self.responses.contains_key(program) {
            if self.report_count.fetch_add(1, Ordering::SeqCst) < MAX_RECORDED_REPORTS {
                self.reports.lock().unwrap().push(argv.to_vec());
            }
            if self.fail_reports {
                return Err(Self::failure(argv).into());
            }
            return Ok(String::new());
        }

        self.calls.lock().unwrap().push(Call {
            argv: argv.to_vec(),
            input: input.map(<[u8]>::to_vec),
        });

        if let Some((matcher, gate)) = &self.gate {
            if matcher(argv) {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }

        let n = self.workflow_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(every) = self.fail_every {
            if n % every == 0 {
                return Err(Self::failure(argv).into());
            }
        }

        Ok(self.responses.get(program).cloned().unwrap_or_default())
    }
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines_containing(&self, needles: &[&str]) -> usize {
        self.contents()
            .lines()
            .filter(|line| needles.iter().all(|needle| line.contains(needle)))
            .count()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this thread's logs into a fresh buffer until the guard drops.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
