//! The logging facade

use logit_core::{AppInfo, Env, LogitConfig, TRACKER_FLUSH_TIMEOUT_MS};
use logit_tracker::{ErrorEvent, ErrorTracker, EventLevel, NoopTracker, TrackerClient};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::field::display;
use tracing::{warn, Dispatch};
use tracing_appender::non_blocking::WorkerGuard;

use crate::context::LogContext;
use crate::dump::write_dump;
use crate::error::Result;
use crate::fields::{Field, Fields};
use crate::subscriber::{self, FileWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Info,
    Warn,
    Error,
}

/// Emit one event at a runtime chosen severity; tracing callsites need a
/// constant level, so each arm expands its own callsite.
macro_rules! record {
    ($severity:expr, $($rest:tt)+) => {
        match $severity {
            Severity::Info => tracing::info!(target: "logit", $($rest)+),
            Severity::Warn => tracing::warn!(target: "logit", $($rest)+),
            Severity::Error => tracing::error!(target: "logit", $($rest)+),
        }
    };
}

/// Structured logger with console/file sinks and error tracking.
///
/// Every record carries `app_name`, `app_version`, `op` and `trace_id`.
/// Error and fatal records are also submitted to the error tracker.
pub struct Logger {
    app_name: String,
    app_version: String,
    dispatch: Dispatch,
    tracker: Arc<dyn ErrorTracker>,
    file: Option<FileWriter>,
    _console_guard: Option<WorkerGuard>,
}

impl Logger {
    /// Build a logger with an explicit tracker
    pub fn new(config: &LogitConfig, env: Env, tracker: Arc<dyn ErrorTracker>) -> Result<Self> {
        config.app.validate()?;
        let outputs = subscriber::build(&config.app, &config.logger, env)?;

        Ok(Self {
            app_name: config.app.name.clone(),
            app_version: config.app.version.clone(),
            dispatch: outputs.dispatch,
            tracker,
            file: outputs.file,
            _console_guard: outputs.console_guard,
        })
    }

    /// Build a logger, starting an error tracker when one is configured
    /// and the environment is not local
    pub fn from_config(config: &LogitConfig, env: Env) -> Result<Self> {
        let tracker: Arc<dyn ErrorTracker> = match &config.sentry {
            Some(sentry) if !env.is_local() => {
                Arc::new(TrackerClient::from_config(sentry, env, &config.app)?)
            }
            _ => Arc::new(NoopTracker),
        };
        Self::new(config, env, tracker)
    }

    /// Logger that discards everything
    pub fn nop() -> Self {
        Self {
            app_name: String::new(),
            app_version: String::new(),
            dispatch: Dispatch::none(),
            tracker: Arc::new(NoopTracker),
            file: None,
            _console_guard: None,
        }
    }

    pub fn app(&self) -> AppInfo {
        AppInfo {
            name: self.app_name.clone(),
            version: self.app_version.clone(),
        }
    }

    /// The dispatcher records are sent to
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// The rotating file writer, when file output is enabled
    pub fn file_writer(&self) -> Option<&FileWriter> {
        self.file.as_ref()
    }

    /// Make this logger's dispatcher the process wide `tracing` default
    pub fn install_global(&self) -> Result<()> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())?;
        Ok(())
    }

    pub fn info(&self, ctx: &LogContext, message: &str, fields: &[Field]) {
        self.emit(Severity::Info, ctx, message, fields, None);
    }

    pub fn infof(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.emit(Severity::Info, ctx, &args.to_string(), &[], None);
    }

    pub fn warn(&self, ctx: &LogContext, message: &str, fields: &[Field]) {
        self.emit(Severity::Warn, ctx, message, fields, None);
    }

    pub fn warnf(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.emit(Severity::Warn, ctx, &args.to_string(), &[], None);
    }

    /// Log `err` and submit it to the error tracker
    pub fn error(&self, ctx: &LogContext, err: &(dyn StdError + 'static), fields: &[Field]) {
        self.report(EventLevel::Error, ctx, ErrorEvent::from_error(EventLevel::Error, err), fields);
    }

    /// Log a formatted error and submit it to the error tracker
    pub fn errorf(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        let event = ErrorEvent::new(EventLevel::Error, args.to_string());
        self.report(EventLevel::Error, ctx, event, &[]);
    }

    /// Log `err`, submit it, flush outputs and exit the process with status 1
    pub fn fatal(&self, ctx: &LogContext, err: &(dyn StdError + 'static), fields: &[Field]) -> ! {
        self.report_fatal(ctx, ErrorEvent::from_error(EventLevel::Fatal, err), fields);
        std::process::exit(1)
    }

    pub fn fatalf(&self, ctx: &LogContext, args: fmt::Arguments<'_>) -> ! {
        self.report_fatal(ctx, ErrorEvent::new(EventLevel::Fatal, args.to_string()), &[]);
        std::process::exit(1)
    }

    /// Print `values` to stdout between rules, outside the structured pipeline
    pub fn debug(&self, values: &[&dyn fmt::Debug]) {
        let stdout = std::io::stdout();
        let _ = write_dump(&mut stdout.lock(), values);
    }

    /// Flush the error tracker and close the log file
    pub fn shutdown(&self) -> Result<()> {
        if !self
            .tracker
            .flush(Duration::from_millis(TRACKER_FLUSH_TIMEOUT_MS))
        {
            warn!("Error tracker did not drain before shutdown");
        }
        self.report_retention_failure();
        if let Some(file) = &self.file {
            file.writer().close()?;
        }
        Ok(())
    }

    /// Surface pruning or compression failures recorded by the rolling file.
    /// Runs after the writer lock is released, so the warning can go back
    /// through the file layer.
    fn report_retention_failure(&self) {
        let Some(file) = &self.file else {
            return;
        };
        if let Some(e) = file.writer().with_sink(|f| f.take_retention_error()) {
            tracing::dispatcher::with_default(&self.dispatch, || {
                warn!(
                    target: "logit",
                    app_name = %self.app_name,
                    app_version = %self.app_version,
                    "Failed to apply log retention: {}",
                    e
                )
            });
        }
    }

    fn report(&self, level: EventLevel, ctx: &LogContext, event: ErrorEvent, fields: &[Field]) {
        let backtrace = Backtrace::capture();
        let stacktrace = (backtrace.status() == BacktraceStatus::Captured).then_some(&backtrace);

        let trace_id = ctx.trace_id();
        let ctx = ctx.with_trace(Some(trace_id.as_ref()));
        let fatal = level == EventLevel::Fatal;

        self.emit(Severity::Error, &ctx, &event.message, fields, stacktrace);

        let mut event = event
            .with_tag("op", ctx.op())
            .with_tag("trace_id", trace_id.as_ref());
        for field in fields {
            event = event.with_tag(field.key.clone(), field.value.clone());
        }
        if fatal {
            event = event.with_tag("fatal", "true");
        }
        self.tracker.capture(event);
    }

    fn report_fatal(&self, ctx: &LogContext, event: ErrorEvent, fields: &[Field]) {
        self.report(EventLevel::Fatal, ctx, event, fields);
        if let Err(e) = self.shutdown() {
            eprintln!("logit: shutdown before exit failed: {}", e);
        }
    }

    fn emit(
        &self,
        severity: Severity,
        ctx: &LogContext,
        message: &str,
        fields: &[Field],
        stacktrace: Option<&Backtrace>,
    ) {
        let op = ctx.op();
        let trace_id = ctx.trace_id();
        let extra = (!fields.is_empty()).then(|| display(Fields(fields)));
        let stacktrace = stacktrace.map(display);

        tracing::dispatcher::with_default(&self.dispatch, || {
            record!(
                severity,
                app_name = %self.app_name,
                app_version = %self.app_version,
                op = %op,
                trace_id = %trace_id,
                fields = extra,
                stacktrace = stacktrace,
                "{}",
                message
            )
        });
        self.report_retention_failure();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field("file", &self.file.is_some())
            .finish()
    }
}
