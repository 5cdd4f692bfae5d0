//! Builds the `tracing` dispatcher behind a [`Logger`](crate::Logger)

use chrono::Local;
use logit_core::{AppInfo, Env, LoggerConfig};
use logit_rotate::{log_file_name, RollingFile, RollingFileConfig, SharedRotatingWriter, TimeRotatingWriter};
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

use crate::error::Result;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// File writer type used by the logger
pub type FileWriter = SharedRotatingWriter<RollingFile>;

/// Everything the logger has to keep alive
pub(crate) struct Outputs {
    pub dispatch: Dispatch,
    pub file: Option<FileWriter>,
    pub console_guard: Option<WorkerGuard>,
}

/// Console and file sinks, each with its own level filter.
/// Records are JSON outside the local environment.
pub(crate) fn build(app: &AppInfo, config: &LoggerConfig, env: Env) -> Result<Outputs> {
    config.validate()?;

    let json = !env.is_local();
    let timer = ChronoLocal::new(config.time_format.clone());
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let mut console_guard = None;
    if config.enable_console {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        console_guard = Some(guard);
        layers.push(
            format_layer(writer, timer.clone(), json, true)
                .with_filter(LevelFilter::from(config.console_level))
                .boxed(),
        );
    }

    let mut file = None;
    if config.enable_file {
        let writer = open_file_writer(app, config)?;
        layers.push(
            format_layer(writer.clone(), timer, json, false)
                .with_filter(LevelFilter::from(config.file_level))
                .boxed(),
        );
        file = Some(writer);
    }

    let subscriber = Registry::default().with(layers);

    Ok(Outputs {
        dispatch: Dispatch::new(subscriber),
        file,
        console_guard,
    })
}

/// Rolling file for today, wrapped in the forced time rotation writer
pub(crate) fn open_file_writer(app: &AppInfo, config: &LoggerConfig) -> Result<FileWriter> {
    let interval = config.rotation_interval()?;
    let path = config
        .dir
        .join(log_file_name(&app.name, &app.version, Local::now().date_naive()));

    let rolling = RollingFile::new(
        RollingFileConfig::new(path)
            .max_size_mb(config.max_size_mb)
            .max_backups(config.max_backups)
            .max_age_days(config.max_age_days)
            .compress(config.compress),
    );

    Ok(SharedRotatingWriter::new(TimeRotatingWriter::new(
        rolling, interval,
    )))
}

fn format_layer<W>(writer: W, timer: ChronoLocal, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_timer(timer)
        .with_target(false);

    if json {
        layer
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        layer.with_ansi(ansi).boxed()
    }
}
