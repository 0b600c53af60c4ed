use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(
    base: &Path,
    stem: &str,
    keep: u32,
) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Builds the process logging config.
///
/// - `dir`: base directory for `app.log` and `audit.log`; `None` logs to stderr only.
/// - `level`: error|warn|info|debug|trace (default info)
/// - `retention`: rolled files to keep (default 7)
/// - `dev`: route `devlog!` trace lines (target `devcamper::dev`) to `dev.log`
///
/// # Errors
/// Returns an error if the directory cannot be created or an appender fails to build.
pub fn build_config(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    dev: bool,
) -> Result<Config, Box<dyn std::error::Error>> {
    let lvl = parse_level(level);
    let keep = u32::try_from(retention.unwrap_or(7)).unwrap_or(7);
    let Some(base) = dir else {
        let console = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .target(log4rs::append::console::Target::Stderr)
            .build();
        return Ok(Config::builder()
            .appender(Appender::builder().build("console", Box::new(console)))
            .build(Root::builder().appender("console").build(lvl))?);
    };
    std::fs::create_dir_all(base)?;
    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(base, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(base, "audit", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build("devcamper::audit", lvl));
    builder = if dev {
        builder
            .appender(Appender::builder().build("dev", Box::new(rolling(base, "dev", keep)?)))
            .logger(
                Logger::builder()
                    .appender("dev")
                    .additive(false)
                    .build("devcamper::dev", LevelFilter::Trace),
            )
    } else {
        builder.logger(Logger::builder().additive(false).build("devcamper::dev", LevelFilter::Off))
    };
    Ok(builder.build(Root::builder().appender("app").build(lvl))?)
}

/// Configure logging globally for the process. A second call is ignored by log4rs
/// (the first configuration wins), which keeps tests that share a process harmless.
pub fn configure_logging(dir: Option<&Path>, level: Option<&str>, retention: Option<usize>) {
    configure_logging_with_dev(dir, level, retention, false);
}

pub fn configure_logging_with_dev(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    dev: bool,
) {
    match build_config(dir, level, retention, dev) {
        Ok(cfg) => {
            let _ = log4rs::init_config(cfg);
        }
        Err(e) => eprintln!("logging disabled: {e}"),
    }
}

/// Configure logging from environment variables if present:
/// - DEVCAMPER_LOG_DIR
/// - DEVCAMPER_LOG_LEVEL
/// - DEVCAMPER_LOG_RETENTION
/// - DEVCAMPER_DEV (1/true/yes)
pub fn configure_from_env() {
    let dir = std::env::var("DEVCAMPER_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("DEVCAMPER_LOG_LEVEL").ok();
    let retention =
        std::env::var("DEVCAMPER_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    let dev = std::env::var("DEVCAMPER_DEV")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure_logging_with_dev(dir.as_deref(), level.as_deref(), retention, dev);
}
