use once_cell::sync::OnceCell;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Target used for the mutation audit trail written by the rolling file layer.
pub const AUDIT_TARGET: &str = "frd.audit";

static AUDIT_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Install the process-wide subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Console output goes to stderr so stdout stays free for rendered views.
    let fmt_layer = fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));
    if std::env::var("FRD_LOG_ROLL").ok().as_deref() == Some("1") {
        let dir = std::env::var("FRD_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let rotation = std::env::var("FRD_LOG_ROTATION").unwrap_or_else(|_| "daily".into());
        prepare_audit_dir(&dir);
        let writer = match rotation_kind(&rotation) {
            Rotation::Hourly => tracing_appender::rolling::hourly(&dir, "frd-audit"),
            Rotation::Minutely => tracing_appender::rolling::minutely(&dir, "frd-audit"),
            Rotation::Daily => tracing_appender::rolling::daily(&dir, "frd-audit"),
        };
        let (nb, guard) = tracing_appender::non_blocking(writer);
        let _ = AUDIT_GUARD.set(guard);
        let targets = Targets::new().with_target(AUDIT_TARGET, tracing::Level::INFO);
        let audit_layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(nb)
            .with_filter(targets);
        let _ = registry.with(audit_layer).try_init();
    } else {
        let _ = registry.try_init();
    }
}

/// Creates the audit directory. Runs before any subscriber exists, so a
/// failure goes straight to stderr.
fn prepare_audit_dir(dir: &str) -> bool {
    match std::fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(err) => {
            eprintln!("frd-otel: cannot create audit log directory {dir}: {err}");
            false
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Rotation {
    Hourly,
    Minutely,
    Daily,
}

fn rotation_kind(raw: &str) -> Rotation {
    match raw.trim().to_lowercase().as_str() {
        "hourly" => Rotation::Hourly,
        "minutely" => Rotation::Minutely,
        _ => Rotation::Daily,
    }
}
