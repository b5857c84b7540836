//! Logging bootstrap.
//!
//! Every non-"default" section of [`LoggingConfig`] names a target prefix
//! (`apps_catalog`, `modkit_db`, `sqlx`, ...). Console output is plain text,
//! file output is JSON written through a size-rotated file. Targets that match
//! no section fall back to the "default" section.

use crate::config::{LoggingConfig, Section};
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_MAX_SIZE_MB: u64 = 100;

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// `target == prefix` or `target` starts with `prefix::`.
fn matches_crate_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

// -------- rotating file writer --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file lock poisoned"))?
            .flush()
    }
}

/// Writer for one event; `None` drops the bytes.
struct RoutedWriter(Option<RotWriter>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes each event to the file of the longest matching target prefix,
/// or to the default file.
#[derive(Clone, Default)]
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: Vec<(String, RotWriter)>,
}

impl FileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_crate_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
    }

}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve_for(meta.target()))
    }
}

// -------- config split --------

struct ConfigData<'a> {
    default_section: Option<&'a Section>,
    crate_sections: Vec<(String, &'a Section)>,
}

impl ConfigData<'_> {
    fn crate_names(&self) -> Vec<String> {
        self.crate_sections.iter().map(|(n, _)| n.clone()).collect()
    }
}

fn extract_config_data(cfg: &LoggingConfig) -> ConfigData<'_> {
    let mut crate_sections = cfg
        .iter()
        .filter(|(k, _)| k.as_str() != "default")
        .map(|(k, v)| (k.clone(), v))
        .collect::<Vec<_>>();
    crate_sections.sort_by(|a, b| a.0.cmp(&b.0));

    ConfigData {
        default_section: cfg.get("default"),
        crate_sections,
    }
}

/// Absolute paths are kept; relative ones are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer_at_path(log_path: &Path, section: &Section) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let limit = match (section.max_backups, section.max_age_days) {
        (Some(n), _) => FileLimit::MaxFiles(n),
        (None, Some(days)) => FileLimit::Age(chrono::Duration::days(i64::from(days))),
        (None, None) => FileLimit::Age(chrono::Duration::days(1)),
    };

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn section_writer(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let log_path = resolve_log_path(&section.file, base_dir);
    match create_rotating_writer_at_path(&log_path, section) {
        Ok(w) => Some(w),
        Err(e) => {
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name,
                log_path.to_string_lossy(),
                e
            );
            None
        }
    }
}

fn build_file_router(config: &ConfigData, base_dir: &Path) -> FileRouter {
    let default = config
        .default_section
        .and_then(|s| section_writer("default", s, base_dir));
    let by_prefix = config
        .crate_sections
        .iter()
        .filter_map(|(name, s)| section_writer(name, s, base_dir).map(|w| (name.clone(), w)))
        .collect();
    FileRouter { default, by_prefix }
}

fn level_targets<'a>(
    sections: impl Iterator<Item = (&'a String, &'a str)>,
) -> Targets {
    sections.fold(
        Targets::new().with_default(LevelFilter::OFF),
        |targets, (name, level)| match parse_tracing_level(level) {
            Some(l) => targets.with_target(name.clone(), LevelFilter::from_level(l)),
            None => targets,
        },
    )
}

/// Events whose target matches none of `crate_names`, at `max_level` or above.
fn default_filter(
    crate_names: Vec<String>,
    max_level: Level,
) -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool> {
    FilterFn::new(move |meta: &tracing::Metadata<'_>| {
        !crate_names
            .iter()
            .any(|c| matches_crate_prefix(meta.target(), c))
            && *meta.level() <= max_level
    })
}

fn console_layer(ansi: bool) -> impl Layer<Registry> + Send + Sync {
    fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
}

fn file_layer(router: FileRouter) -> impl Layer<Registry> + Send + Sync {
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(router)
}

fn build_layers(config: &ConfigData, router: FileRouter) -> Vec<BoxedLayer> {
    let ansi = std::io::stdout().is_terminal();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console_targets = level_targets(
        config
            .crate_sections
            .iter()
            .map(|(n, s)| (n, s.console_level.as_str())),
    );
    layers.push(console_layer(ansi).with_filter(console_targets).boxed());

    if !router.by_prefix.is_empty() {
        let file_targets = level_targets(
            config
                .crate_sections
                .iter()
                .filter(|(_, s)| !s.file.trim().is_empty())
                .map(|(n, s)| (n, s.file_level.as_str())),
        );
        layers.push(file_layer(router.clone()).with_filter(file_targets).boxed());
    }

    if let Some(section) = config.default_section {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            layers.push(
                console_layer(ansi)
                    .with_filter(default_filter(config.crate_names(), level))
                    .boxed(),
            );
        }
        if router.default.is_some() {
            if let Some(level) = parse_tracing_level(&section.file_level) {
                layers.push(
                    file_layer(router)
                        .with_filter(default_filter(config.crate_names(), level))
                        .boxed(),
                );
            }
        }
    }

    layers
}

/// Install the global subscriber.
///
/// `base_dir` anchors relative log file paths (usually `server.home_dir`).
/// An empty config installs a plain console subscriber. Calling this twice
/// keeps the first subscriber.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // `log` records from sqlx and friends go through tracing too.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let config = extract_config_data(cfg);
    let router = build_file_router(&config, base_dir);
    let layers = build_layers(&config, router);
    let _ = Registry::default().with(layers).try_init();
}

pub fn init_default_logging() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(file: &str) -> Section {
        Section {
            console_level: "info".into(),
            file: file.into(),
            file_level: "debug".into(),
            max_age_days: Some(7),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level("Info"), Some(Level::INFO));
        assert_eq!(parse_tracing_level("warn"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("none"), None);
        assert_eq!(parse_tracing_level("bogus"), Some(Level::INFO));
    }

    #[test]
    fn test_crate_prefix_matching() {
        assert!(matches_crate_prefix("apps_catalog", "apps_catalog"));
        assert!(matches_crate_prefix("apps_catalog::service", "apps_catalog"));
        assert!(!matches_crate_prefix("apps_catalogue", "apps_catalog"));
        assert!(!matches_crate_prefix("sqlx", "apps_catalog"));
    }

    #[test]
    fn test_extract_config_data_separates_default() {
        let mut cfg = default_logging_config();
        cfg.insert("modkit_db".into(), section("logs/db.log"));
        cfg.insert("apps_catalog".into(), section(""));

        let data = extract_config_data(&cfg);
        assert!(data.default_section.is_some());
        assert_eq!(data.crate_names(), vec!["apps_catalog", "modkit_db"]);
    }

    #[test]
    fn test_file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = tmp.path().join("abs.log");
        assert_eq!(resolve_log_path(abs.to_str().unwrap(), Path::new("/x")), abs);
    }

    #[test]
    fn test_rotating_writer_creates_parent_and_writes() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");

        let mut w = create_rotating_writer_at_path(&p, &section("")).unwrap();
        w.write_all(b"{\"msg\":\"hello\"}\n").unwrap();
        w.flush().unwrap();
        assert!(p.exists());
    }

    #[test]
    fn test_router_prefers_longest_prefix_then_default() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("logs/all.log"));
        cfg.insert("apps_catalog".into(), section("logs/catalog.log"));
        cfg.insert("apps_catalog::infra".into(), section("logs/storage.log"));
        cfg.insert("quiet".into(), section(""));

        let data = extract_config_data(&cfg);
        let router = build_file_router(&data, tmp.path());
        assert_eq!(router.by_prefix.len(), 2);

        let pick = |target: &str| {
            let w = router.resolve_for(target).unwrap();
            [
                ("storage", &router.by_prefix[1].1),
                ("catalog", &router.by_prefix[0].1),
            ]
            .iter()
            .find(|(_, cand)| Arc::ptr_eq(&cand.0, &w.0))
            .map(|(n, _)| *n)
            .unwrap_or("default")
        };
        assert_eq!(pick("apps_catalog::infra::storage"), "storage");
        assert_eq!(pick("apps_catalog::domain"), "catalog");
        assert_eq!(pick("sqlx::query"), "default");
    }

    #[test]
    fn test_empty_router_drops_writes() {
        let mut w = RoutedWriter(FileRouter::default().resolve_for("anything"));
        assert_eq!(w.write(b"abc").unwrap(), 3);
        w.flush().unwrap();
    }
}
