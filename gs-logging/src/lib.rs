//! Logging setup shared by the guildspace binaries.
//!
//! Everything is driven by environment variables:
//!
//! - `LOG_LEVEL`: default filter when `RUST_LOG` is unset (`info`).
//! - `LOG_FORMAT`: `human` or `json`.
//! - `LOG_OUTPUT`: `console`, `file` or `both`.
//! - `LOG_FILE_PATH`: file target, rolled daily (`/tmp/guildspace.log`).
//! - `LOG_TAGS`: comma separated `key:value` span filters, e.g.
//!   `identity:atlas`. A value of `*` only requires the key to be present.
//!
//! Console output goes to stderr so acknowledgements printed on stdout stay
//! machine readable.

use std::{
    collections::HashMap,
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::{field::Visit, span, subscriber::Interest, Metadata, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Directive,
    fmt::MakeWriter,
    layer::{Context, Layer},
    prelude::*,
    registry,
    registry::LookupSpan,
    EnvFilter,
};

const DEFAULT_LOG_FILE: &str = "/tmp/guildspace.log";

/// Dependencies whose debug output drowns ours.
const QUIET_TARGETS: [&str; 4] = ["hyper=warn", "reqwest=warn", "rustls=warn", "tokio=warn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
}

impl LogOutput {
    fn console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file_path: PathBuf,
    pub tags: Vec<Tag>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Human,
            output: LogOutput::Console,
            file_path: PathBuf::from(DEFAULT_LOG_FILE),
            tags: Vec::new(),
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Unknown values fall back to the
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Human,
        };
        let output = match lookup("LOG_OUTPUT").as_deref() {
            Some("file") => LogOutput::File,
            Some("both") => LogOutput::Both,
            _ => LogOutput::Console,
        };

        Self {
            level: lookup("LOG_LEVEL")
                .filter(|l| !l.trim().is_empty())
                .unwrap_or(defaults.level),
            format,
            output,
            file_path: lookup("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_path),
            tags: lookup("LOG_TAGS").map(|t| parse_tags(&t)).unwrap_or_default(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let base = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        QUIET_TARGETS
            .iter()
            .filter_map(|d| d.parse::<Directive>().ok())
            .fold(base, EnvFilter::add_directive)
    }

    fn file_target(&self) -> (&Path, &Path) {
        let dir = self
            .file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("/tmp"));
        let name = self
            .file_path
            .file_name()
            .map(Path::new)
            .unwrap_or_else(|| Path::new("guildspace.log"));
        (dir, name)
    }
}

/// Parse `key:value` pairs separated by commas, skipping malformed entries.
pub fn parse_tags(raw: &str) -> Vec<Tag> {
    raw.split(',')
        .filter_map(|s| {
            let (key, value) = s.split_once(':')?;
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some(Tag {
                key: key.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

// --- Writer duplicating output to two sinks ---
struct Tee<A, B> {
    a: A,
    b: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let first = self.a.write_all(buf);
        let second = self.b.write_all(buf);
        first.and(second).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.a.flush()?;
        self.b.flush()
    }
}

#[derive(Clone)]
struct MakeTee<A, B> {
    make_a: A,
    make_b: B,
}

impl<'a, A, B> MakeWriter<'a> for MakeTee<A, B>
where
    A: MakeWriter<'a>,
    B: MakeWriter<'a>,
{
    type Writer = Tee<A::Writer, B::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        Tee {
            a: self.make_a.make_writer(),
            b: self.make_b.make_writer(),
        }
    }
}

// --- Span field filtering ---
type SpanFields = HashMap<String, String>;

struct TagFilterLayer {
    filters: Vec<Tag>,
}

impl<S> Layer<S> for TagFilterLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = SpanFields::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            values.record(&mut FieldVisitor(fields));
        }
    }

    fn register_callsite(&self, _meta: &'static Metadata<'static>) -> Interest {
        // The verdict depends on the current span, so it cannot be cached.
        if self.filters.is_empty() {
            Interest::always()
        } else {
            Interest::sometimes()
        }
    }

    fn enabled(&self, meta: &Metadata<'_>, ctx: Context<'_, S>) -> bool {
        if self.filters.is_empty() || meta.is_span() {
            return true;
        }

        // With tags configured, events outside any span are dropped.
        let Some(scope) = ctx.lookup_current().map(|span| span.scope()) else {
            return false;
        };

        let mut all_fields = SpanFields::new();
        for span in scope {
            if let Some(fields) = span.extensions().get::<SpanFields>() {
                for (k, v) in fields {
                    all_fields.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
        }

        self.filters.iter().all(|filter| {
            all_fields
                .get(&filter.key)
                .is_some_and(|value| filter.value == "*" || value.contains(&filter.value))
        })
    }
}

struct FieldVisitor<'a>(&'a mut SpanFields);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

/// Initializes the global tracing subscriber from environment variables.
///
/// The returned guard flushes file output on drop and must be kept alive
/// for the lifetime of the program.
pub fn init_subscriber() -> Option<WorkerGuard> {
    init_with(&LogSettings::from_env())
}

pub fn init_with(settings: &LogSettings) -> Option<WorkerGuard> {
    let subscriber = registry().with(settings.env_filter()).with(TagFilterLayer {
        filters: settings.tags.clone(),
    });
    let json = settings.format == LogFormat::Json;

    let mut guard = None;
    let file_writer = if settings.output.file() {
        let (dir, name) = settings.file_target();
        let appender = tracing_appender::rolling::daily(dir, name);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);
        Some(non_blocking)
    } else {
        None
    };

    // A subscriber may already be installed (tests, embedding); keep it.
    let installed = match (settings.output.console(), file_writer) {
        (true, Some(file)) => {
            let writer = MakeTee {
                make_a: io::stderr,
                make_b: file,
            };
            let layer = tracing_subscriber::fmt::layer().with_writer(writer);
            if json {
                subscriber.with(layer.json()).try_init()
            } else {
                subscriber.with(layer.with_ansi(false)).try_init()
            }
        }
        (true, None) => {
            let layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
            if json {
                subscriber.with(layer.json()).try_init()
            } else {
                subscriber.with(layer).try_init()
            }
        }
        (false, Some(file)) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false);
            if json {
                subscriber.with(layer.json()).try_init()
            } else {
                subscriber.with(layer).try_init()
            }
        }
        (false, None) => subscriber.try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already set, keeping it");
    }

    guard
}
