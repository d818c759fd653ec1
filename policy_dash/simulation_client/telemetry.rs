use std::{fmt, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord, FileEventPublisher};
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};
use tokio::runtime::Runtime;

use crate::config::TelemetrySettings;

/// Telemetry builder for the simulation client.
pub struct ClientTelemetryBuilder {
    module: String,
    sink: Option<Arc<dyn LogSink>>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl ClientTelemetryBuilder {
    /// Creates a new builder scoped to a module label.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            sink: None,
            event_publisher: None,
        }
    }

    /// Sets the log sink.
    #[must_use]
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Opens the file destinations named in `settings`.
    pub fn settings(mut self, settings: &TelemetrySettings) -> Result<Self> {
        if let Some(path) = &settings.log_path {
            self.sink = Some(Arc::new(JsonLogger::with_min_level(
                path,
                settings.min_level,
            )?));
        }
        if let Some(path) = &settings.event_log {
            self.event_publisher = Some(Arc::new(FileEventPublisher::new(path)?));
        }
        Ok(self)
    }

    /// Builds telemetry.
    #[must_use]
    pub fn build(self) -> ClientTelemetry {
        ClientTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sink: self.sink,
                publisher: self.event_publisher,
            }),
        }
    }
}

/// Telemetry handle shared by client components. Cloning is cheap.
#[derive(Clone)]
pub struct ClientTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for ClientTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTelemetry")
            .field("module", &self.inner.module)
            .field("logs", &self.inner.sink.is_some())
            .field("events", &self.inner.publisher.is_some())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    sink: Option<Arc<dyn LogSink>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl ClientTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> ClientTelemetryBuilder {
        ClientTelemetryBuilder::new(module)
    }

    /// Writes a structured log record.
    pub fn log(&self, level: LogLevel, message: &str, metadata: &Value) -> Result<()> {
        if let Some(sink) = &self.inner.sink {
            sink.log(&LogRecord::new(&self.inner.module, level, message).with_metadata(metadata))?;
        }
        Ok(())
    }

    /// Publishes an event and waits until the publisher has accepted it.
    pub async fn publish(&self, event_type: &str, payload: Value) -> Result<()> {
        let Some(publisher) = &self.inner.publisher else {
            return Ok(());
        };
        let record = EventRecord::new(&self.inner.module, event_type, payload);
        publisher.publish(record).await
    }

    /// Publishes an event without waiting for delivery when a runtime is available.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        let Some(publisher) = &self.inner.publisher else {
            return Ok(());
        };
        let record = EventRecord::new(&self.inner.module, event_type, payload);
        if tokio::runtime::Handle::try_current().is_ok() {
            let publisher = Arc::clone(publisher);
            tokio::spawn(async move {
                if let Err(err) = publisher.publish(record).await {
                    tracing::warn!("event publish failed: {err:#}");
                }
            });
            Ok(())
        } else {
            Runtime::new()?.block_on(publisher.publish(record))
        }
    }
}
