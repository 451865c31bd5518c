//! Tracker configuration.

use crate::types::{AppInfo, DefaultContext, Identifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default collection endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://www.google-analytics.com/batch";

/// Default debounce window between the first queued hit and its flush.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(500);

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default data source.
pub const DEFAULT_DATA_SOURCE: &str = "app";

/// Language code of the process locale, from `LC_ALL`, `LC_MESSAGES` or
/// `LANG` (first one set). `None` for the `C`/`POSIX` locales.
pub fn locale_language() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
        .and_then(|value| language_code(&value))
}

/// `en_US.UTF-8` → `en`.
fn language_code(locale: &str) -> Option<String> {
    let code = locale
        .split(['_', '-', '.', '@'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if code.is_empty() || code == "c" || code == "posix" {
        return None;
    }
    if !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(code)
}

/// How accepted hits reach the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Queue hits and flush them together after the debounce window.
    #[default]
    Batch,
    /// Send every hit on its own, without waiting.
    Immediate,
}

/// Receives one human readable line per delivery outcome.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Tracker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) endpoint: Url,
    pub(crate) context: DefaultContext,
    pub(crate) flush_delay: Duration,
    pub(crate) timeout: Duration,
    pub(crate) mode: DispatchMode,
}

impl Config {
    /// Get the collection endpoint.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Get the parameters sent with every hit.
    pub fn context(&self) -> &DefaultContext {
        &self.context
    }

    /// Get the debounce window.
    pub fn flush_delay(&self) -> Duration {
        self.flush_delay
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the dispatch mode.
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }
}

/// Builder for [`Tracker`](crate::Tracker).
pub struct TrackerBuilder {
    tracking_id: String,
    identifier: Identifier,
    endpoint: Option<String>,
    app_info: Option<AppInfo>,
    data_source: Option<String>,
    user_language: Option<String>,
    flush_delay: Option<Duration>,
    timeout: Option<Duration>,
    mode: DispatchMode,
    pub(crate) log: Option<LogSink>,
    pub(crate) runtime: Option<tokio::runtime::Handle>,
}

impl fmt::Debug for TrackerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerBuilder")
            .field("tracking_id", &self.tracking_id)
            .field("identifier", &self.identifier)
            .field("endpoint", &self.endpoint)
            .field("flush_delay", &self.flush_delay)
            .field("timeout", &self.timeout)
            .field("mode", &self.mode)
            .field("log", &self.log.is_some())
            .finish_non_exhaustive()
    }
}

impl TrackerBuilder {
    /// Create a new builder for the given tracking id and user.
    pub fn new(tracking_id: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            identifier,
            endpoint: None,
            app_info: None,
            data_source: Some(DEFAULT_DATA_SOURCE.into()),
            user_language: locale_language(),
            flush_delay: None,
            timeout: None,
            mode: DispatchMode::default(),
            log: None,
            runtime: None,
        }
    }

    /// Set the collection endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the application info sent with every hit.
    pub fn app_info(mut self, app_info: AppInfo) -> Self {
        self.app_info = Some(app_info);
        self
    }

    /// Set the data source, or `None` to omit it.
    pub fn data_source(mut self, data_source: Option<impl Into<String>>) -> Self {
        self.data_source = data_source.map(Into::into);
        self
    }

    /// Set the user language (e.g. `en-us`), or `None` to omit it.
    ///
    /// Defaults to [`locale_language`].
    pub fn user_language(mut self, language: Option<impl Into<String>>) -> Self {
        self.user_language = language.map(Into::into);
        self
    }

    /// Set the debounce window.
    pub fn flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = Some(delay);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the dispatch mode.
    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Receive delivery outcomes as text.
    pub fn log(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log = Some(Arc::new(sink));
        self
    }

    /// Run timers and sends on this runtime instead of the current one.
    pub fn runtime(mut self, handle: tokio::runtime::Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the configuration.
    pub(crate) fn build_config(&mut self) -> Result<Config, crate::Error> {
        if self.tracking_id.is_empty() {
            return Err(crate::Error::Config("tracking_id cannot be empty".into()));
        }

        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = Url::parse(raw)
            .map_err(|e| crate::Error::Config(format!("invalid endpoint {:?}: {}", raw, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(crate::Error::Config(format!(
                "endpoint must be http or https, got {:?}",
                endpoint.scheme()
            )));
        }

        let flush_delay = self.flush_delay.unwrap_or(DEFAULT_FLUSH_DELAY);
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(crate::Error::Config("timeout must be positive".into()));
        }

        let mut context = DefaultContext::new(self.tracking_id.clone(), self.identifier.clone());
        context.app_info = self.app_info.take();
        context.data_source = self.data_source.take();
        context.user_language = self.user_language.take();

        Ok(Config {
            endpoint,
            context,
            flush_delay,
            timeout,
            mode: self.mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> TrackerBuilder {
        TrackerBuilder::new("UA-1234-1", Identifier::user("usr_1"))
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder().build_config().unwrap();

        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.context().tracking_id(), "UA-1234-1");
        assert_eq!(config.context().data_source(), Some(DEFAULT_DATA_SOURCE));
        assert_eq!(
            config.context().user_language(),
            locale_language().as_deref()
        );
        assert_eq!(config.flush_delay(), DEFAULT_FLUSH_DELAY);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.mode(), DispatchMode::Batch);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = builder()
            .endpoint("https://collector.example.com/batch")
            .app_info(AppInfo::new("Demo"))
            .data_source(None::<String>)
            .user_language(Some("en-us"))
            .flush_delay(Duration::from_millis(50))
            .timeout(Duration::from_secs(5))
            .mode(DispatchMode::Immediate)
            .build_config()
            .unwrap();

        assert_eq!(config.endpoint(), "https://collector.example.com/batch");
        assert_eq!(config.context().app_info().map(|a| a.name.as_str()), Some("Demo"));
        assert_eq!(config.context().data_source(), None);
        assert_eq!(config.context().user_language(), Some("en-us"));
        assert_eq!(config.flush_delay(), Duration::from_millis(50));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.mode(), DispatchMode::Immediate);
    }

    #[test]
    fn test_builder_can_omit_user_language() {
        let config = builder()
            .user_language(None::<String>)
            .build_config()
            .unwrap();

        assert_eq!(config.context().user_language(), None);
    }

    #[test]
    fn test_language_code_from_locale() {
        assert_eq!(language_code("en_US.UTF-8").as_deref(), Some("en"));
        assert_eq!(language_code("de_DE@euro").as_deref(), Some("de"));
        assert_eq!(language_code("pt-BR").as_deref(), Some("pt"));
        assert_eq!(language_code("FR").as_deref(), Some("fr"));
        assert_eq!(language_code("C.UTF-8"), None);
        assert_eq!(language_code("POSIX"), None);
        assert_eq!(language_code(""), None);
    }

    #[test]
    fn test_builder_empty_tracking_id_fails() {
        let result = TrackerBuilder::new("", Identifier::anonymous()).build_config();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_bad_endpoints() {
        assert!(builder().endpoint("not a url").build_config().is_err());
        assert!(builder().endpoint("ftp://example.com/batch").build_config().is_err());
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        assert!(builder().timeout(Duration::ZERO).build_config().is_err());
    }

    #[test]
    fn test_dispatch_mode_names() {
        let mode: DispatchMode = serde_json::from_str("\"immediate\"").unwrap();
        assert_eq!(mode, DispatchMode::Immediate);
    }
}
