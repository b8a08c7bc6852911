use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::LogConfig;

/// Installs the global `tracing` subscriber.
pub struct Logger {
    level: Level,
}

impl Logger {
    /// Installs a subscriber at the configured level. If one is already
    /// installed (a second engine in the same process, a test harness), the
    /// existing one is kept.
    pub fn new(config: &LogConfig) -> Self {
        let level = Level::from_str(&config.level).unwrap_or(Level::INFO);

        let installed = if config.pretty {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_thread_names(true)
                .pretty()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        } else {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_thread_names(true)
                .compact()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        };

        match installed {
            Ok(()) => tracing::debug!("Logger installed at level {level}"),
            Err(_) => tracing::debug!("A global subscriber is already installed; keeping it"),
        }

        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(&LogConfig::default())
    }
}
