use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "easel_engine=debug,wgpu=warn").
///
/// `write_style` controls ANSI coloring behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then `info`.
/// Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = choose_filter(config.env_filter, std::env::var("RUST_LOG").ok()) {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
            // wgpu and naga are chatty at info.
            builder.filter_module("wgpu_core", log::LevelFilter::Warn);
            builder.filter_module("wgpu_hal", log::LevelFilter::Warn);
            builder.filter_module("naga", log::LevelFilter::Warn);
        }

        builder.write_style(config.write_style);

        // Another logger may already be installed by an embedding application.
        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

fn choose_filter(configured: Option<String>, env: Option<String>) -> Option<String> {
    configured.or(env).filter(|f| !f.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_filter_wins_over_environment() {
        assert_eq!(
            choose_filter(Some("debug".into()), Some("warn".into())).as_deref(),
            Some("debug")
        );
        assert_eq!(choose_filter(None, Some("warn".into())).as_deref(), Some("warn"));
    }

    #[test]
    fn blank_filter_falls_back_to_default() {
        assert_eq!(choose_filter(None, Some("  ".into())), None);
        assert_eq!(choose_filter(None, None), None);
    }
}