//! 日志初始化：`RUST_LOG` 优先，其次为命令行给出的过滤规则。

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 解析过滤规则；`RUST_LOG` 缺失或无效时退回 `fallback`，二者都无效时退回 info。
fn build_env_filter(rust_log: Option<&str>, fallback: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// 初始化 tracing 日志订阅。
pub fn init_logging(fallback: &str) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_env_filter(rust_log.as_deref(), fallback);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn rust_log_overrides_fallback() {
        let filter = build_env_filter(Some("debug"), "info,redis=warn");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn invalid_directives_fall_back() {
        let filter = build_env_filter(Some("redis=loud"), "warn");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = build_env_filter(None, "redis=loud");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
