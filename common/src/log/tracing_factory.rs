use std::sync::Once;

use tracing::Level;
use tracing_subscriber::{fmt, FmtSubscriber};

/// TracingFactory 全局只初始化一次
static INIT: Once = Once::new();

#[derive(Debug, Clone, Default)]
pub struct TracingFactory {}

impl TracingFactory {
    /// Installs a global fmt subscriber. `debug` lowers the max level to DEBUG,
    /// otherwise INFO. Calls after the first one are ignored.
    pub fn init_log(debug: bool) {
        INIT.call_once(|| {
            let level = if debug { Level::DEBUG } else { Level::INFO };

            let format = fmt::format()
                .with_thread_ids(true)
                .with_target(true)
                .compact();

            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .event_format(format)
                .finish();

            if tracing::subscriber::set_global_default(subscriber).is_err() {
                eprintln!("Unable to set global default subscriber");
            }
        });
    }

    pub fn is_init() -> bool {
        INIT.is_completed()
    }
}
