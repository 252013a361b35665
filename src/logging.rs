use std::io::Write;

use chrono::Utc;
use colored::{Color, Colorize as _};
use env_logger::{Builder, Env};
use log::Level;
use sms_relay::server::ACCESS_LOG_TARGET;

pub fn init() {
    let mut builder = Builder::new();

    builder.parse_env(get_env());

    builder.format(|f, record| {
        let time = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string().dimmed();
        let color = color_by_level(record.level());
        let level = level_letter(record.level()).color(color);
        let target = short_target(record.target()).dimmed();
        let message = record.args().to_string();
        // Access lines are frequent; keep them uncolored
        let message = if record.target() == ACCESS_LOG_TARGET {
            message.normal()
        } else {
            message.color(color)
        };

        writeln!(f, "{time} [{level}@{target}] {message}")
    });

    builder.init();
}

/// Our own modules log at `debug` in debug builds, dependencies only from `warn`.
fn get_env() -> Env<'static> {
    let own_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let default_filter = format!("warn,sms_relay={own_level},{ACCESS_LOG_TARGET}=info");
    Env::default().default_filter_or(default_filter)
}

fn short_target(target: &str) -> &str {
    target.strip_prefix("sms_relay::").unwrap_or(target)
}

const fn color_by_level(level: Level) -> Color {
    match level {
        Level::Trace => Color::Magenta,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

const fn level_letter(level: Level) -> &'static str {
    match level {
        Level::Trace => "T",
        Level::Debug => "D",
        Level::Info => "I",
        Level::Warn => "W",
        Level::Error => "E",
    }
}
