use std::fmt::Display;

use colored::Colorize;
use log::{Level, LevelFilter};

/// Dependencies only get to log warnings and errors
const ALLOWED_EXTERNAL_LEVELS: [Level; 2] = [Level::Warn, Level::Error];

pub fn init_logger(verbose: bool) -> Result<(), log::SetLoggerError> {
    let local_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            let target = Target::from_str(record.target());
            let now = chrono::Local::now();

            out.finish(format_args!(
                "{:^5} {} {:^8} {}",
                level_to_string(&record.level()),
                now.format("%H:%M:%S").to_string().bright_black(),
                target,
                message
            ))
        })
        .filter(move |meta| {
            let target = Target::from_str(meta.target());

            if target.is_local() {
                meta.level() <= local_level
            } else {
                ALLOWED_EXTERNAL_LEVELS.contains(&meta.level())
            }
        })
        .chain(std::io::stdout())
        .apply()
}

enum Target {
    External(String),
    Main,
    Core,
    Server,
}

impl Target {
    fn from_str(str: &str) -> Self {
        let module = str.split("::").next().unwrap_or_default();

        match module {
            "devops_manual" => Self::Main,
            "manual_core" => Self::Core,
            "manual_server" => Self::Server,
            other => Self::External(other.to_string()),
        }
    }

    fn is_local(&self) -> bool {
        !matches!(self, Self::External(_))
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            Target::External(x) => x.as_str().clear(),
            Target::Main => "MAIN".bright_purple(),
            Target::Core => "CORE".blue(),
            Target::Server => "SERVER".bright_green(),
        };

        Display::fmt(&result, f)
    }
}

fn level_to_string(level: &Level) -> String {
    match level {
        Level::Error => " ERR ".black().on_red().bold().to_string(),
        Level::Warn => " WRN ".black().on_yellow().bold().to_string(),
        Level::Info => " INF ".black().on_blue().bold().to_string(),
        Level::Debug => " DBG ".white().on_black().to_string(),
        Level::Trace => " TRC ".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_are_resolved_by_crate() {
        assert!(matches!(
            Target::from_str("manual_core::monitor"),
            Target::Core
        ));
        assert!(matches!(Target::from_str("manual_server"), Target::Server));
        assert!(matches!(Target::from_str("devops_manual"), Target::Main));
        assert!(!Target::from_str("sqlx::query").is_local());
    }
}
