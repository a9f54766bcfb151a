use std::path::Path;

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}";

/// Logs go to stderr so stdout only carries the scraped families, and
/// additionally to `log_file` when one is given.
pub fn app_config(log_file: Option<&Path>, level: LevelFilter) -> anyhow::Result<Config> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let mut config = Config::builder().appender(Appender::builder().build("stderr", Box::new(stderr)));
    let mut root = Root::builder().appender("stderr");

    if let Some(path) = log_file {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build(path)?;
        config = config.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    Ok(config.build(root.build(level))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_only_config() {
        let config = app_config(None, LevelFilter::Debug).unwrap();
        assert_eq!(config.appenders().len(), 1);
        assert_eq!(config.root().level(), LevelFilter::Debug);
    }

    #[test]
    fn file_appender_is_added() {
        let path = std::env::temp_dir().join(format!("promscrape-log-{}.out", std::process::id()));
        let config = app_config(Some(&path), LevelFilter::Warn).unwrap();
        assert_eq!(config.appenders().len(), 2);
        assert_eq!(config.root().appenders(), ["stderr", "file"]);
        let _ = std::fs::remove_file(path);
    }
}
