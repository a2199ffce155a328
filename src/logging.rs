use {
    log::LevelFilter,
    log4rs::{
        append::console::ConsoleAppender,
        config::{Appender, Config, Root},
        encode::pattern::PatternEncoder,
    },
    crate::error::AppError,
};

const LOG_PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}";

/// Console logger on stderr, so data written to stdout stays clean.
pub fn init_logging(level: LevelFilter) -> Result<log4rs::Handle, AppError>
{
    let console = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(
            Root::builder()
                .appender("console")
                .build(level)
        )
        .map_err(|e| AppError::Logging(e.to_string()))?;

    log4rs::init_config(config)
        .map_err(|e| AppError::Logging(e.to_string()))
}
