use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
};

const CONFIG_FILE: &str = "log4rs.yaml";
const FALLBACK_APPENDER: &str = "stderr";

#[ctor::ctor]
fn init() {
    if log4rs::init_file(CONFIG_FILE, Default::default()).is_err() {
        init_fallback();
    }
}

fn init_fallback() {
    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();
    let config = Config::builder()
        .appender(Appender::builder().build(FALLBACK_APPENDER, Box::new(stderr)))
        .build(
            Root::builder()
                .appender(FALLBACK_APPENDER)
                .build(LevelFilter::Warn),
        );
    if let Ok(config) = config {
        let _ = log4rs::init_config(config);
    }
}

pub fn log_singular_values(channel: &str, singular_values: &[f64]) {
    const SHOWN: usize = 8;
    let shown: Vec<String> = singular_values
        .iter()
        .take(SHOWN)
        .map(|value| format!("{:.2}", value))
        .collect();
    log::debug!(
        "{} channel: {} singular values, leading {:?}",
        channel,
        singular_values.len(),
        shown
    );
}
