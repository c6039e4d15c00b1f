use color_eyre::eyre::Result;
use log::LevelFilter;
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn init_logging(debug: bool) -> Result<()> {
    let log_level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_dir = get_default_log_dir();
    fs::create_dir_all(&log_dir)?;

    let log_file = log_dir.join("ggnav.log");

    env_logger::Builder::new()
        .filter_level(log_level)
        .target(env_logger::Target::Pipe(Box::new(
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)?,
        )))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] - {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()?;

    log::info!("Logging to {} at level {log_level}", log_file.display());
    Ok(())
}

fn get_default_log_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => env::var_os("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(home).join(".local/state"))
            .join("ggnav"),
        None => PathBuf::from("/tmp/ggnav"),
    }
}
