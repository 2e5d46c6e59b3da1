use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// the input path to the scene file
    pub scene: String,
    /// the path where the rendered image is saved, the extension picks the format
    #[arg(short, long, default_value = "output.png")]
    pub output: String,
    /// sub-pixel grid size: every pixel averages samples x samples rays
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=16))]
    pub samples: u32,
    /// randomize the sample positions inside their sub-pixel cell
    #[arg(long, default_value = "false")]
    pub jitter: bool,
    /// override the recursion depth declared in the scene
    #[arg(long)]
    pub max_depth: Option<u32>,
    /// logging verbosity
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
