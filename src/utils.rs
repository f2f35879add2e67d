/// Logging setup and a few display helpers

use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const BANNER_WIDTH: usize = 80;

/// Timestamped log file name, e.g. log_chordeval_2024-05-01_13-45-00.txt
pub fn log_file_name(now: chrono::DateTime<chrono::Local>) -> String {
	format!("log_chordeval_{}.txt", now.format("%Y-%m-%d_%H-%M-%S"))
}

fn open_log_file(filename: &str) -> io::Result<File> {
	OpenOptions::new()
		.create(true)
		.write(true)
		.truncate(true)
		.open(filename)
}

/// Install the global subscriber: stderr always, plus a log file in the
/// current directory when asked. `RUST_LOG` wins over `verbose`.
/// Returns the log file name when one was created.
pub fn init_logging(verbose: bool, with_log_file: bool) -> Option<String> {
	let default_level = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_level));

	let mut created = None;
	let file_layer = if with_log_file {
		let filename = log_file_name(chrono::Local::now());
		match open_log_file(&filename) {
			Ok(file) => {
				created = Some(filename);
				Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
			}
			Err(e) => {
				eprintln!("Warning: Could not create log file {}: {}", filename, e);
				None
			}
		}
	} else {
		None
	};

	// a second init (tests) keeps the first subscriber
	let _ = tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(io::stderr))
		.with(file_layer)
		.try_init();

	if let Some(ref filename) = created {
		tracing::info!("log file created: {}", filename);
	}
	created
}

/// Centered title between two rules of '='
pub fn banner(msg: &str) -> String {
	// truncate the message if needed
	let titre: String = msg.chars().take(BANNER_WIDTH).collect();
	let total_padding = BANNER_WIDTH - titre.chars().count();
	let left_padding = total_padding / 2;
	let right_padding = total_padding - left_padding;
	let line = "=".repeat(BANNER_WIDTH);
	format!("\n{}\n{}{}{}\n{}\n",
		line, " ".repeat(left_padding), titre, " ".repeat(right_padding), line)
}
