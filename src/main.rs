//! Headless inspector for tagged image pair folders.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::{Parser, Subcommand, ValueEnum};

    use pairtag::config::{AppConfig, LogLevel};
    use pairtag::error::Result;
    use pairtag::session::Session;

    /// Inspect folders of image pairs and their tag files.
    #[derive(Parser, Debug)]
    #[command(name = "pairtag", version)]
    pub struct Args {
        /// Log verbosity; overrides the configured level. RUST_LOG still applies on top.
        #[arg(long, value_enum, global = true)]
        log_level: Option<LevelArg>,

        /// Configuration file to use instead of the default location.
        #[arg(long, value_name = "FILE", global = true)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand, Debug)]
    enum Command {
        /// Validate a folder and its tag file, then list every pair with its tag count.
        Check {
            /// Folder of `<name>_1` / `<name>_2` images
            dir: PathBuf,
        },
        /// Print tag labels.
        Tags {
            /// Folder of `<name>_1` / `<name>_2` images
            dir: PathBuf,
            /// Only this pair (default: the last open pair)
            #[arg(long, value_name = "ID")]
            pair: Option<String>,
            /// Print every pair
            #[arg(long, conflicts_with = "pair")]
            all: bool,
        },
    }

    #[derive(ValueEnum, Clone, Copy, Debug)]
    enum LevelArg {
        Error,
        Warn,
        Info,
        Debug,
        Trace,
    }

    impl From<LevelArg> for LogLevel {
        fn from(level: LevelArg) -> Self {
            match level {
                LevelArg::Error => LogLevel::Error,
                LevelArg::Warn => LogLevel::Warn,
                LevelArg::Info => LogLevel::Info,
                LevelArg::Debug => LogLevel::Debug,
                LevelArg::Trace => LogLevel::Trace,
            }
        }
    }

    fn load_config(path: Option<&PathBuf>) -> AppConfig {
        match path {
            Some(path) => AppConfig::load_from_path(path).unwrap_or_else(|e| {
                eprintln!("warning: {e}; using default configuration");
                AppConfig::default()
            }),
            None => AppConfig::load_from_default_path().unwrap_or_default(),
        }
    }

    fn init_logging(level: LogLevel) {
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .parse_default_env()
            .init();
    }

    pub fn run(args: Args) -> ExitCode {
        let mut config = load_config(args.config.as_ref());
        if let Some(level) = args.log_level {
            config.preferences.log_level = level.into();
        }
        init_logging(config.preferences.log_level);
        log::debug!("Using configuration: {:?}", config.preferences);

        let result = match args.command {
            Command::Check { dir } => check(config, &dir),
            Command::Tags { dir, pair, all } => tags(config, &dir, pair.as_deref(), all),
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{e}");
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        }
    }

    fn check(config: AppConfig, dir: &std::path::Path) -> Result<()> {
        let mut session = Session::with_config(config);
        session.load_folder(dir)?;

        let Some(pairs) = session.pairs() else {
            return Ok(());
        };
        let store = session.tag_store();
        for pair in pairs.iter() {
            let marker = if session.current_pair_id() == Some(pair.id.as_str()) {
                '*'
            } else {
                ' '
            };
            println!(
                "{marker} {:<24} {:<28} {:<28} {:>4} tags",
                pair.id,
                pair.left,
                pair.right,
                store.len(&pair.id)
            );
        }

        // Tags of pairs whose images are gone are kept in the file
        for id in store.all().keys().filter(|id| !pairs.contains(id.as_str())) {
            println!("! {:<24} {:>4} tags, images not in folder", id, store.len(id));
        }

        println!(
            "{} pairs, {} tags, tag file {:?}",
            pairs.len(),
            store.total(),
            session.tag_file_path().unwrap_or(dir)
        );
        Ok(())
    }

    fn tags(config: AppConfig, dir: &std::path::Path, pair: Option<&str>, all: bool) -> Result<()> {
        let mut session = Session::with_config(config);
        session.load_folder(dir)?;
        if let Some(id) = pair {
            session.select_pair(id)?;
        }

        let ids: Vec<String> = if all {
            session.pair_ids().into_iter().map(str::to_string).collect()
        } else {
            session.current_pair_id().map(str::to_string).into_iter().collect()
        };

        for id in ids {
            println!("{id}:");
            for label in session.tag_store().labels(&id) {
                println!("  {label}");
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    cli::run(cli::Args::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
