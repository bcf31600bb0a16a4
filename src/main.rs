mod app;
mod calc;
mod config;
mod error;
mod executor;
mod matcher;
mod model;
mod observer;
mod sources;
mod state;
mod ui;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use directories::BaseDirs;
use std::fs::OpenOptions;
use std::path::PathBuf;
use crate::config::{Config, load_config};
use crate::executor::SpawnLauncher;
use crate::observer::LogObserver;
use crate::sources::bin::Executables;
use crate::sources::desktop::DesktopSource;
use crate::sources::folders::Folders;
use crate::sources::history::{History, default_history_path};
use crate::sources::session::Sessions;
use crate::state::{Catalog, Engine, expand_home};
use crate::ui::picker::DmenuPicker;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Resolve this instead of starting from the full listing
    command: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Picker command line, overriding the config
    #[arg(short, long)]
    picker: Option<String>,
}

fn init_logging(config: &Config) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(config.logging.level.as_str());
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(path) = &config.logging.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {:?}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Config
    let config = load_config(args.config.as_deref())?;
    init_logging(&config)?;

    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    let expand = |path: &str| expand_home(path, home.as_deref());

    // 2. Collect sources
    let executable_dirs: Vec<PathBuf> = config.commands.executable_dirs.iter().map(|d| expand(d.as_str())).collect();
    let history_size = config.general.history_size;
    let history_path = config.history.file.as_ref().map(|p| expand(&p.to_string_lossy()));
    let history = match history_path.or_else(default_history_path) {
        Some(path) => History::load(path, history_size),
        None => History::in_memory(history_size),
    };
    let menu_dirs = match &config.menu.dirs {
        Some(dirs) => dirs.iter().map(|d| expand(d.as_str())).collect(),
        None => DesktopSource::default_dirs(),
    };

    let catalog = Catalog {
        history,
        folders: Folders::new(config.browse.folders.clone()),
        sessions: Sessions::new(config.session.clone()),
        executables: Executables::new(&config.commands.executables, &executable_dirs),
        menu: DesktopSource::new(menu_dirs).scan(),
    };

    // 3. Run
    let launcher = SpawnLauncher::new(&config.general.opener, &executable_dirs);
    let mut engine = Engine::new(catalog, launcher, LogObserver).with_home(home);
    let picker_command = args.picker.as_deref().unwrap_or(&config.general.picker);
    let mut picker = DmenuPicker::new(picker_command)?;

    app::run(&mut engine, &mut picker, args.command.as_deref().unwrap_or(""))?;
    Ok(())
}
