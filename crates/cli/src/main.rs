// FILE: crates/cli/src/main.rs

use anyhow::{anyhow, Context, Result};
use audiofolio_config::{Config, ConfigManager};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

mod commands;
mod context;
mod player;

use context::AppContext;

fn build_cli() -> Command {
    Command::new("audiofolio")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Folder-based audiobook player")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to the config file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("state")
                .short('s')
                .long("state")
                .value_name("FILE")
                .help("Path to the saved-state file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("root")
                .about("Choose the folder that holds one sub-folder per book")
                .arg(
                    Arg::new("dir")
                        .required(true)
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(Command::new("books").about("List the books in the library folder"))
        .subcommand(
            Command::new("chapters")
                .about("List the chapters of a book")
                .arg(Arg::new("book").required(true).value_name("BOOK")),
        )
        .subcommand(Command::new("recent").about("List recently opened books"))
        .subcommand(
            Command::new("forget")
                .about("Remove a book from the recent list with its positions and bookmarks")
                .arg(Arg::new("book").required(true).value_name("BOOK")),
        )
        .subcommand(Command::new("bookmarks").about("List bookmarks, newest first"))
        .subcommand(
            Command::new("play")
                .about("Play a book")
                .arg(Arg::new("book").required(true).value_name("BOOK"))
                .arg(
                    Arg::new("resume")
                        .short('r')
                        .long("resume")
                        .help("Continue from the saved position in the current chapter")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("chapter")
                        .long("chapter")
                        .value_name("N")
                        .help("Start at chapter N (1-based)")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("resume-bookmark")
                .about("Play from a bookmark, numbered as in `bookmarks`")
                .arg(
                    Arg::new("number")
                        .required(true)
                        .value_name("N")
                        .value_parser(value_parser!(usize)),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> Result<(ConfigManager, Config)> {
    let manager = match matches.get_one::<PathBuf>("config") {
        Some(path) => ConfigManager::with_file(path.clone()),
        None => ConfigManager::new(),
    }
    .context("Failed to locate config")?;

    let config = match manager.load_with_env_overrides() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}; using defaults", e);
            manager.load_or_default()
        }
    };
    Ok((manager, config))
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow!("{} is required", name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let (manager, config) = load_config(&matches)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.to_string()),
    )
    .init();

    let state_path = matches
        .get_one::<PathBuf>("state")
        .cloned()
        .unwrap_or_else(|| manager.state_path(&config));
    log::debug!("Using state file {}", state_path.display());
    let ctx = AppContext::open(config, &state_path)?;

    match matches.subcommand() {
        Some(("root", sub)) => {
            let dir = sub
                .get_one::<PathBuf>("dir")
                .ok_or_else(|| anyhow!("DIR is required"))?;
            commands::set_root(&ctx, dir)
        }
        Some(("books", _)) => commands::list_books(&ctx),
        Some(("chapters", sub)) => commands::list_chapters(&ctx, required(sub, "book")?),
        Some(("recent", _)) => commands::list_recent(&ctx),
        Some(("forget", sub)) => commands::forget_book(&ctx, required(sub, "book")?),
        Some(("bookmarks", _)) => commands::list_bookmarks(&ctx),
        Some(("play", sub)) => {
            commands::play_book(
                &ctx,
                required(sub, "book")?,
                sub.get_flag("resume"),
                sub.get_one::<usize>("chapter").copied(),
            )
            .await
        }
        Some(("resume-bookmark", sub)) => {
            let number = sub
                .get_one::<usize>("number")
                .copied()
                .ok_or_else(|| anyhow!("N is required"))?;
            commands::resume_bookmark(&ctx, number).await
        }
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_play_arguments() {
        let matches = build_cli()
            .try_get_matches_from(["audiofolio", "play", "Dune", "--resume", "--chapter", "3"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "play");
        assert_eq!(sub.get_one::<String>("book").unwrap(), "Dune");
        assert!(sub.get_flag("resume"));
        assert_eq!(sub.get_one::<usize>("chapter"), Some(&3));
    }

    #[test]
    fn test_global_state_flag_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["audiofolio", "books", "--state", "/tmp/s.json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("state"),
            Some(&PathBuf::from("/tmp/s.json"))
        );
    }

    #[test]
    fn test_config_file_flag() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let matches = build_cli()
            .try_get_matches_from(["audiofolio", "--config", path.to_str().unwrap(), "recent"])
            .unwrap();

        let (manager, config) = load_config(&matches).unwrap();
        assert_eq!(manager.config_path(), path);
        assert_eq!(config, Config::default());
    }
}
