use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use testlens::binder::Action;
use testlens::cli::commands;
use testlens::cli::{Cli, Commands};
use testlens::config::{self, Settings};
use testlens::diagnostics::{init_tracing, TracingDiagnostics};
use testlens::runner::{PrintOpener, SystemOpener, UrlOpener};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config_override = cli.config.as_deref().map(Path::new);

    let settings = load_settings(&cli, &project_path, config_override)?;
    init_tracing(settings.debug);
    let diagnostics = TracingDiagnostics;

    match cli.command {
        Commands::Scan { ref paths } => {
            let output =
                commands::run_scan(&project_path, paths, &settings, &cli.format, &diagnostics)?;
            println!("{}", output);
        }

        Commands::RunModule {
            ref suite_path,
            print,
        } => {
            let action = Action::RunModuleTests {
                suite_path: suite_path.clone(),
            };
            open(&action, &settings, print, &diagnostics)?;
        }

        Commands::RunTest {
            ref suite_path,
            ref test_name,
            print,
        } => {
            let action = Action::RunSingleTest {
                suite_path: suite_path.clone(),
                test_name: test_name.clone(),
            };
            open(&action, &settings, print, &diagnostics)?;
        }

        Commands::Url {
            ref suite_path,
            ref test_name,
        } => {
            let action = match test_name {
                Some(test_name) => Action::RunSingleTest {
                    suite_path: suite_path.clone(),
                    test_name: test_name.clone(),
                },
                None => Action::RunModuleTests {
                    suite_path: suite_path.clone(),
                },
            };
            println!("{}", commands::run_url(&action, &settings, &cli.format));
        }

        Commands::ToggleDebug => {
            let output = commands::run_toggle_debug(&project_path, config_override, &diagnostics)?;
            println!("{}", output);
        }
    }

    Ok(())
}

/// Settings from the config file, with CLI flags layered on top.
fn load_settings(cli: &Cli, project_path: &Path, config_override: Option<&Path>) -> Result<Settings> {
    let mut settings = config::load_project_settings(project_path, config_override)?;
    if cli.debug {
        settings.debug = true;
    }
    if let Some(base_url) = &cli.base_url {
        settings.test_runner_base_url = base_url.clone();
    }
    Ok(settings)
}

fn open(action: &Action, settings: &Settings, print: bool, diagnostics: &TracingDiagnostics) -> Result<()> {
    let opener: &dyn UrlOpener = if print { &PrintOpener } else { &SystemOpener };
    let url = commands::run_action(action, settings, opener, diagnostics)?;
    if !print {
        println!("Opened {}", url);
    }
    Ok(())
}
