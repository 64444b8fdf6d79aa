//! Activation handler: builds the browser runner URL for an action and
//! hands it to whatever opens URLs on this host.

use std::process::Command;

use anyhow::{bail, Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::binder::Action;
use crate::diagnostics::Diagnostics;
use crate::extract::TEST_SEPARATOR;

/// Host capability that opens a URL (usually in a browser).
pub trait UrlOpener {
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

/// Program and arguments that hand `url` to the default handler on `os`
/// (as named by `std::env::consts::OS`).
///
/// Windows goes through `rundll32` rather than `cmd /C start`: cmd.exe would
/// split the URL at the `&` every runner URL carries.
pub fn open_invocation(os: &str, url: &str) -> (&'static str, Vec<String>) {
    match os {
        "macos" => ("open", vec![url.to_string()]),
        "windows" => (
            "rundll32",
            vec!["url.dll,FileProtocolHandler".to_string(), url.to_string()],
        ),
        _ => ("xdg-open", vec![url.to_string()]),
    }
}

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        let (program, args) = open_invocation(std::env::consts::OS, url);
        let status = Command::new(program)
            .args(&args)
            .status()
            .with_context(|| format!("failed to launch {}", program))?;
        if !status.success() {
            bail!("{} exited with {}", program, status);
        }
        Ok(())
    }
}

/// Writes the URL to stdout instead of opening it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintOpener;

impl UrlOpener for PrintOpener {
    fn open(&self, url: &str) -> Result<()> {
        println!("{}", url);
        Ok(())
    }
}

/// The runner filter string for an action.
pub fn filter_for(action: &Action) -> String {
    match action {
        Action::RunModuleTests { suite_path } => suite_path.clone(),
        Action::RunSingleTest {
            suite_path,
            test_name,
        } => format!("{}{}{}", suite_path, TEST_SEPARATOR, test_name),
    }
}

/// `{base}?hidepassed&filter={filter}` with the filter percent-encoded.
pub fn runner_url(base_url: &str, filter: &str) -> String {
    format!("{}?hidepassed&filter={}", base_url, encode_uri_component(filter))
}

/// Everything `encodeURIComponent` escapes: all but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode UTF-8 bytes the way ECMAScript's `encodeURIComponent` does.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

pub struct Runner<'a> {
    base_url: String,
    opener: &'a dyn UrlOpener,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> Runner<'a> {
    pub fn new(base_url: &str, opener: &'a dyn UrlOpener, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            base_url: base_url.to_string(),
            opener,
            diagnostics,
        }
    }

    pub fn url_for(&self, action: &Action) -> String {
        runner_url(&self.base_url, &filter_for(action))
    }

    /// Open the runner for `action`, returning the URL that was opened.
    pub fn activate(&self, action: &Action) -> Result<String> {
        let url = self.url_for(action);
        match action {
            Action::RunModuleTests { suite_path } => self
                .diagnostics
                .debug(&format!("Running module tests for {} at {}", suite_path, url)),
            Action::RunSingleTest {
                suite_path,
                test_name,
            } => self.diagnostics.debug(&format!(
                "Running test \"{}\" in module \"{}\" with filter: {}",
                test_name,
                suite_path,
                filter_for(action)
            )),
        }

        if let Err(e) = self.opener.open(&url) {
            self.diagnostics
                .error(&format!("Failed to open {}: {:#}", url, e));
            return Err(e.context(format!("failed to open {}", url)));
        }
        Ok(url)
    }

    /// Route a host command invocation to the matching action.
    pub fn handle_command(&self, command_id: &str, args: &[String]) -> Result<String> {
        match Action::from_command(command_id, args) {
            Some(action) => self.activate(&action),
            None => bail!(
                "unknown command {} with {} argument(s)",
                command_id,
                args.len()
            ),
        }
    }
}
