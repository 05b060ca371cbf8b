//! Sectioned command-line options feeding the command-line layer
//!
//! [`ArgSections`] is a registry over clap's builder API. Options are
//! grouped under titled help sections; two sections come pre-registered
//! for every application (see [`GENERIC_SECTION`] and [`CONFIG_SECTION`]).
//! The registry implements [`CommandLineSource`], so the parsed values
//! flow into the configuration's command-line layer: present flags map to
//! `true`, valued options to their string, and everything not supplied to
//! null, which the layer treats as absent.

use std::env;

use clap::{Arg, ArgAction, Command};
use indexmap::IndexMap;
use strata_core::{CommandLineSource, Error, Result, Value};

/// Help section holding the options every application shares
pub const GENERIC_SECTION: &str = "Generic options";
/// Help section holding the configuration-engine options
pub const CONFIG_SECTION: &str = "Configuration options";

#[derive(Debug, Clone)]
struct OptionSpec {
    name: String,
    short: Option<char>,
    help: String,
    takes_value: bool,
    section: String,
}

/// Command-line options grouped under titled help sections
#[derive(Debug, Clone)]
pub struct ArgSections {
    script_name: String,
    banner: Option<String>,
    specs: Vec<OptionSpec>,
    argv: Vec<String>,
}

impl ArgSections {
    /// Create a registry for `script_name`, capturing the process
    /// arguments and pre-registering the shared sections
    pub fn new(script_name: impl Into<String>) -> Self {
        let mut sections = Self {
            script_name: script_name.into(),
            banner: None,
            specs: Vec::new(),
            argv: env::args().skip(1).collect(),
        };
        sections.register_builtins();
        sections
    }

    /// Replace the captured arguments, for tests and embedding
    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        self.argv = argv;
        self
    }

    /// Set the banner shown above the option sections in help output
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    /// The script name used in usage output
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Register a boolean flag under a section
    ///
    /// Registering a name twice is invalid usage and leaves the registry
    /// unchanged.
    pub fn add_flag(
        &mut self,
        section: &str,
        name: &str,
        short: Option<char>,
        help: &str,
    ) -> Result<()> {
        self.push_spec(section, name, short, help, false)
    }

    /// Register an option taking a value under a section
    pub fn add_option(
        &mut self,
        section: &str,
        name: &str,
        short: Option<char>,
        help: &str,
    ) -> Result<()> {
        self.push_spec(section, name, short, help, true)
    }

    /// Register a group of options under one section title
    ///
    /// ```
    /// # use strata_cli::ArgSections;
    /// let mut args = ArgSections::new("myscript");
    /// args.section("Network options", |section| {
    ///     section.flag("offline", None, "Do not touch the network.")?;
    ///     section.option("proxy", Some('p'), "Proxy to go through.")
    /// })?;
    /// # Ok::<(), strata_core::Error>(())
    /// ```
    pub fn section<F>(&mut self, title: &str, register: F) -> Result<()>
    where
        F: FnOnce(&mut SectionWriter<'_>) -> Result<()>,
    {
        let mut writer = SectionWriter {
            sections: self,
            title: title.to_string(),
        };
        register(&mut writer)
    }

    /// Render the help text with every registered section
    pub fn help(&self) -> String {
        let mut command = self.command();
        command.render_help().to_string()
    }

    fn register_builtins(&mut self) {
        self.record(GENERIC_SECTION, "auto", None, "Auto mode. Bypasses questions to user.", false);
        self.record(GENERIC_SECTION, "simulate", None, "Do not perform the actual underlying actions.", false);
        self.record(GENERIC_SECTION, "verbose", Some('v'), "Enable verbose mode.", false);
        self.record(GENERIC_SECTION, "help", Some('h'), "Displays this help.", false);
        self.record(CONFIG_SECTION, "config-file", None, "Specify a config file.", true);
        self.record(CONFIG_SECTION, "config-override", None, "If specified override all other config.", false);
        self.record(CONFIG_SECTION, "log-level", None, "Specify the log level.", true);
    }

    fn record(&mut self, section: &str, name: &str, short: Option<char>, help: &str, takes_value: bool) {
        self.specs.push(OptionSpec {
            name: name.to_string(),
            short,
            help: help.to_string(),
            takes_value,
            section: section.to_string(),
        });
    }

    fn push_spec(
        &mut self,
        section: &str,
        name: &str,
        short: Option<char>,
        help: &str,
        takes_value: bool,
    ) -> Result<()> {
        if self.specs.iter().any(|spec| spec.name == name) {
            return Err(Error::invalid_usage(format!(
                "Option '--{}' is already registered",
                name
            )));
        }
        self.record(section, name, short, help, takes_value);
        Ok(())
    }

    /// Build the clap command from the recorded specs
    ///
    /// Parse errors are ignored so that arguments meant for the hosting
    /// application never break the configuration layer, and clap's own
    /// help and version flags are disabled in favor of the registered
    /// ones.
    fn command(&self) -> Command {
        let mut command = Command::new(self.script_name.clone())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .ignore_errors(true);
        if let Some(banner) = &self.banner {
            command = command.about(banner.clone());
        }
        for spec in &self.specs {
            let mut arg = Arg::new(spec.name.clone())
                .long(spec.name.clone())
                .help(spec.help.clone())
                .help_heading(spec.section.clone());
            if let Some(short) = spec.short {
                arg = arg.short(short);
            }
            arg = if spec.takes_value {
                arg.action(ArgAction::Set)
            } else {
                arg.action(ArgAction::SetTrue)
            };
            command = command.arg(arg);
        }
        command
    }
}

impl CommandLineSource for ArgSections {
    fn snapshot(&self) -> IndexMap<String, Value> {
        let mut values = IndexMap::new();
        let matches = match self.command().try_get_matches_from(&self.argv) {
            Ok(matches) => matches,
            Err(e) => {
                log::warn!("Could not parse the command line: {}", e);
                for spec in &self.specs {
                    values.insert(spec.name.clone(), Value::Null);
                }
                return values;
            }
        };
        for spec in &self.specs {
            let value = if spec.takes_value {
                match matches.get_one::<String>(&spec.name) {
                    Some(text) => Value::String(text.clone()),
                    None => Value::Null,
                }
            } else if matches.get_flag(&spec.name) {
                Value::Bool(true)
            } else {
                Value::Null
            };
            values.insert(spec.name.clone(), value);
        }
        values
    }
}

/// Registers options under one section title
///
/// Handed to the closure passed to [`ArgSections::section`].
pub struct SectionWriter<'a> {
    sections: &'a mut ArgSections,
    title: String,
}

impl SectionWriter<'_> {
    /// Register a boolean flag
    pub fn flag(&mut self, name: &str, short: Option<char>, help: &str) -> Result<()> {
        self.sections.push_spec(&self.title, name, short, help, false)
    }

    /// Register an option taking a value
    pub fn option(&mut self, name: &str, short: Option<char>, help: &str) -> Result<()> {
        self.sections.push_spec(&self.title, name, short, help, true)
    }
}
