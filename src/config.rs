use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

const DEFAULT_OUTPUT_PATH: &str = "notes.html";
const DEFAULT_TEMPLATE_PATH: &str = "output.tpl";
// Long options also accepted with a single dash, e.g. `-out notes.html`.
const SINGLE_DASH_LONG: &[&str] = &["out", "template"];

#[derive(Parser, Debug)]
#[command(name = "fmt-kindle-notes", version)]
#[command(about = "Format the notebook exported by a Kindle into a document built from a template")]
pub struct CliArgs {
    /// Exported notebook (HTML)
    #[arg(value_name = "NOTEBOOK")]
    pub notebook: PathBuf,

    /// Name of the output file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Template for the formatted notebook
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub notebook_path: PathBuf,
    pub output_path: PathBuf,
    pub template_path: PathBuf,
    pub verbose: bool,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Bad command line; the message already carries the usage text.
    Usage(String),
    /// `--help` or `--version` was requested.
    Help(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Usage(msg) | ConfigError::Help(msg) => write!(f, "{}", msg.trim_end()),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<clap::Error> for ConfigError {
    fn from(e: clap::Error) -> Self {
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                ConfigError::Help(e.render().to_string())
            }
            _ => ConfigError::Usage(e.render().to_string()),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::parse_from(std::env::args_os())
    }

    pub fn parse_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = CliArgs::try_parse_from(normalize_args(args))?;
        Ok(Self::from_args(cli))
    }

    fn from_args(cli: CliArgs) -> Self {
        let output_path = cli
            .out
            .or_else(|| std::env::var_os("NOTES_OUTPUT_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

        let template_path = cli
            .template
            .or_else(|| std::env::var_os("NOTES_TEMPLATE_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH));

        Config {
            notebook_path: cli.notebook,
            output_path,
            template_path,
            verbose: cli.verbose,
        }
    }
}

/// Rewrites `-out`/`-template` (and their `=value` forms) to the double-dash
/// spelling clap expects, so they are not read as bundled short flags.
fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut after_separator = false;
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if after_separator {
                return arg;
            }
            let Some(s) = arg.to_str() else {
                return arg;
            };
            if s == "--" {
                after_separator = true;
                return arg;
            }
            let is_single_dash_long = s.strip_prefix('-').is_some_and(|rest| {
                let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                SINGLE_DASH_LONG.contains(&name)
            });
            if is_single_dash_long {
                OsString::from(format!("-{}", s))
            } else {
                arg
            }
        })
        .collect()
}
