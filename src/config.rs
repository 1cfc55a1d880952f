use argh::FromArgs;
use log::LevelFilter;

pub const PROGRAM_NAME: &str = "UNIX-CLI";
pub const VERSION: &str = "0.2";

/// Line prefix that ends the session.
pub const EXIT_DIRECTIVE: &str = "termina";
pub const PROMPT: &str = "% ";
/// Tokens past this count are dropped from a command line.
pub const MAX_ARGS: usize = 64;
/// Bytes past this count are dropped from a command line.
pub const MAX_LINE_BYTES: usize = 4096;

/// Settings for one interpreter session.
///
/// Fields are public so tests and embedders can tweak a default instance
/// without going through the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Marker written before every read.
    pub prompt: String,
    /// Any line starting with this literal terminates the loop.
    pub exit_directive: String,
    /// Maximum number of tokens kept from one line, command name included.
    pub max_args: usize,
    /// Maximum number of bytes kept from one line.
    pub max_line_bytes: usize,
    pub log_level: LevelFilter,
    /// Print the version banner before the first prompt.
    pub show_banner: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: PROMPT.to_string(),
            exit_directive: EXIT_DIRECTIVE.to_string(),
            max_args: MAX_ARGS,
            max_line_bytes: MAX_LINE_BYTES,
            log_level: LevelFilter::Warn,
            show_banner: true,
        }
    }
}

impl Config {
    pub fn banner(&self) -> String {
        format!("{PROGRAM_NAME} version {VERSION}.")
    }

    /// Prefix match against the exit directive. An empty directive never matches.
    pub fn is_exit_directive(&self, line: &str) -> bool {
        !self.exit_directive.is_empty() && line.starts_with(&self.exit_directive)
    }
}

#[derive(FromArgs, Debug)]
/// Interactive command interpreter with built-in file utilities.
pub struct CliArgs {
    #[argh(option)]
    /// prompt marker printed before each command line (default: "% ")
    pub prompt: Option<String>,

    #[argh(option)]
    /// word that ends the session when a line starts with it (default: "termina")
    pub exit_directive: Option<String>,

    #[argh(option, from_str_fn(parse_max_args))]
    /// maximum number of tokens kept from a command line, at least 1
    pub max_args: Option<usize>,

    #[argh(option, default = "LevelFilter::Warn")]
    /// diagnostic log level: off, error, warn, info, debug or trace
    pub log_level: LevelFilter,

    #[argh(switch, short = 'q')]
    /// do not print the version banner
    pub quiet: bool,
}

fn parse_max_args(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("max-args must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("invalid max-args '{value}': {e}")),
    }
}

impl From<CliArgs> for Config {
    fn from(args: CliArgs) -> Self {
        let defaults = Config::default();
        Self {
            prompt: args.prompt.unwrap_or(defaults.prompt),
            exit_directive: args.exit_directive.unwrap_or(defaults.exit_directive),
            max_args: args.max_args.unwrap_or(defaults.max_args),
            max_line_bytes: defaults.max_line_bytes,
            log_level: args.log_level,
            show_banner: !args.quiet,
        }
    }
}
