use crate::cli::{Args, ColorChoice};

/// Driver settings resolved once from the command line.
#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    pub color_enabled: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            quiet: args.quiet,
        }
    }
}
