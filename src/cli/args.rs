//! Command line argument parsing and validation.

use crate::{
    bundler::{Arch, Platform},
    metadata::DEFAULT_CONFIG_FILE,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Desktop app-shell packager for prebuilt WebGPU clients
#[derive(Parser, Debug)]
#[command(
    name = "appshell-bundle",
    version,
    about = "Packages a prebuilt WebGPU client into a desktop app shell",
    long_about = "Places prebuilt client assets (module, data segment, loader) into a desktop
app shell and produces per-platform distributables.

Usage:
  appshell-bundle check
  appshell-bundle package --platform linux
  appshell-bundle make --platform linux --platform win32 --arch x64
  appshell-bundle fuses out/webgpu-demo-linux-x64/webgpu-demo

Exit code 0 = every requested distributable exists, or some exist and the
failures are listed in out/make/report.json."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "APPSHELL_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Target platform (linux, darwin, win32); repeat for several
    #[arg(short, long = "platform", global = true, value_name = "PLATFORM")]
    pub platforms: Vec<Platform>,

    /// Target architecture (x64, ia32, arm64, armv7l)
    #[arg(short, long, global = true, value_name = "ARCH")]
    pub arch: Option<Arch>,

    /// Output directory, overriding `[packager] out_dir`
    #[arg(short, long, global = true, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Print detail lines
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Validate configuration and report external tool availability
    Check,
    /// Build packaged app trees without making distributables
    Package,
    /// Package and produce every configured distributable
    Make,
    /// Print the fuse wire of a runtime binary
    Fuses {
        /// Host runtime executable
        binary: PathBuf,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet cannot be used together".to_string());
        }
        if self.config.as_os_str().is_empty() {
            return Err("--config cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platforms_repeat_and_parse() {
        let args = Args::try_parse_from([
            "appshell-bundle",
            "make",
            "--platform",
            "linux",
            "-p",
            "windows",
            "--arch",
            "arm64",
        ])
        .unwrap();
        assert_eq!(args.command, Command::Make);
        assert_eq!(args.platforms, vec![Platform::Linux, Platform::Win32]);
        assert_eq!(args.arch, Some(Arch::Arm64));
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn unknown_platform_is_an_argument_error() {
        let err = Args::try_parse_from(["appshell-bundle", "make", "--platform", "beos"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let args = Args::try_parse_from(["appshell-bundle", "check", "-v", "-q"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn fuses_takes_a_binary() {
        let args = Args::try_parse_from(["appshell-bundle", "fuses", "runtime/electron"]).unwrap();
        assert_eq!(
            args.command,
            Command::Fuses {
                binary: PathBuf::from("runtime/electron")
            }
        );
    }
}
