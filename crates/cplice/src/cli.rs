//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::Parser;

/// cplice - append a data image's layers to a base image without pulling either
#[derive(Parser, Debug)]
#[command(name = "cplice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base image reference (host/path:tag)
    #[arg(value_name = "BASE")]
    pub basecontainer: String,

    /// Data image reference whose layers are appended (host/path:tag)
    #[arg(value_name = "DATA")]
    pub datacontainer: String,

    /// Reference to publish the spliced image as (host/path:tag)
    #[arg(value_name = "NEW")]
    pub newcontainer: String,

    /// Skip TLS certificate verification for every registry
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Publish under this tag instead of the tag in NEW
    #[arg(long, value_name = "TAG", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    pub tag: Option<String>,

    /// Docker-style credential file (default: $DOCKER_CONFIG/config.json or ~/.docker/config.json)
    #[arg(long, value_name = "PATH", env = "CPLICE_AUTH_FILE")]
    pub auth_file: Option<Utf8PathBuf>,

    /// Check that every merged layer exists in the destination repository before publishing
    #[arg(long)]
    pub check_layers: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and the published reference
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
