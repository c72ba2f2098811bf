use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockadvise")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Analyze Docker images and containers for optimization opportunities", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Analyze local Docker images for size, security, and performance issues
    #[arg(long)]
    pub images: bool,

    /// Analyze Docker containers (default: running only)
    #[arg(long)]
    pub containers: bool,

    /// Inspect stopped containers as well (implies --containers)
    #[arg(long)]
    pub all_containers: bool,

    /// Continuously analyze at the given interval in seconds
    #[arg(long, value_name = "SECONDS")]
    pub watch: Option<u64>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,

    /// Docker CLI binary to invoke
    #[arg(long, env = "DOCKADVISE_DOCKER", default_value = "docker", global = true)]
    pub docker: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint Dockerfiles in a file or directory tree
    #[command(arg_required_else_help = true)]
    Lint {
        /// Dockerfile or directory to scan
        path: PathBuf,
    },

    /// Build an image for every directory containing a Dockerfile
    Build {
        /// Root directory to walk
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}
