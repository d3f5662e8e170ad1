//! Command-line interface definitions.
//!
//! Clap derive structures for the `moodlist` binary. All analysis
//! subcommands read a Spotify extended-streaming-history export (a
//! `.json` file or a directory of them) and run the clustering
//! pipeline over it.
//!
//! ## Examples
//!
//! ```bash
//! moodlist analyze ~/spotify-export/
//! moodlist playlists ~/spotify-export/ --cluster 3
//! moodlist export ~/spotify-export/ --out playlists/
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main application arguments.
#[derive(Parser)]
#[command(name = "moodlist")]
#[command(about = "Moodlist: time-of-day mood playlists from your listening history")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline options shared by every analysis subcommand.
#[derive(ClapArgs, Debug)]
pub struct PipelineArgs {
    /// Listening-history export: a .json file or a directory of them
    pub path: PathBuf,

    /// Target number of clusters (K)
    #[arg(short = 'k', long, default_value_t = 50)]
    pub clusters: usize,

    /// Seed for the clustering initialization search
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Seed for mood words and playlist shuffles; omit for fresh
    /// randomness on every run
    #[arg(long)]
    pub rng_seed: Option<u64>,

    /// Reference time zone the timestamps are interpreted in
    #[arg(long, default_value = "US/Eastern")]
    pub timezone: chrono_tz::Tz,
}

/// All available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Cluster the history and print a summary per cluster
    ///
    /// Shows each cluster's dominant weekday, time span, event count
    /// and generated name, plus the silhouette score of the
    /// clustering (range [-1, 1], higher is better separation).
    Analyze {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Also list the top artists of each cluster
        #[arg(long)]
        artists: bool,
    },

    /// Generate and print per-cluster playlists
    Playlists {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Only show the playlist for this cluster id
        #[arg(long)]
        cluster: Option<usize>,

        /// Maximum tracks per playlist
        #[arg(short = 'n', long, default_value_t = 30)]
        size: usize,

        /// Popularity floor for the final selection stage
        #[arg(long, default_value_t = 10.0)]
        min_popularity: f64,
    },

    /// Export per-cluster playlists as CSV files
    ///
    /// Writes one `cluster_<id>.csv` per populated cluster with the
    /// columns `track,artist,album,uri,popularity_score`.
    Export {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output directory (created if missing)
        #[arg(short, long, default_value = "playlists")]
        out: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_analyze_defaults() {
        let args = Args::parse_from(["moodlist", "analyze", "history.json"]);
        match args.command {
            Command::Analyze { pipeline, artists } => {
                assert_eq!(pipeline.clusters, 50);
                assert_eq!(pipeline.seed, 42);
                assert_eq!(pipeline.rng_seed, None);
                assert_eq!(pipeline.timezone, chrono_tz::US::Eastern);
                assert!(!artists);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_playlists_flags() {
        let args = Args::parse_from([
            "moodlist",
            "playlists",
            "history.json",
            "-k",
            "12",
            "--cluster",
            "3",
            "-n",
            "15",
            "--timezone",
            "Europe/Berlin",
        ]);
        match args.command {
            Command::Playlists {
                pipeline,
                cluster,
                size,
                ..
            } => {
                assert_eq!(pipeline.clusters, 12);
                assert_eq!(pipeline.timezone, chrono_tz::Europe::Berlin);
                assert_eq!(cluster, Some(3));
                assert_eq!(size, 15);
            }
            _ => panic!("expected playlists"),
        }
    }
}
