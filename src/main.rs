//! # Moodlist
//!
//! Turns a personal listening history into time-of-day "mood
//! playlists": events are encoded as cyclical time features,
//! clustered into listening sessions, named, and turned into
//! per-session playlists.
//!
//! This binary is the glue around the library pipeline: it loads
//! Spotify extended-streaming-history exports, runs one pipeline
//! instance, and prints or exports the results. The core stages live
//! in the library modules and never touch the filesystem.

mod cli;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use moodlist::cluster::KmeansConfig;
use moodlist::event::ListeningEvent;
use moodlist::pipeline::{self, PipelineConfig, PipelineResult};
use moodlist::playlist::{PlaylistConfig, PlaylistEntry};

/// One record of a Spotify extended-streaming-history export.
///
/// Metadata fields are null for podcast episodes and removed tracks;
/// such records are dropped during conversion. Plain field names are
/// accepted too, so pre-normalized histories load as well.
#[derive(Debug, Deserialize)]
struct RawRecord {
    ts: String,
    #[serde(alias = "master_metadata_track_name")]
    track: Option<String>,
    #[serde(alias = "master_metadata_album_artist_name")]
    artist: Option<String>,
    #[serde(alias = "master_metadata_album_album_name")]
    album: Option<String>,
    #[serde(alias = "spotify_track_uri")]
    uri: Option<String>,
    #[serde(default)]
    ms_played: u64,
    #[serde(default)]
    skipped: Option<bool>,
    #[serde(default)]
    shuffle: Option<bool>,
}

impl RawRecord {
    /// Converts to a pipeline event; `None` for records without a
    /// track URI (podcasts, removed tracks).
    fn into_event(self) -> Option<ListeningEvent> {
        let uri = self.uri.filter(|u| !u.is_empty())?;
        Some(ListeningEvent {
            ts: self.ts,
            track: self.track.unwrap_or_default(),
            artist: self.artist.unwrap_or_default(),
            album: self.album.unwrap_or_default(),
            uri,
            ms_played: self.ms_played,
            skipped: self.skipped.unwrap_or(false),
            shuffle: self.shuffle.unwrap_or(false),
        })
    }
}

/// Loads all listening events from a `.json` file or from every
/// `.json` file in a directory.
fn load_events(path: &Path) -> Result<Vec<ListeningEvent>> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {}", path.display()))?
        {
            let entry = entry?;
            let p = entry.path();
            if p.extension().is_some_and(|ext| ext == "json") {
                files.push(p);
            }
        }
        files.sort();
    } else {
        files.push(path.to_path_buf());
    }

    if files.is_empty() {
        anyhow::bail!("No .json files found in {}", path.display());
    }

    let mut events = Vec::new();
    for file in &files {
        let data = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let records: Vec<RawRecord> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse {}", file.display()))?;
        let before = records.len();
        events.extend(records.into_iter().filter_map(RawRecord::into_event));
        debug!("{}: {} records", file.display(), before);
    }

    info!("Loaded {} events from {} file(s)", events.len(), files.len());
    Ok(events)
}

/// Runs the pipeline for one subcommand invocation.
fn run_pipeline(args: &cli::PipelineArgs, playlist: PlaylistConfig) -> Result<PipelineResult> {
    let events = load_events(&args.path)?;

    let config = PipelineConfig {
        timezone: args.timezone,
        kmeans: KmeansConfig {
            clusters: args.clusters,
            seed: args.seed,
            ..KmeansConfig::default()
        },
        playlist,
        ..PipelineConfig::default()
    };

    let mut rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    pipeline::run(&events, &config, &mut rng).context("Pipeline run failed")
}

fn print_summaries(result: &PipelineResult, artists: bool) {
    println!("silhouette score: {:.3}", result.silhouette);
    println!();
    println!("{:>7}  {:<9}  {:<13}  {:>6}  name", "cluster", "day", "time range", "count");
    for summary in &result.summaries {
        println!(
            "{:>7}  {:<9}  {:<13}  {:>6}  {}",
            summary.cluster, summary.day, summary.time_range, summary.count, summary.name
        );
        if artists {
            if let Some(top) = result.top_artists.get(&summary.cluster) {
                for artist in top {
                    println!("{:>9}  {} ({} plays)", "-", artist.artist, artist.listen_count);
                }
            }
        }
    }
}

fn print_playlist(cluster: usize, name: Option<&str>, entries: &[PlaylistEntry]) {
    match name {
        Some(name) => println!("cluster {cluster}: {name}"),
        None => println!("cluster {cluster}"),
    }
    if entries.is_empty() {
        println!("  (no tracks selected)");
    }
    for (i, entry) in entries.iter().enumerate() {
        println!(
            "  {:>2}. {} - {} [{}] (score {:.1})",
            i + 1,
            entry.artist,
            entry.track,
            entry.album,
            entry.popularity_score
        );
    }
}

/// Quotes a CSV field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn export_csv(result: &PipelineResult, out: &Path) -> Result<()> {
    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    for (cluster, entries) in &result.playlists {
        let mut csv = String::from("track,artist,album,uri,popularity_score\n");
        for entry in entries {
            csv.push_str(&format!(
                "{},{},{},{},{:.2}\n",
                csv_field(&entry.track),
                csv_field(&entry.artist),
                csv_field(&entry.album),
                csv_field(&entry.uri),
                entry.popularity_score
            ));
        }
        let file = out.join(format!("cluster_{cluster}.csv"));
        fs::write(&file, csv).with_context(|| format!("Failed to write {}", file.display()))?;
        println!("wrote {}", file.display());
    }
    Ok(())
}

/// Entry point: initialize logging, parse arguments, route commands.
///
/// Logging is controlled via `RUST_LOG`, e.g.
/// `RUST_LOG=moodlist=debug moodlist analyze export/`.
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();
    match args.command {
        cli::Command::Analyze { pipeline, artists } => {
            let result = run_pipeline(&pipeline, PlaylistConfig::default())?;
            print_summaries(&result, artists);
        }
        cli::Command::Playlists {
            pipeline,
            cluster,
            size,
            min_popularity,
        } => {
            let playlist_config = PlaylistConfig {
                max_tracks: size,
                min_popularity,
                ..PlaylistConfig::default()
            };
            let result = run_pipeline(&pipeline, playlist_config)?;

            let name_of = |id: usize| -> Option<&str> {
                result
                    .summaries
                    .iter()
                    .find(|s| s.cluster == id)
                    .map(|s| s.name.as_str())
            };
            match cluster {
                Some(id) => {
                    let entries: &[PlaylistEntry] =
                        result.playlists.get(&id).map_or(&[][..], Vec::as_slice);
                    print_playlist(id, name_of(id), entries);
                }
                None => {
                    for (id, entries) in &result.playlists {
                        print_playlist(*id, name_of(*id), entries);
                        println!();
                    }
                }
            }
        }
        cli::Command::Export { pipeline, out } => {
            let result = run_pipeline(&pipeline, PlaylistConfig::default())?;
            export_csv(&result, &out)?;
        }
        cli::Command::Completions { shell } => {
            let mut cmd = cli::Args::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}
