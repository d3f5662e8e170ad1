//! Time-of-day mood playlists from a personal listening history.
//!
//! The pipeline encodes play events as cyclical day-of-week and
//! time-of-day features, clusters them into listening sessions with
//! seeded K-means, names each session, and selects a bounded,
//! de-duplicated playlist per session.
//!
//! Core modules, in dependency order:
//! - [`event`] - Event types and cyclical feature encoding
//! - [`aggregate`] - Per-track aggregation and popularity scoring
//! - [`cluster`] - Seeded K-means and silhouette scoring
//! - [`summary`] - Dominant weekday, time spans, mood naming
//! - [`ranking`] - Per-cluster top artists and songs
//! - [`playlist`] - Three-stage playlist selection
//! - [`pipeline`] - One full run, config in, result out
//!
//! ## Quick Start Example
//!
//! ```
//! use moodlist::cluster::KmeansConfig;
//! use moodlist::event::ListeningEvent;
//! use moodlist::pipeline::{self, PipelineConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let events: Vec<ListeningEvent> = (0..8)
//!     .map(|i| ListeningEvent {
//!         ts: format!("2023-07-1{}T08:30:00Z", i % 7),
//!         track: format!("Track {i}"),
//!         artist: format!("Artist {i}"),
//!         album: "Album".to_string(),
//!         uri: format!("spotify:track:{i}"),
//!         ms_played: 180_000,
//!         skipped: false,
//!         shuffle: false,
//!     })
//!     .collect();
//!
//! let config = PipelineConfig {
//!     timezone: chrono_tz::UTC,
//!     kmeans: KmeansConfig { clusters: 2, ..KmeansConfig::default() },
//!     ..PipelineConfig::default()
//! };
//!
//! // A seeded RNG makes mood words and playlist shuffles
//! // reproducible; use `StdRng::from_entropy()` for variety.
//! let mut rng = StdRng::seed_from_u64(7);
//! let result = pipeline::run(&events, &config, &mut rng)?;
//!
//! for summary in &result.summaries {
//!     println!("{}: {} ({} events)", summary.cluster, summary.name, summary.count);
//! }
//! # Ok::<(), moodlist::Error>(())
//! ```
//!
//! ## Randomness
//!
//! The clustering is deterministic under [`cluster::KmeansConfig::seed`].
//! Mood words and playlist selection draw from the RNG the caller
//! passes in, so two runs with the same seed agree completely and two
//! runs with fresh RNGs differ only in moods and playlist picks,
//! never in cluster statistics.
//!
//! ## Error Handling
//!
//! The pipeline fails fast with [`Error`]: [`Error::Data`] for
//! malformed input (unparseable timestamps, degenerate datasets) and
//! [`Error::Config`] for invalid parameters (cluster counts, playlist
//! sizes). No partial results are produced.

pub mod aggregate;
pub mod cluster;
pub mod error;
pub mod event;
pub mod pipeline;
pub mod playlist;
pub mod ranking;
pub mod summary;

pub use error::{Error, Result};
