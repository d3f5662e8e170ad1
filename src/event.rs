//! Listening events and cyclical time-feature encoding.
//!
//! A play instance becomes four real-valued features: day-of-week and
//! time-of-day, each as a (sin, cos) pair so that distance metrics
//! respect wraparound (23:59 sits next to 00:01, Sunday next to
//! Monday). Clustering happens in that 4-D space.

use chrono::{DateTime, Datelike, Timelike};
use chrono_tz::Tz;
use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::error::{Error, Result};

/// Minutes in a day, the period of the time-of-day features.
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// One play instance from the listening history.
///
/// The timestamp is kept as the raw RFC 3339 string from the export;
/// [`encode_events`] parses it, so malformed timestamps surface as a
/// data error from the encoder rather than at deserialization time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListeningEvent {
    /// Timestamp of the play, RFC 3339 (e.g. `2023-07-12T19:30:00Z`).
    pub ts: String,
    pub track: String,
    pub artist: String,
    pub album: String,
    /// Stable track URI, the identity used for aggregation and dedup.
    pub uri: String,
    pub ms_played: u64,
    pub skipped: bool,
    pub shuffle: bool,
}

/// A listening event augmented with cyclical time features.
///
/// Invariant: `dow_sin² + dow_cos² ≈ 1` and `time_sin² + time_cos² ≈ 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedEvent {
    pub dow_sin: f64,
    pub dow_cos: f64,
    pub time_sin: f64,
    pub time_cos: f64,
    pub track: String,
    pub artist: String,
    pub album: String,
    pub uri: String,
    pub ms_played: u64,
    pub skipped: bool,
    pub shuffle: bool,
}

impl EncodedEvent {
    /// The four cyclical features as a point in clustering space.
    #[must_use]
    pub fn features(&self) -> [f64; 4] {
        [self.dow_sin, self.dow_cos, self.time_sin, self.time_cos]
    }
}

/// Encodes raw events into cyclical time features, preserving order
/// and all non-time attributes.
///
/// Timestamps are converted to the reference time zone first, so the
/// same instant lands in the same weekday/minute bucket regardless of
/// the offset it was exported with.
///
/// # Errors
///
/// Returns [`Error::Data`] if any timestamp is empty or unparseable.
pub fn encode_events(events: &[ListeningEvent], tz: Tz) -> Result<Vec<EncodedEvent>> {
    let encoded = events
        .iter()
        .map(|event| encode_event(event, tz))
        .collect::<Result<Vec<_>>>()?;

    debug!("Encoded {} events in zone {}", encoded.len(), tz);
    Ok(encoded)
}

fn encode_event(event: &ListeningEvent, tz: Tz) -> Result<EncodedEvent> {
    if event.ts.trim().is_empty() {
        return Err(Error::data(format!("missing timestamp for track '{}'", event.track)));
    }

    let local = DateTime::parse_from_rfc3339(&event.ts)
        .map_err(|e| Error::data(format!("unparseable timestamp '{}': {e}", event.ts)))?
        .with_timezone(&tz);

    // Monday = 0, matching the weekday convention used for recovery.
    let weekday = f64::from(local.weekday().num_days_from_monday());
    let minute = f64::from(local.hour() * 60 + local.minute());

    Ok(EncodedEvent {
        dow_sin: (TAU * weekday / 7.0).sin(),
        dow_cos: (TAU * weekday / 7.0).cos(),
        time_sin: (TAU * minute / MINUTES_PER_DAY).sin(),
        time_cos: (TAU * minute / MINUTES_PER_DAY).cos(),
        track: event.track.clone(),
        artist: event.artist.clone(),
        album: event.album.clone(),
        uri: event.uri.clone(),
        ms_played: event.ms_played,
        skipped: event.skipped,
        shuffle: event.shuffle,
    })
}
