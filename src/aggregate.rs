//! Per-track aggregation and popularity scoring.
//!
//! Collapses the raw history into one row per unique track URI, then
//! derives a composite popularity score used by the playlist
//! generator. The score is an unnormalized ranking heuristic; its
//! scale depends on absolute play counts and minutes.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::event::ListeningEvent;

/// One row per unique track URI, with play metrics summed over the
/// whole history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedTrack {
    /// Number of play events for this URI.
    pub count: u64,
    pub track: String,
    pub artist: String,
    pub album: String,
    pub uri: String,
    /// Total listening time in minutes (Σ ms_played / 60000).
    pub min_listened: f64,
    pub shuffle: u64,
    pub skip: u64,
    /// Composite popularity score, see [`popularity_score`].
    pub popularity_score: f64,
}

/// Weights for the composite popularity score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub count: f64,
    pub minutes: f64,
    pub skip_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            count: 0.6,
            minutes: 0.3,
            skip_penalty: 0.1,
        }
    }
}

/// Collapses events into one [`AggregatedTrack`] per distinct URI,
/// ordered by play count descending (ties keep first-seen order).
///
/// Track/artist/album metadata is taken from the first event seen for
/// each URI. Events for the same URI are assumed to share identical
/// metadata; when they diverge, the first encountered wins — a known
/// limitation, kept as documented behavior.
#[must_use]
pub fn aggregate_tracks(events: &[ListeningEvent]) -> Vec<AggregatedTrack> {
    let mut by_uri: HashMap<&str, usize> = HashMap::new();
    let mut tracks: Vec<AggregatedTrack> = Vec::new();

    for event in events {
        let idx = *by_uri.entry(&event.uri).or_insert_with(|| {
            tracks.push(AggregatedTrack {
                count: 0,
                track: event.track.clone(),
                artist: event.artist.clone(),
                album: event.album.clone(),
                uri: event.uri.clone(),
                min_listened: 0.0,
                shuffle: 0,
                skip: 0,
                popularity_score: 0.0,
            });
            tracks.len() - 1
        });

        let row = &mut tracks[idx];
        row.count += 1;
        row.min_listened += event.ms_played as f64 / 60_000.0;
        row.shuffle += u64::from(event.shuffle);
        row.skip += u64::from(event.skipped);
    }

    // Stable sort keeps first-seen order among equal counts.
    tracks.sort_by(|a, b| b.count.cmp(&a.count));
    debug!("Aggregated {} events into {} tracks", events.len(), tracks.len());
    tracks
}

/// Composite popularity score for one aggregated track.
///
/// With default weights: `0.6·count + 0.3·min_listened − 0.1·skip`.
/// Pure and deterministic; no normalization.
#[must_use]
pub fn popularity_score(track: &AggregatedTrack, weights: &ScoreWeights) -> f64 {
    weights.count * track.count as f64 + weights.minutes * track.min_listened
        - weights.skip_penalty * track.skip as f64
}

/// Fills in `popularity_score` on every row.
pub fn apply_popularity_scores(tracks: &mut [AggregatedTrack], weights: &ScoreWeights) {
    for track in tracks.iter_mut() {
        track.popularity_score = popularity_score(track, weights);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::event_at;

    #[test]
    fn test_aggregation_sums_per_uri() {
        let mut e1 = event_at("2023-07-10T08:00:00Z", "Song A", "Artist X", "uri:a");
        e1.ms_played = 30_000;
        let mut e2 = event_at("2023-07-10T09:00:00Z", "Song A", "Artist X", "uri:a");
        e2.ms_played = 90_000;
        e2.skipped = true;
        e2.shuffle = true;

        let tracks = aggregate_tracks(&[e1, e2]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].count, 2);
        assert!((tracks[0].min_listened - 2.0).abs() < 1e-9);
        assert_eq!(tracks[0].skip, 1);
        assert_eq!(tracks[0].shuffle, 1);
    }

    #[test]
    fn test_aggregation_orders_by_count_descending() {
        let events = vec![
            event_at("2023-07-10T08:00:00Z", "A", "X", "uri:a"),
            event_at("2023-07-10T09:00:00Z", "B", "Y", "uri:b"),
            event_at("2023-07-10T10:00:00Z", "B", "Y", "uri:b"),
            event_at("2023-07-10T11:00:00Z", "C", "Z", "uri:c"),
        ];

        let tracks = aggregate_tracks(&events);
        assert_eq!(tracks[0].uri, "uri:b");
        // uri:a and uri:c tie on count; first seen wins.
        assert_eq!(tracks[1].uri, "uri:a");
        assert_eq!(tracks[2].uri, "uri:c");
    }

    #[test]
    fn test_first_seen_metadata_wins() {
        let e1 = event_at("2023-07-10T08:00:00Z", "Original Title", "Artist X", "uri:a");
        let e2 = event_at("2023-07-10T09:00:00Z", "Retitled", "Artist X", "uri:a");

        let tracks = aggregate_tracks(&[e1, e2]);
        assert_eq!(tracks[0].track, "Original Title");
    }

    #[test]
    fn test_popularity_score_formula() {
        let mut track = AggregatedTrack {
            count: 10,
            track: "A".into(),
            artist: "X".into(),
            album: "AX".into(),
            uri: "uri:a".into(),
            min_listened: 50.0,
            shuffle: 0,
            skip: 2,
            popularity_score: 0.0,
        };

        let weights = ScoreWeights::default();
        assert!((popularity_score(&track, &weights) - 20.8).abs() < 1e-9);

        apply_popularity_scores(std::slice::from_mut(&mut track), &weights);
        assert!((track.popularity_score - 20.8).abs() < 1e-9);
    }

    #[test]
    fn test_empty_history_aggregates_to_nothing() {
        assert!(aggregate_tracks(&[]).is_empty());
    }
}
