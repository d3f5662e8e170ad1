//! Per-cluster playlist generation.
//!
//! Builds a bounded, de-duplicated selection in three ordered stages:
//! a random cut of the cluster's top songs, then the most popular
//! tracks played in the cluster, then anything in the cluster above a
//! popularity floor. Every entry is unique by URI and by artist, and
//! each invocation shuffles freshly through the caller's RNG, so the
//! contract is the set of invariants (size bound, uniqueness, cluster
//! membership), not an exact sequence.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::aggregate::AggregatedTrack;
use crate::error::{Error, Result};
use crate::event::EncodedEvent;
use crate::ranking::SongCount;

/// Parameters for the three-stage selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Final playlist size bound N.
    pub max_tracks: usize,
    /// Popularity floor T for the third stage.
    pub min_popularity: f64,
    /// How many shuffled top-song rows the first stage considers.
    pub top_song_picks: usize,
    /// Size of the by-popularity pool the second stage draws from.
    pub popular_pool: usize,
    /// Selection size the second stage fills up to.
    pub popular_quota: usize,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            max_tracks: 30,
            min_popularity: 10.0,
            top_song_picks: 10,
            popular_pool: 100,
            popular_quota: 20,
        }
    }
}

/// One playlist row. Insertion order is generation order and carries
/// no playback meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub track: String,
    pub artist: String,
    pub album: String,
    pub uri: String,
    pub popularity_score: f64,
}

/// Generates one playlist per populated cluster, keyed by cluster id.
/// A cluster with no selectable tracks maps to an empty list.
///
/// # Errors
///
/// Returns [`Error::Config`] if the target size is zero.
pub fn generate_playlists(
    events: &[EncodedEvent],
    assignments: &[usize],
    tracks: &[AggregatedTrack],
    top_songs: &BTreeMap<usize, Vec<SongCount>>,
    config: &PlaylistConfig,
    rng: &mut impl Rng,
) -> Result<BTreeMap<usize, Vec<PlaylistEntry>>> {
    if config.max_tracks == 0 {
        return Err(Error::config("playlist size must be at least 1"));
    }

    let by_uri: HashMap<&str, &AggregatedTrack> =
        tracks.iter().map(|t| (t.uri.as_str(), t)).collect();
    let cluster_ids: BTreeSet<usize> = assignments.iter().copied().collect();

    let mut playlists = BTreeMap::new();
    for cluster in cluster_ids {
        let playlist = build_playlist(
            cluster,
            events,
            assignments,
            tracks,
            &by_uri,
            top_songs.get(&cluster).map_or(&[][..], Vec::as_slice),
            config,
            rng,
        );
        debug!("Cluster {cluster}: selected {} tracks", playlist.len());
        playlists.insert(cluster, playlist);
    }

    Ok(playlists)
}

#[allow(clippy::too_many_arguments)]
fn build_playlist(
    cluster: usize,
    events: &[EncodedEvent],
    assignments: &[usize],
    tracks: &[AggregatedTrack],
    by_uri: &HashMap<&str, &AggregatedTrack>,
    top_songs: &[SongCount],
    config: &PlaylistConfig,
    rng: &mut impl Rng,
) -> Vec<PlaylistEntry> {
    let mut selection = Selection::with_capacity(config.max_tracks);

    // Stage 1: a random cut of the cluster's top songs. The dedup
    // filter runs after the cut, so fewer than `top_song_picks` may
    // be admitted.
    let mut shuffled: Vec<&SongCount> = top_songs.iter().collect();
    shuffled.shuffle(rng);
    for song in shuffled.iter().take(config.top_song_picks) {
        let score = by_uri.get(song.uri.as_str()).map_or(0.0, |t| t.popularity_score);
        selection.offer(PlaylistEntry {
            track: song.track.clone(),
            artist: song.artist.clone(),
            album: song.album.clone(),
            uri: song.uri.clone(),
            popularity_score: score,
        });
    }

    // Stage 2: fill from the most popular tracks actually played in
    // this cluster.
    let cluster_uris: HashSet<&str> = events
        .iter()
        .zip(assignments)
        .filter(|(_, &c)| c == cluster)
        .map(|(event, _)| event.uri.as_str())
        .collect();
    let mut cluster_tracks: Vec<&AggregatedTrack> = tracks
        .iter()
        .filter(|t| cluster_uris.contains(t.uri.as_str()))
        .collect();

    let mut popular = cluster_tracks.clone();
    popular.sort_by(|a, b| {
        b.popularity_score
            .partial_cmp(&a.popularity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    popular.truncate(config.popular_pool);
    popular.shuffle(rng);
    for track in popular {
        if selection.len() >= config.popular_quota {
            break;
        }
        selection.offer(entry_from(track));
    }

    // Stage 3: anything in the cluster above the popularity floor.
    cluster_tracks.retain(|t| t.popularity_score >= config.min_popularity);
    cluster_tracks.shuffle(rng);
    for track in cluster_tracks {
        if selection.len() >= config.max_tracks {
            break;
        }
        selection.offer(entry_from(track));
    }

    selection.into_entries(config.max_tracks)
}

fn entry_from(track: &AggregatedTrack) -> PlaylistEntry {
    PlaylistEntry {
        track: track.track.clone(),
        artist: track.artist.clone(),
        album: track.album.clone(),
        uri: track.uri.clone(),
        popularity_score: track.popularity_score,
    }
}

/// Accumulates entries while enforcing URI and artist uniqueness;
/// first occurrence wins.
struct Selection {
    entries: Vec<PlaylistEntry>,
    used_uris: HashSet<String>,
    used_artists: HashSet<String>,
}

impl Selection {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            used_uris: HashSet::new(),
            used_artists: HashSet::new(),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn offer(&mut self, entry: PlaylistEntry) {
        if self.used_uris.contains(&entry.uri) || self.used_artists.contains(&entry.artist) {
            return;
        }
        self.used_uris.insert(entry.uri.clone());
        self.used_artists.insert(entry.artist.clone());
        self.entries.push(entry);
    }

    fn into_entries(mut self, max: usize) -> Vec<PlaylistEntry> {
        self.entries.truncate(max);
        self.entries
    }
}
