//! Per-cluster top-N rankings of artists and songs.
//!
//! Both rankers group events by cluster id and count occurrences;
//! ties keep first-encountered order (stable sorts over insertion
//! order). Empty clusters simply yield no entry.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::event::EncodedEvent;

/// Default number of artists listed per cluster.
pub const DEFAULT_TOP_ARTISTS: usize = 5;
/// Default number of songs listed per cluster.
pub const DEFAULT_TOP_SONGS: usize = 50;

/// An artist and how often they were played within one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistCount {
    pub artist: String,
    pub listen_count: u64,
}

/// A song and how often it was played within one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongCount {
    pub track: String,
    pub artist: String,
    pub uri: String,
    pub album: String,
    pub listen_count: u64,
}

/// Top `top_n` artists per cluster by play count, descending.
#[must_use]
pub fn top_artists_per_cluster(
    events: &[EncodedEvent],
    assignments: &[usize],
    top_n: usize,
) -> BTreeMap<usize, Vec<ArtistCount>> {
    let mut per_cluster: BTreeMap<usize, (Vec<ArtistCount>, HashMap<String, usize>)> =
        BTreeMap::new();

    for (event, &cluster) in events.iter().zip(assignments) {
        let (counts, index) = per_cluster.entry(cluster).or_default();
        match index.get(&event.artist) {
            Some(&i) => counts[i].listen_count += 1,
            None => {
                index.insert(event.artist.clone(), counts.len());
                counts.push(ArtistCount {
                    artist: event.artist.clone(),
                    listen_count: 1,
                });
            }
        }
    }

    per_cluster
        .into_iter()
        .map(|(cluster, (mut counts, _))| {
            counts.sort_by(|a, b| b.listen_count.cmp(&a.listen_count));
            counts.truncate(top_n);
            (cluster, counts)
        })
        .collect()
}

/// Top `top_n` songs per cluster by play count, descending. Songs are
/// grouped by the full (track, artist, uri, album) identity.
#[must_use]
pub fn top_songs_per_cluster(
    events: &[EncodedEvent],
    assignments: &[usize],
    top_n: usize,
) -> BTreeMap<usize, Vec<SongCount>> {
    let mut per_cluster: BTreeMap<usize, (Vec<SongCount>, HashMap<(String, String), usize>)> =
        BTreeMap::new();

    for (event, &cluster) in events.iter().zip(assignments) {
        let (counts, index) = per_cluster.entry(cluster).or_default();
        let key = (event.uri.clone(), event.track.clone());
        match index.get(&key) {
            Some(&i) => counts[i].listen_count += 1,
            None => {
                index.insert(key, counts.len());
                counts.push(SongCount {
                    track: event.track.clone(),
                    artist: event.artist.clone(),
                    uri: event.uri.clone(),
                    album: event.album.clone(),
                    listen_count: 1,
                });
            }
        }
    }

    per_cluster
        .into_iter()
        .map(|(cluster, (mut counts, _))| {
            counts.sort_by(|a, b| b.listen_count.cmp(&a.listen_count));
            counts.truncate(top_n);
            (cluster, counts)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::encode_events;
    use crate::event::tests::event_at;

    fn encoded(events: &[crate::event::ListeningEvent]) -> Vec<EncodedEvent> {
        encode_events(events, chrono_tz::UTC).unwrap()
    }

    #[test]
    fn test_top_artists_ranked_with_stable_ties() {
        // Counts {A:5, B:3, C:3}; B seen before C, so with N=2 the
        // result is [A, B].
        let mut events = Vec::new();
        for _ in 0..5 {
            events.push(event_at("2023-07-10T10:00:00Z", "Sa", "A", "uri:a"));
        }
        for _ in 0..3 {
            events.push(event_at("2023-07-10T10:10:00Z", "Sb", "B", "uri:b"));
        }
        for _ in 0..3 {
            events.push(event_at("2023-07-10T10:20:00Z", "Sc", "C", "uri:c"));
        }
        let encoded = encoded(&events);
        let assignments = vec![0; encoded.len()];

        let top = top_artists_per_cluster(&encoded, &assignments, 2);
        let ranked = &top[&0];
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].artist.as_str(), ranked[0].listen_count), ("A", 5));
        assert_eq!((ranked[1].artist.as_str(), ranked[1].listen_count), ("B", 3));
    }

    #[test]
    fn test_top_songs_grouped_per_cluster() {
        let events = vec![
            event_at("2023-07-10T10:00:00Z", "Sa", "A", "uri:a"),
            event_at("2023-07-10T10:05:00Z", "Sa", "A", "uri:a"),
            event_at("2023-07-10T10:10:00Z", "Sb", "B", "uri:b"),
            event_at("2023-07-14T22:00:00Z", "Sc", "C", "uri:c"),
        ];
        let encoded = encoded(&events);
        let assignments = vec![0, 0, 0, 1];

        let top = top_songs_per_cluster(&encoded, &assignments, 50);
        assert_eq!(top[&0].len(), 2);
        assert_eq!(top[&0][0].uri, "uri:a");
        assert_eq!(top[&0][0].listen_count, 2);
        assert_eq!(top[&1].len(), 1);
        assert_eq!(top[&1][0].uri, "uri:c");
    }

    #[test]
    fn test_no_events_means_no_cluster_entries() {
        let top = top_artists_per_cluster(&[], &[], 5);
        assert!(top.is_empty());
        let top = top_songs_per_cluster(&[], &[], 50);
        assert!(top.is_empty());
    }
}
