//! Criterion benchmarks for the hot pipeline stages.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use moodlist::cluster::{cluster_events, silhouette_score, KmeansConfig};
use moodlist::event::{encode_events, ListeningEvent};

/// A month of synthetic history, `n` events spread over days and
/// minutes.
fn synthetic_events(n: usize) -> Vec<ListeningEvent> {
    (0..n)
        .map(|i| ListeningEvent {
            ts: format!(
                "2023-07-{:02}T{:02}:{:02}:00Z",
                1 + i % 28,
                (i * 5) % 24,
                (i * 13) % 60
            ),
            track: format!("Track {}", i % 200),
            artist: format!("Artist {}", i % 40),
            album: format!("Album {}", i % 60),
            uri: format!("spotify:track:{}", i % 200),
            ms_played: 120_000 + (i as u64 % 120) * 1_000,
            skipped: i % 7 == 0,
            shuffle: i % 3 == 0,
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let events = synthetic_events(5_000);
    c.bench_function("encode_5k_events", |b| {
        b.iter(|| encode_events(black_box(&events), chrono_tz::US::Eastern).unwrap())
    });
}

fn bench_cluster(c: &mut Criterion) {
    let events = synthetic_events(2_000);
    let encoded = encode_events(&events, chrono_tz::US::Eastern).unwrap();
    let config = KmeansConfig {
        clusters: 20,
        ..KmeansConfig::default()
    };

    c.bench_function("kmeans_2k_events_k20", |b| {
        b.iter(|| cluster_events(black_box(&encoded), &config).unwrap())
    });

    let clustering = cluster_events(&encoded, &config).unwrap();
    c.bench_function("silhouette_2k_events", |b| {
        b.iter(|| silhouette_score(black_box(&encoded), &clustering.assignments).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_cluster);
criterion_main!(benches);
