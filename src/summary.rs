//! Cluster summaries: dominant weekday, time span, descriptive name.
//!
//! Weekday and minute-of-day are recovered from the cyclical features
//! by inverting the encoding with `atan2`. The statistics are
//! deterministic; the mood word in the name is drawn from a small
//! per-bucket vocabulary through the caller's RNG, so regenerating a
//! summary may change the mood but never the weekday or time range.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

use crate::event::{EncodedEvent, MINUTES_PER_DAY};

/// Weekday names indexed by the Monday=0 convention of the encoder.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Time-of-day bucket a cluster's minute range falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    LateNight,
    AllDay,
}

impl TimeOfDay {
    /// Bucket for a `[min, max]` minute range: spans of 20h or more
    /// are "All Day", otherwise the midpoint decides.
    #[must_use]
    pub fn from_minute_range(min: u32, max: u32) -> Self {
        if max - min >= 1200 {
            return Self::AllDay;
        }
        match (min + max) / 2 {
            300..=719 => Self::Morning,
            720..=1019 => Self::Afternoon,
            1020..=1319 => Self::Evening,
            _ => Self::LateNight,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::LateNight => "Late Night",
            Self::AllDay => "All Day",
        }
    }

    /// Mood vocabulary for this bucket, six words each.
    #[must_use]
    pub fn moods(self) -> &'static [&'static str; 6] {
        match self {
            Self::Morning => &["mellow", "hopeful", "slow", "quiet", "cozy", "fresh"],
            Self::Afternoon => &["sunny", "focused", "lazy", "casual", "bright", "wandering"],
            Self::Evening => &["chill", "moody", "breezy", "romantic", "cool", "hazy"],
            Self::LateNight => &["restless", "chaotic", "soft", "dreamy", "lonely", "electric"],
            Self::AllDay => &["flowy", "familiar", "nostalgic", "rhythmic", "mixed", "steady"],
        }
    }
}

/// Summary of one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    /// Weekday with the most events (first-encountered max on ties).
    pub day: String,
    /// `HH:MM–HH:MM` span of the cluster's events.
    pub time_range: String,
    pub count: usize,
    /// `"{day} {mood} {bucket}"`, e.g. "Friday hazy evening".
    pub name: String,
}

/// Recovers the Monday=0 weekday from a cyclical pair.
#[must_use]
pub fn decode_weekday(dow_sin: f64, dow_cos: f64) -> usize {
    let mut day = dow_sin.atan2(dow_cos) * 7.0 / TAU;
    if day < 0.0 {
        day += 7.0;
    }
    (day.round() as usize) % 7
}

/// Recovers the minute-of-day in `[0, 1440)` from a cyclical pair.
#[must_use]
pub fn decode_minute(time_sin: f64, time_cos: f64) -> u32 {
    let mut minute = time_sin.atan2(time_cos) * MINUTES_PER_DAY / TAU;
    if minute < 0.0 {
        minute += MINUTES_PER_DAY;
    }
    (minute.round() as u32) % 1440
}

fn minutes_to_str(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Builds one [`ClusterSummary`] per populated cluster, ordered by
/// cluster id. Clusters that received no events are skipped.
pub fn summarize_clusters(
    events: &[EncodedEvent],
    assignments: &[usize],
    rng: &mut impl Rng,
) -> Vec<ClusterSummary> {
    let mut grouped: BTreeMap<usize, Vec<&EncodedEvent>> = BTreeMap::new();
    for (event, &cluster) in events.iter().zip(assignments) {
        grouped.entry(cluster).or_default().push(event);
    }

    grouped
        .into_iter()
        .map(|(cluster, members)| summarize_one(cluster, &members, rng))
        .collect()
}

fn summarize_one(cluster: usize, members: &[&EncodedEvent], rng: &mut impl Rng) -> ClusterSummary {
    // Weekday counts in first-encountered order, so ties resolve to
    // the weekday seen first.
    let mut day_order: Vec<usize> = Vec::new();
    let mut day_counts = [0usize; 7];
    let mut min_minute = u32::MAX;
    let mut max_minute = 0u32;

    for event in members {
        let day = decode_weekday(event.dow_sin, event.dow_cos);
        if day_counts[day] == 0 {
            day_order.push(day);
        }
        day_counts[day] += 1;

        let minute = decode_minute(event.time_sin, event.time_cos);
        min_minute = min_minute.min(minute);
        max_minute = max_minute.max(minute);
    }

    let mut dominant = day_order[0];
    for &day in &day_order {
        if day_counts[day] > day_counts[dominant] {
            dominant = day;
        }
    }
    let day = WEEKDAY_NAMES[dominant];

    let bucket = TimeOfDay::from_minute_range(min_minute, max_minute);
    let mood = bucket.moods().choose(rng).copied().unwrap_or("steady");

    ClusterSummary {
        cluster,
        day: day.to_string(),
        time_range: format!("{}–{}", minutes_to_str(min_minute), minutes_to_str(max_minute)),
        count: members.len(),
        name: format!("{} {} {}", day, mood, bucket.label().to_lowercase()),
    }
}
