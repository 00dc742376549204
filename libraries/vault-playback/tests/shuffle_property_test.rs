//! Property-based tests for the optimal shuffle
//!
//! Uses proptest to verify invariants across many random inputs.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use vault_core::Track;
use vault_playback::{adjacent_collisions, optimal_shuffle_with_rng};

// ===== Helpers =====

/// Tracks for `counts[i]` songs by artist `i`, with unique ids
fn tracks_with_counts(counts: &[usize]) -> Vec<Track> {
    counts
        .iter()
        .enumerate()
        .flat_map(|(artist, &count)| {
            (0..count).map(move |n| {
                Track::new(format!("{}-{}", artist, n), format!("Song {}", n))
                    .with_artist(format!("Artist {}", artist))
            })
        })
        .collect()
}

fn id_counts(tracks: &[Track]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for track in tracks {
        *counts.entry(track.id.to_string()).or_insert(0) += 1;
    }
    counts
}

fn arbitrary_track() -> impl Strategy<Value = Track> {
    (
        "[a-z0-9]{1,6}",                                  // id (duplicates allowed)
        proptest::option::of("[A-C ]{0,3}"),              // artist, blank sometimes
    )
        .prop_map(|(id, artist)| {
            let track = Track::new(id.clone(), format!("Song {}", id));
            match artist {
                Some(artist) => track.with_artist(artist),
                None => track,
            }
        })
}

// ===== Property Tests =====

proptest! {
    /// Property: shuffling is a permutation, nothing lost or duplicated
    #[test]
    fn shuffle_preserves_multiset(
        tracks in prop::collection::vec(arbitrary_track(), 0..60),
        seed in any::<u64>()
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let shuffled = optimal_shuffle_with_rng(&tracks, &mut rng);

        prop_assert_eq!(shuffled.len(), tracks.len());
        prop_assert_eq!(id_counts(&shuffled), id_counts(&tracks));
    }

    /// Property: two artists reach the minimum possible collisions
    #[test]
    fn two_artists_are_optimal(a in 1usize..25, b in 1usize..25, seed in any::<u64>()) {
        let tracks = tracks_with_counts(&[a, b]);
        let mut rng = StdRng::seed_from_u64(seed);
        let shuffled = optimal_shuffle_with_rng(&tracks, &mut rng);

        let expected = a.max(b).saturating_sub(a.min(b) + 1);
        prop_assert_eq!(adjacent_collisions(&shuffled), expected);
    }

    /// Property: when one artist has at least as many tracks as all others
    /// combined, collisions equal the theoretical minimum
    #[test]
    fn dominant_artist_is_optimal(
        others in prop::collection::vec(1usize..5, 1..5),
        surplus in 0usize..10,
        seed in any::<u64>()
    ) {
        let rest: usize = others.iter().sum();
        let dominant = rest + surplus;

        let mut counts = others.clone();
        counts.push(dominant);
        let tracks = tracks_with_counts(&counts);

        let mut rng = StdRng::seed_from_u64(seed);
        let shuffled = optimal_shuffle_with_rng(&tracks, &mut rng);

        prop_assert_eq!(adjacent_collisions(&shuffled), dominant.saturating_sub(rest + 1));
    }

    /// Property: the same seed always yields the same order
    #[test]
    fn seeded_shuffle_is_deterministic(
        counts in prop::collection::vec(1usize..6, 1..6),
        seed in any::<u64>()
    ) {
        let tracks = tracks_with_counts(&counts);

        let first = optimal_shuffle_with_rng(&tracks, &mut StdRng::seed_from_u64(seed));
        let second = optimal_shuffle_with_rng(&tracks, &mut StdRng::seed_from_u64(seed));

        let ids = |t: &[Track]| t.iter().map(|t| t.id.to_string()).collect::<Vec<_>>();
        prop_assert_eq!(ids(&first), ids(&second));
    }
}
