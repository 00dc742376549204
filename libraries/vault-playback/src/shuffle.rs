//! Artist-aware optimal shuffle
//!
//! Reorders a track list so that the same artist plays back-to-back as
//! rarely as possible, while staying random:
//!
//! 1. Partition tracks by artist key
//! 2. Shuffle each partition (Fisher-Yates)
//! 3. Sort partitions by ascending size, ties broken randomly
//! 4. Fold partitions into a running result, one at a time
//!
//! ```text
//! new partition (n) vs result (m)
//!   n >= m  ->  interleave(partition, result)   split the partition, drop result items between parts
//!   n <  m  ->  intersperse(result, partition)  break the result into spans, drop partition items between spans
//! ```
//!
//! Every call returns a permutation of its input. Dropping or duplicating
//! a track is a bug, never a recoverable condition.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use vault_core::Track;

/// Artist key shared by every track without a (non-blank) artist
pub const UNKNOWN_ARTIST: &str = "__unknown__";

/// Normalized artist key used for adjacency comparisons
pub fn artist_key(track: &Track) -> &str {
    match track.artist.as_deref().map(str::trim) {
        Some(artist) if !artist.is_empty() => artist,
        _ => UNKNOWN_ARTIST,
    }
}

/// Tracks of a single artist
#[derive(Debug, Clone)]
pub struct Partition {
    pub key: String,
    pub tracks: Vec<Track>,
}

/// Group tracks by artist key
///
/// Partitions appear in order of first occurrence and keep the input's
/// relative order.
pub fn partition_by_artist(tracks: &[Track]) -> Vec<Partition> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();

    for track in tracks {
        let key = artist_key(track);
        let slot = *positions.entry(key).or_insert_with(|| {
            partitions.push(Partition {
                key: key.to_string(),
                tracks: Vec::new(),
            });
            partitions.len() - 1
        });
        partitions[slot].tracks.push(track.clone());
    }

    partitions
}

/// Shuffle using the thread-local RNG
///
/// See [`optimal_shuffle_with_rng`] for the collision guarantees.
pub fn optimal_shuffle(tracks: &[Track]) -> Vec<Track> {
    optimal_shuffle_with_rng(tracks, &mut rand::thread_rng())
}

/// Shuffle with a caller-supplied RNG (seedable in tests)
///
/// Collisions are minimal when one artist holds at least as many tracks as
/// all others combined, and zero for two artists with equal counts. With
/// three or more artists the fold is greedy: a mix like `[2, 4, 4]` can end
/// with one collision even though a collision-free order exists.
pub fn optimal_shuffle_with_rng<R: Rng>(tracks: &[Track], rng: &mut R) -> Vec<Track> {
    if tracks.len() <= 1 {
        return tracks.to_vec();
    }

    let mut partitions = partition_by_artist(tracks);
    for partition in &mut partitions {
        partition.tracks.shuffle(rng);
    }

    // Shuffle first so the stable sort breaks size ties randomly
    partitions.shuffle(rng);
    partitions.sort_by_key(|p| p.tracks.len());

    let mut result: Vec<Track> = Vec::with_capacity(tracks.len());
    for partition in partitions {
        let n = partition.tracks.len();
        let m = result.len();

        result = if m == 0 {
            partition.tracks
        } else if n >= m {
            interleave(partition.tracks, result, rng)
        } else {
            intersperse(result, partition.tracks, same_artist, rng)
        };
    }

    debug_assert_eq!(result.len(), tracks.len(), "shuffle lost or duplicated tracks");
    result
}

/// Number of adjacent pairs sharing an artist key
pub fn adjacent_collisions(tracks: &[Track]) -> usize {
    tracks
        .windows(2)
        .filter(|pair| same_artist(&pair[0], &pair[1]))
        .count()
}

fn same_artist(a: &Track, b: &Track) -> bool {
    artist_key(a) == artist_key(b)
}

/// Split `items` into `parts` contiguous chunks whose sizes differ by at most one
///
/// The chunks receiving the remainder are chosen uniformly at random.
/// `parts == 0` yields the input as a single chunk; `parts >= len` yields
/// one chunk per item.
pub fn split_into_equal_parts<T, R: Rng>(items: Vec<T>, parts: usize, rng: &mut R) -> Vec<Vec<T>> {
    if parts == 0 {
        return vec![items];
    }
    if parts >= items.len() {
        return items.into_iter().map(|item| vec![item]).collect();
    }

    let base = items.len() / parts;
    let remainder = items.len() % parts;
    let extra: HashSet<usize> = index::sample(rng, parts, remainder).into_iter().collect();

    let mut iter = items.into_iter();
    (0..parts)
        .map(|i| {
            let size = base + usize::from(extra.contains(&i));
            iter.by_ref().take(size).collect()
        })
        .collect()
}

/// Split `items` into at least `target` spans where possible
///
/// Natural spans are maximal runs of items considered equal by `same`.
/// If there are fewer natural spans than `target`, random spans longer
/// than one item are split at random interior points until `target` is
/// reached or nothing is left to split.
pub fn break_into_spans<T, F, R>(items: Vec<T>, target: usize, same: F, rng: &mut R) -> Vec<Vec<T>>
where
    F: Fn(&T, &T) -> bool,
    R: Rng,
{
    if items.is_empty() {
        return Vec::new();
    }
    if target <= 1 {
        return vec![items];
    }

    let mut spans: Vec<Vec<T>> = Vec::new();
    for item in items {
        match spans.last_mut() {
            Some(span) if span.last().is_some_and(|prev| same(prev, &item)) => span.push(item),
            _ => spans.push(vec![item]),
        }
    }

    while spans.len() < target {
        let breakable: Vec<usize> = spans
            .iter()
            .enumerate()
            .filter(|(_, span)| span.len() > 1)
            .map(|(i, _)| i)
            .collect();

        let Some(&idx) = breakable.choose(rng) else {
            break;
        };

        let at = rng.gen_range(1..spans[idx].len());
        let tail = spans[idx].split_off(at);
        spans.insert(idx + 1, tail);
    }

    spans
}

/// Distribute the smaller sequence through the larger one
///
/// Equal non-empty sizes are zipped, with a coin flip deciding which side
/// leads each pair. Otherwise the larger side is split into `|smaller| + 1`
/// parts and the smaller side's items are placed between them.
pub fn interleave<T, R: Rng>(x: Vec<T>, y: Vec<T>, rng: &mut R) -> Vec<T> {
    let (x, y) = if y.len() > x.len() { (y, x) } else { (x, y) };

    if x.len() == y.len() && !y.is_empty() {
        let x_first = rng.gen_bool(0.5);
        let mut result = Vec::with_capacity(x.len() * 2);
        for (a, b) in x.into_iter().zip(y) {
            if x_first {
                result.push(a);
                result.push(b);
            } else {
                result.push(b);
                result.push(a);
            }
        }
        return result;
    }

    let parts = y.len() + 1;
    weave(split_into_equal_parts(x, parts, rng), y)
}

/// Break `x` into `|y| + 1` spans and place `y`'s items between them
pub fn intersperse<T, F, R>(x: Vec<T>, y: Vec<T>, same: F, rng: &mut R) -> Vec<T>
where
    F: Fn(&T, &T) -> bool,
    R: Rng,
{
    let target = y.len() + 1;
    weave(break_into_spans(x, target, same, rng), y)
}

/// `chunk0, y0, chunk1, y1, ...`; leftover `y` items are appended
fn weave<T>(chunks: Vec<Vec<T>>, fill: Vec<T>) -> Vec<T> {
    let total = chunks.iter().map(Vec::len).sum::<usize>() + fill.len();
    let mut result = Vec::with_capacity(total);
    let mut fill = fill.into_iter();

    for chunk in chunks {
        result.extend(chunk);
        if let Some(item) = fill.next() {
            result.push(item);
        }
    }
    result.extend(fill);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_track(id: &str, artist: Option<&str>) -> Track {
        let track = Track::new(id, format!("Track {}", id));
        match artist {
            Some(a) => track.with_artist(a),
            None => track,
        }
    }

    /// Tracks for `counts[i]` songs by artist `i` ("A", "B", ...)
    fn tracks_with_counts(counts: &[usize]) -> Vec<Track> {
        let mut tracks = Vec::new();
        for (artist_idx, &count) in counts.iter().enumerate() {
            let artist = char::from(b'A' + artist_idx as u8).to_string();
            for n in 0..count {
                tracks.push(create_test_track(&format!("{}{}", artist, n), Some(&artist)));
            }
        }
        tracks
    }

    fn sorted_ids(tracks: &[Track]) -> Vec<String> {
        let mut ids: Vec<String> = tracks.iter().map(|t| t.id.to_string()).collect();
        ids.sort();
        ids
    }

    fn max_run(tracks: &[Track]) -> usize {
        let mut best = 0;
        let mut run = 0;
        let mut prev: Option<&str> = None;
        for track in tracks {
            let key = artist_key(track);
            run = if prev == Some(key) { run + 1 } else { 1 };
            best = best.max(run);
            prev = Some(key);
        }
        best
    }

    #[test]
    fn artist_key_trims_and_collapses_blank() {
        assert_eq!(artist_key(&create_test_track("1", Some("  Lumen "))), "Lumen");
        assert_eq!(artist_key(&create_test_track("2", Some("   "))), UNKNOWN_ARTIST);
        assert_eq!(artist_key(&create_test_track("3", None)), UNKNOWN_ARTIST);
    }

    #[test]
    fn partition_preserves_relative_order() {
        let tracks = vec![
            create_test_track("1", Some("A")),
            create_test_track("2", Some("B")),
            create_test_track("3", Some("A")),
            create_test_track("4", None),
            create_test_track("5", Some("")),
        ];

        let partitions = partition_by_artist(&tracks);
        assert_eq!(partitions.len(), 3);
        assert_eq!(partitions[0].key, "A");
        let a_ids: Vec<&str> = partitions[0].tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(a_ids, vec!["1", "3"]);
        assert_eq!(partitions[2].key, UNKNOWN_ARTIST);
        assert_eq!(partitions[2].tracks.len(), 2);
    }

    #[test]
    fn partition_of_empty_input_is_empty() {
        assert!(partition_by_artist(&[]).is_empty());
    }

    #[test]
    fn empty_and_single_inputs_are_returned_as_is() {
        assert!(optimal_shuffle(&[]).is_empty());

        let single = vec![create_test_track("only", Some("A"))];
        assert_eq!(optimal_shuffle(&single), single);
    }

    #[test]
    fn two_by_two_has_no_collisions() {
        let tracks = tracks_with_counts(&[2, 2]);
        for _ in 0..50 {
            let shuffled = optimal_shuffle(&tracks);
            assert_eq!(sorted_ids(&shuffled), sorted_ids(&tracks));
            assert_eq!(adjacent_collisions(&shuffled), 0);
        }
    }

    #[test]
    fn three_to_one_has_exactly_one_collision() {
        let tracks = tracks_with_counts(&[3, 1]);
        for _ in 0..50 {
            let shuffled = optimal_shuffle(&tracks);
            assert_eq!(sorted_ids(&shuffled), sorted_ids(&tracks));
            assert_eq!(adjacent_collisions(&shuffled), 1);
        }
    }

    #[test]
    fn larger_mix_has_at_most_one_collision() {
        let tracks = tracks_with_counts(&[4, 8, 10]);
        for _ in 0..50 {
            let shuffled = optimal_shuffle(&tracks);
            assert_eq!(sorted_ids(&shuffled), sorted_ids(&tracks));
            assert!(adjacent_collisions(&shuffled) <= 1);
        }
    }

    #[test]
    fn greedy_fold_bound_for_three_artists() {
        // A collision-free order exists, but the fold may leave one
        let tracks = tracks_with_counts(&[2, 4, 4]);
        for seed in 0..50 {
            let shuffled = optimal_shuffle_with_rng(&tracks, &mut StdRng::seed_from_u64(seed));
            assert_eq!(sorted_ids(&shuffled), sorted_ids(&tracks));
            assert!(adjacent_collisions(&shuffled) <= 1);
        }
    }

    #[test]
    fn small_uneven_mixes_have_no_collisions() {
        for counts in [&[3, 2, 1][..], &[4, 2, 1], &[4, 3, 2, 1]] {
            let tracks = tracks_with_counts(counts);
            for _ in 0..30 {
                let shuffled = optimal_shuffle(&tracks);
                assert_eq!(adjacent_collisions(&shuffled), 0, "counts {:?}", counts);
            }
        }
    }

    #[test]
    fn dominant_artist_runs_are_spread_out() {
        let tracks = tracks_with_counts(&[10, 1]);
        for _ in 0..30 {
            assert_eq!(max_run(&optimal_shuffle(&tracks)), 5);
        }

        let tracks = tracks_with_counts(&[6, 2]);
        for _ in 0..30 {
            assert!(max_run(&optimal_shuffle(&tracks)) <= 2);
        }
    }

    #[test]
    fn whitespace_variants_count_as_one_artist() {
        let tracks = vec![
            create_test_track("1", Some("Lumen")),
            create_test_track("2", Some(" Lumen")),
            create_test_track("3", Some("Lumen  ")),
        ];
        assert_eq!(adjacent_collisions(&optimal_shuffle(&tracks)), 2);
    }

    #[test]
    fn untagged_tracks_are_spread_like_one_artist() {
        let tracks = vec![
            create_test_track("1", None),
            create_test_track("2", Some("")),
            create_test_track("3", Some("A")),
            create_test_track("4", Some("A")),
        ];
        for _ in 0..30 {
            assert_eq!(adjacent_collisions(&optimal_shuffle(&tracks)), 0);
        }
    }

    #[test]
    fn repeated_shuffles_differ() {
        let tracks = tracks_with_counts(&[2, 2, 2]);
        let orders: HashSet<Vec<String>> = (0..10)
            .map(|_| optimal_shuffle(&tracks).iter().map(|t| t.id.to_string()).collect())
            .collect();
        assert!(orders.len() >= 2);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let tracks = tracks_with_counts(&[3, 4, 5]);
        let first = optimal_shuffle_with_rng(&tracks, &mut StdRng::seed_from_u64(7));
        let second = optimal_shuffle_with_rng(&tracks, &mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    #[test]
    fn split_sizes_differ_by_at_most_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let parts = split_into_equal_parts((0..10).collect::<Vec<_>>(), 3, &mut rng);

        assert_eq!(parts.len(), 3);
        let sizes: Vec<usize> = parts.iter().map(Vec::len).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 10);
        assert!(sizes.iter().all(|&s| s == 3 || s == 4));
        assert_eq!(parts.concat(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn split_edge_cases() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(split_into_equal_parts(vec![1, 2], 0, &mut rng), vec![vec![1, 2]]);
        assert_eq!(
            split_into_equal_parts(vec![1, 2], 5, &mut rng),
            vec![vec![1], vec![2]]
        );
    }

    #[test]
    fn spans_keep_natural_runs_when_enough() {
        let mut rng = StdRng::seed_from_u64(3);
        let spans = break_into_spans(vec![1, 1, 2, 3, 3], 2, |a, b| a == b, &mut rng);
        assert_eq!(spans, vec![vec![1, 1], vec![2], vec![3, 3]]);
    }

    #[test]
    fn spans_are_fractured_up_to_target() {
        let mut rng = StdRng::seed_from_u64(4);
        let spans = break_into_spans(vec![1, 1, 1, 1, 2], 4, |a, b| a == b, &mut rng);
        assert_eq!(spans.len(), 4);
        assert_eq!(spans.concat(), vec![1, 1, 1, 1, 2]);
        assert!(spans.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn spans_stop_when_nothing_is_breakable() {
        let mut rng = StdRng::seed_from_u64(5);
        let spans = break_into_spans(vec![1, 1, 2], 10, |a, b| a == b, &mut rng);
        assert_eq!(spans, vec![vec![1], vec![1], vec![2]]);
    }

    #[test]
    fn spans_edge_cases() {
        let mut rng = StdRng::seed_from_u64(6);
        assert!(break_into_spans(Vec::<u8>::new(), 3, |a, b| a == b, &mut rng).is_empty());
        assert_eq!(
            break_into_spans(vec![1, 2, 3], 1, |a, b| a == b, &mut rng),
            vec![vec![1, 2, 3]]
        );
    }

    #[test]
    fn interleave_equal_sizes_alternates() {
        let mut rng = StdRng::seed_from_u64(8);
        let merged = interleave(vec!['a', 'a', 'a'], vec!['b', 'b', 'b'], &mut rng);
        assert_eq!(merged.len(), 6);
        assert!(merged.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn interleave_swaps_to_split_the_larger_side() {
        let mut rng = StdRng::seed_from_u64(9);
        let merged = interleave(vec!['b'], vec!['a', 'a', 'a', 'a'], &mut rng);
        assert_eq!(merged.len(), 5);
        assert_eq!(merged.iter().filter(|&&c| c == 'b').count(), 1);
        let b_pos = merged.iter().position(|&c| c == 'b').unwrap();
        assert!(b_pos > 0 && b_pos < 4);
    }

    #[test]
    fn intersperse_keeps_every_item() {
        let mut rng = StdRng::seed_from_u64(10);
        let merged = intersperse(vec![1, 1, 2, 2, 2], vec![9, 9], |a, b| a == b, &mut rng);

        let mut sorted = merged.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 1, 2, 2, 2, 9, 9]);
        assert!(merged.windows(2).all(|w| !(w[0] == 9 && w[1] == 9)));
    }
}
