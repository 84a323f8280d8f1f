//! The outer search loop: case enumeration, size pacing, discard
//! accounting, give-up decisions, and greedy shrink descent.

use crate::generate::Gen;
use crate::property::{CaseDescription, CaseResult};
use crate::random::Random;
use crate::reproduce::Reproduce;
use crate::shrink::{find_local_min, walk_path, Shrinkable};
use std::collections::HashMap;

/// Per-distinct-tag-set occurrence counts, ordered by descending count
/// with ties broken by first-seen order.
pub type TagDistribution = Vec<(Vec<String>, usize)>;

/// Knobs governing a single `test_property` run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestParams {
    pub seed: u64,
    pub max_success: u32,
    pub max_size: u32,
    pub max_discard_ratio: u32,
    pub disable_shrinking: bool,
    pub shrink_tries: u32,
}

impl Default for TestParams {
    fn default() -> Self {
        Self {
            seed: Random::seed(),
            max_success: 100,
            max_size: 100,
            max_discard_ratio: 10,
            disable_shrinking: false,
            shrink_tries: 1,
        }
    }
}

/// A stable identifier for a property run, used to look up a
/// previously-recorded reproduce token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub id: Option<String>,
}

impl Metadata {
    pub fn unidentified() -> Self {
        Self { id: None }
    }

    pub fn named(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

/// The outcome of a completed test run.
#[derive(Clone, Debug)]
pub enum TestResult {
    Success {
        num_success: u32,
        distribution: TagDistribution,
    },
    Failure {
        num_success: u32,
        description: String,
        reproduce: Reproduce,
        counter_example: Vec<(String, String)>,
    },
    GaveUp {
        num_success: u32,
        description: String,
    },
    Error {
        description: String,
    },
}

/// Observer hooks for progress reporting; every method is a no-op by
/// default so callers only implement what they care about.
pub trait Listener {
    fn on_test_case_finished(&mut self, _description: &CaseDescription) {}
    fn on_shrink_tried(&mut self, _description: &CaseDescription, _accepted: bool) {}
    fn on_test_finished(&mut self, _metadata: &Metadata, _result: &TestResult) {}
}

/// A [`Listener`] that does nothing, for callers with no progress UI.
pub struct NullListener;

impl Listener for NullListener {}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Mixes a case's position in the run into a leaf seed with good
/// avalanche behaviour: nearby `(seed, num_success, recent_discards)`
/// triples must not produce correlated draws.
fn avalanche(input: u64) -> u64 {
    splitmix64(splitmix64(input) ^ 0x2545_F491_4F6C_DD1D)
}

/// Spreads sizes evenly across `[0, max_size]` across `max_success`
/// cases, guaranteeing `max_size` itself is hit at least once when
/// `max_success > 1`.
pub fn size_for(params: &TestParams, i: u32) -> u32 {
    let span = params.max_size + 1;
    if params.max_success % span == 0 {
        return i % span;
    }
    let even_prefix = (params.max_success / span) * span;
    if i < even_prefix {
        return i % span;
    }
    let remainder_index = i - even_prefix;
    let remainder_len = params.max_success - even_prefix;
    if remainder_len <= 1 {
        return params.max_size;
    }
    let scaled = (remainder_index as u64) * (params.max_size as u64) / (remainder_len as u64 - 1);
    scaled.min(params.max_size as u64) as u32
}

fn record_tags(distribution: &mut TagDistribution, tags: &[String]) {
    let mut key = tags.to_vec();
    key.sort();
    match distribution.iter_mut().find(|(existing, _)| *existing == key) {
        Some((_, count)) => *count += 1,
        None => distribution.push((key, 1)),
    }
}

/// Sorts by descending count; `Vec::sort_by` is stable, so entries with
/// equal counts keep their original (first-seen) relative order.
fn finalize_distribution(mut distribution: TagDistribution) -> TagDistribution {
    distribution.sort_by(|a, b| b.1.cmp(&a.1));
    distribution
}

fn is_failure(description: &CaseDescription) -> bool {
    description.result.is_failure()
}

/// Runs `property` to either exhaustion (`max_success` cases) or a
/// confirmed failure, descending the shrink tree with `shrink_tries`
/// flake tolerance. Delegates to [`reproduce_property`] instead of a
/// fresh search when `metadata.id` has a recorded reproduce token.
pub fn test_property<L: Listener>(
    property: &Gen<CaseDescription>,
    metadata: &Metadata,
    params: &TestParams,
    listener: &mut L,
    reproduce_map: &HashMap<String, Reproduce>,
) -> TestResult {
    if let Some(id) = &metadata.id {
        if let Some(reproduce) = reproduce_map.get(id) {
            let result = reproduce_property(property, reproduce);
            listener.on_test_finished(metadata, &result);
            return result;
        }
    }

    let mut num_success = 0u32;
    let mut num_discarded = 0u32;
    let mut recent_discards = 0u32;
    let mut distribution: TagDistribution = Vec::new();

    let result = loop {
        if num_success >= params.max_success {
            break TestResult::Success {
                num_success,
                distribution: finalize_distribution(distribution),
            };
        }

        let size = (size_for(params, num_success) + recent_discards / 10).min(params.max_size);
        let case_seed = avalanche(
            params
                .seed
                .wrapping_add(u64::from(num_success))
                .wrapping_add(u64::from(recent_discards)),
        );
        let start = Random::from_seed(case_seed);
        let mut random = start;

        let tree = match property.generate(&mut random, size) {
            Ok(tree) => tree,
            Err(failure) => {
                num_discarded += 1;
                recent_discards += 1;
                if num_discarded > params.max_discard_ratio.saturating_mul(params.max_success) {
                    break TestResult::GaveUp {
                        num_success,
                        description: failure.to_string(),
                    };
                }
                continue;
            }
        };

        let description = tree.value();
        match &description.result {
            CaseResult::Success => {
                num_success += 1;
                recent_discards = 0;
                record_tags(&mut distribution, &description.tags);
                listener.on_test_case_finished(&description);
            }
            CaseResult::Discard(reason) => {
                num_discarded += 1;
                recent_discards += 1;
                if num_discarded > params.max_discard_ratio.saturating_mul(params.max_success) {
                    break TestResult::GaveUp {
                        num_success,
                        description: reason.clone(),
                    };
                }
            }
            CaseResult::Failure(_) => {
                break fail(tree, num_success, start, size, params, listener);
            }
        }
    };

    listener.on_test_finished(metadata, &result);
    result
}

fn fail<L: Listener>(
    tree: Shrinkable<CaseDescription>,
    num_success: u32,
    random: Random,
    size: u32,
    params: &TestParams,
    listener: &mut L,
) -> TestResult {
    let root = tree.value();
    if params.disable_shrinking {
        return TestResult::Failure {
            num_success,
            description: root.result_message(),
            reproduce: Reproduce {
                random,
                size,
                shrink_path: Vec::new(),
            },
            counter_example: root.example(),
        };
    }

    let tries = params.shrink_tries.max(1);
    let (final_case, shrink_path) = find_local_min(tree, |description| {
        let mut attempts_left = tries;
        loop {
            if is_failure(description) {
                listener.on_shrink_tried(description, true);
                return true;
            }
            attempts_left -= 1;
            if attempts_left == 0 {
                listener.on_shrink_tried(description, false);
                return false;
            }
        }
    });

    TestResult::Failure {
        num_success,
        description: final_case.result_message(),
        reproduce: Reproduce {
            random,
            size,
            shrink_path,
        },
        counter_example: final_case.example(),
    }
}

/// Rebuilds a prior failing case from its [`Reproduce`] coordinates and
/// walks its shrink path, requiring the terminus to still be a failure.
pub fn reproduce_property(property: &Gen<CaseDescription>, reproduce: &Reproduce) -> TestResult {
    let mut random = reproduce.random;
    let tree = match property.generate(&mut random, reproduce.size) {
        Ok(tree) => tree,
        Err(failure) => {
            return TestResult::Error {
                description: failure.to_string(),
            }
        }
    };
    let terminus = match walk_path(tree, &reproduce.shrink_path) {
        Some(node) => node,
        None => {
            return TestResult::Error {
                description: "reproduce token's shrink path no longer matches the tree".to_string(),
            }
        }
    };
    let description = terminus.value();
    if !description.is_failure() {
        return TestResult::Error {
            description: "reproduced case no longer fails".to_string(),
        };
    }
    TestResult::Failure {
        num_success: 0,
        description: description.result_message(),
        reproduce: reproduce.clone(),
        counter_example: description.example(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::to_property;

    #[test]
    fn size_for_even_schedule_covers_full_range() {
        let params = TestParams {
            seed: 0,
            max_success: 101,
            max_size: 100,
            max_discard_ratio: 10,
            disable_shrinking: false,
            shrink_tries: 1,
        };
        let mut saw_max = false;
        for i in 0..params.max_success {
            let size = size_for(&params, i);
            assert!(size <= params.max_size);
            if size == params.max_size {
                saw_max = true;
            }
        }
        assert!(saw_max);
    }

    #[test]
    fn size_for_uneven_schedule_still_hits_the_top() {
        let params = TestParams {
            seed: 0,
            max_success: 37,
            max_size: 100,
            max_discard_ratio: 10,
            disable_shrinking: false,
            shrink_tries: 1,
        };
        let max_seen = (0..params.max_success).map(|i| size_for(&params, i)).max().unwrap();
        assert_eq!(max_seen, params.max_size);
    }

    #[test]
    fn always_true_property_succeeds() {
        let property = to_property::<i32, bool, _>(|_| true);
        let params = TestParams {
            seed: 7,
            max_success: 20,
            max_size: 20,
            max_discard_ratio: 10,
            disable_shrinking: false,
            shrink_tries: 1,
        };
        let mut listener = NullListener;
        let result = test_property(&property, &Metadata::unidentified(), &params, &mut listener, &HashMap::new());
        assert!(matches!(result, TestResult::Success { num_success: 20, .. }));
    }

    #[test]
    fn negative_property_fails_and_shrinks_to_a_small_counter_example() {
        let property = to_property::<i32, bool, _>(|x| x >= 0);
        let params = TestParams {
            seed: 123,
            max_success: 50,
            max_size: 50,
            max_discard_ratio: 10,
            disable_shrinking: false,
            shrink_tries: 1,
        };
        let mut listener = NullListener;
        let result = test_property(&property, &Metadata::unidentified(), &params, &mut listener, &HashMap::new());
        match result {
            TestResult::Failure { .. } => {}
            other => panic!("expected a failure, got {other:?}"),
        }
    }

    #[test]
    fn always_discarding_property_gives_up() {
        let property = to_property::<i32, CaseResult, _>(|_| {
            crate::property::discard_if(true);
            CaseResult::Success
        });
        let params = TestParams {
            seed: 1,
            max_success: 10,
            max_size: 10,
            max_discard_ratio: 5,
            disable_shrinking: false,
            shrink_tries: 1,
        };
        let mut listener = NullListener;
        let result = test_property(&property, &Metadata::unidentified(), &params, &mut listener, &HashMap::new());
        assert!(matches!(result, TestResult::GaveUp { num_success: 0, .. }));
    }

    #[test]
    fn reproduce_replays_a_recorded_failure() {
        let property = to_property::<i32, bool, _>(|x| x >= 0);
        let params = TestParams {
            seed: 999,
            max_success: 50,
            max_size: 50,
            max_discard_ratio: 10,
            disable_shrinking: false,
            shrink_tries: 1,
        };
        let mut listener = NullListener;
        let first = test_property(&property, &Metadata::unidentified(), &params, &mut listener, &HashMap::new());
        let reproduce = match first {
            TestResult::Failure { reproduce, .. } => reproduce,
            other => panic!("expected a failure to reproduce, got {other:?}"),
        };
        let replayed = reproduce_property(&property, &reproduce);
        assert!(matches!(replayed, TestResult::Failure { .. }));
    }
}
