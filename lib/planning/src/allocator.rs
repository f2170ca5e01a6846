//! Sprint allocation.
//!
//! Stories are admitted strictly in input order. The order encodes
//! dependency and priority, so the first story that cannot be admitted halts
//! allocation for everything after it, even stories that would still fit.
//! This is sequential fit, not bin packing.

use serde::Serialize;
use sprintcraft_core::{BandwidthMap, EmployeeId, IssueKey, Story, StoryMap};
use std::fmt;
use tracing::{debug, info};

/// Why allocation stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    /// The story has no assignee, or the assignee has no bandwidth entry.
    UnknownAssignee { assignee: Option<EmployeeId> },
    /// The assignee has no points left.
    NoBandwidth { assignee: EmployeeId, remaining: i64 },
    /// The estimate exceeds the assignee's remaining points.
    InsufficientBandwidth {
        assignee: EmployeeId,
        estimate: u32,
        remaining: i64,
    },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAssignee { assignee: None } => write!(f, "story has no assignee"),
            Self::UnknownAssignee {
                assignee: Some(assignee),
            } => write!(f, "assignee {assignee} has no bandwidth entry"),
            Self::NoBandwidth { assignee, .. } => {
                write!(f, "assignee {assignee} has no points left")
            }
            Self::InsufficientBandwidth {
                assignee,
                estimate,
                remaining,
            } => write!(
                f,
                "estimate {estimate} exceeds the {remaining} points left for {assignee}"
            ),
        }
    }
}

/// The story allocation stopped at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Halt {
    /// Position of the story in the input sequence.
    pub position: usize,
    pub issue_id: IssueKey,
    #[serde(flatten)]
    pub reason: HaltReason,
}

/// The admitted prefix and, when allocation stopped early, where and why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationOutcome {
    /// Admitted stories in input order, unmodified.
    pub admitted: StoryMap,
    pub halted: Option<Halt>,
}

impl AllocationOutcome {
    /// Returns true if every input story was admitted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.halted.is_none()
    }
}

/// Checks one story against the bandwidth map without changing it.
fn admission(story: &Story, bandwidth: &BandwidthMap) -> Result<EmployeeId, HaltReason> {
    let Some(assignee) = story.assignee.as_ref().filter(|id| !id.is_empty()) else {
        return Err(HaltReason::UnknownAssignee { assignee: None });
    };
    let Some(capacity) = bandwidth.get(assignee) else {
        return Err(HaltReason::UnknownAssignee {
            assignee: Some(assignee.clone()),
        });
    };

    let remaining = capacity.remaining_points;
    if remaining <= 0 {
        return Err(HaltReason::NoBandwidth {
            assignee: assignee.clone(),
            remaining,
        });
    }
    if i64::from(story.estimate) > remaining {
        return Err(HaltReason::InsufficientBandwidth {
            assignee: assignee.clone(),
            estimate: story.estimate,
            remaining,
        });
    }
    Ok(assignee.clone())
}

/// Admits stories in order, deducting each admitted estimate from its
/// assignee's remaining points in `bandwidth`.
///
/// Remaining points never drop below zero: a story is admitted only when its
/// estimate fits in what is left.
pub fn allocate_to_sprint<'a>(
    stories: impl IntoIterator<Item = &'a Story>,
    bandwidth: &mut BandwidthMap,
) -> AllocationOutcome {
    let mut outcome = AllocationOutcome::default();

    for (position, story) in stories.into_iter().enumerate() {
        match admission(story, bandwidth) {
            Ok(assignee) => {
                if let Some(capacity) = bandwidth.get_mut(&assignee) {
                    capacity.remaining_points -= i64::from(story.estimate);
                }
                debug!(
                    issue = %story.issue_id,
                    %assignee,
                    estimate = story.estimate,
                    "story admitted"
                );
                outcome.admitted.insert(story.clone());
            }
            Err(reason) => {
                info!(
                    issue = %story.issue_id,
                    position,
                    %reason,
                    "allocation halted"
                );
                outcome.halted = Some(Halt {
                    position,
                    issue_id: story.issue_id.clone(),
                    reason,
                });
                break;
            }
        }
    }

    info!(admitted = outcome.admitted.len(), "sprint allocation finished");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sprintcraft_core::EmployeeCapacity;

    fn story(key: &str, assignee: Option<&str>, estimate: u32) -> Story {
        let story = Story::new(format!("Story {key}"), "Core", estimate).with_issue_id(key);
        match assignee {
            Some(assignee) => story.with_assignee(assignee),
            None => story,
        }
    }

    fn bandwidth(entries: &[(&str, i64)]) -> BandwidthMap {
        entries
            .iter()
            .map(|(id, points)| (EmployeeId::new(*id), EmployeeCapacity::new(*id, *points)))
            .collect()
    }

    #[test]
    fn first_misfit_halts_allocation() {
        let stories = [
            story("S1", Some("E1"), 5),
            story("S2", Some("E1"), 8),
            story("S3", Some("E2"), 3),
        ];
        let mut bw = bandwidth(&[("E1", 10), ("E2", 10), ("E3", 10)]);

        let outcome = allocate_to_sprint(&stories, &mut bw);

        let admitted: Vec<&str> = outcome.admitted.keys().map(IssueKey::as_str).collect();
        assert_eq!(admitted, vec!["S1"]);
        assert_eq!(bw[&EmployeeId::new("E1")].remaining_points, 5);
        // S3 fits but comes after the halt, so E2 keeps everything.
        assert_eq!(bw[&EmployeeId::new("E2")].remaining_points, 10);
        assert_eq!(bw[&EmployeeId::new("E3")].remaining_points, 10);
        let halt = outcome.halted.unwrap();
        assert_eq!(halt.position, 1);
        assert_eq!(halt.issue_id.as_str(), "S2");
        assert_eq!(
            halt.reason,
            HaltReason::InsufficientBandwidth {
                assignee: EmployeeId::new("E1"),
                estimate: 8,
                remaining: 5,
            }
        );
    }

    #[test]
    fn missing_assignee_halts_allocation() {
        let stories = [
            story("S1", None, 1),
            story("S2", Some("E1"), 1),
        ];
        let mut bw = bandwidth(&[("E1", 10)]);

        let outcome = allocate_to_sprint(&stories, &mut bw);
        assert!(outcome.admitted.is_empty());
        assert_eq!(
            outcome.halted.map(|halt| halt.reason),
            Some(HaltReason::UnknownAssignee { assignee: None })
        );
    }

    #[test]
    fn assignee_outside_bandwidth_map_halts_allocation() {
        let stories = [story("S1", Some("E9"), 1)];
        let mut bw = bandwidth(&[("E1", 10)]);

        let outcome = allocate_to_sprint(&stories, &mut bw);
        assert!(matches!(
            outcome.halted.map(|halt| halt.reason),
            Some(HaltReason::UnknownAssignee { assignee: Some(_) })
        ));
    }

    #[test]
    fn non_positive_bandwidth_takes_nothing() {
        let stories = [story("S1", Some("E1"), 0)];
        let mut bw = bandwidth(&[("E1", 0)]);

        let outcome = allocate_to_sprint(&stories, &mut bw);
        assert!(outcome.admitted.is_empty());
        assert!(matches!(
            outcome.halted.map(|halt| halt.reason),
            Some(HaltReason::NoBandwidth { remaining: 0, .. })
        ));
    }

    #[test]
    fn exact_fit_is_admitted() {
        let stories = [story("S1", Some("E1"), 3), story("S2", Some("E1"), 2)];
        let mut bw = bandwidth(&[("E1", 5)]);

        let outcome = allocate_to_sprint(&stories, &mut bw);
        assert!(outcome.is_complete());
        assert_eq!(outcome.admitted.len(), 2);
        assert_eq!(bw[&EmployeeId::new("E1")].remaining_points, 0);
    }

    #[test]
    fn admitted_stories_are_unmodified() {
        let stories = [story("S1", Some("E1"), 3).with_description("login form")];
        let mut bw = bandwidth(&[("E1", 5)]);

        let outcome = allocate_to_sprint(&stories, &mut bw);
        assert_eq!(outcome.admitted.get(&IssueKey::new("S1")), Some(&stories[0]));
    }

    fn arb_story(index: usize) -> impl Strategy<Value = Story> {
        (proptest::option::of(0..4u8), 0..8u32).prop_map(move |(assignee, estimate)| {
            story(
                &format!("S{index}"),
                assignee.map(|n| format!("E{n}")).as_deref(),
                estimate,
            )
        })
    }

    fn arb_stories() -> impl Strategy<Value = Vec<Story>> {
        (0..12usize).prop_flat_map(|len| (0..len).map(arb_story).collect::<Vec<_>>())
    }

    fn arb_bandwidth() -> impl Strategy<Value = BandwidthMap> {
        proptest::collection::vec(-3..15i64, 3).prop_map(|points| {
            points
                .into_iter()
                .enumerate()
                .map(|(n, points)| {
                    let id = format!("E{n}");
                    (EmployeeId::new(id.clone()), EmployeeCapacity::new(id, points))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn never_drives_bandwidth_below_zero(stories in arb_stories(), initial in arb_bandwidth()) {
            let mut bw = initial.clone();
            allocate_to_sprint(&stories, &mut bw);

            for (id, capacity) in &bw {
                let before = initial[id].remaining_points;
                if before >= 0 {
                    prop_assert!(capacity.remaining_points >= 0);
                } else {
                    prop_assert_eq!(capacity.remaining_points, before);
                }
            }
        }

        #[test]
        fn allocation_is_prefix_deterministic(
            stories in arb_stories(),
            initial in arb_bandwidth(),
            cut in 0..12usize,
        ) {
            let cut = cut.min(stories.len());

            let mut full_bw = initial.clone();
            let full = allocate_to_sprint(&stories, &mut full_bw);
            let mut prefix_bw = initial.clone();
            let prefix = allocate_to_sprint(&stories[..cut], &mut prefix_bw);

            let expected: Vec<&IssueKey> =
                full.admitted.keys().take(prefix.admitted.len()).collect();
            let actual: Vec<&IssueKey> = prefix.admitted.keys().collect();
            prop_assert_eq!(actual, expected);
            prop_assert!(prefix.admitted.len() == full.admitted.len().min(cut));

            let mut again_bw = initial.clone();
            let again = allocate_to_sprint(&stories, &mut again_bw);
            prop_assert_eq!(again, full);
            prop_assert_eq!(again_bw, full_bw);
        }

        #[test]
        fn admitted_set_is_a_prefix_of_the_input(
            stories in arb_stories(),
            initial in arb_bandwidth(),
        ) {
            let mut bw = initial;
            let outcome = allocate_to_sprint(&stories, &mut bw);

            let admitted: Vec<&Story> = outcome.admitted.iter().collect();
            let head: Vec<&Story> = stories.iter().take(admitted.len()).collect();
            prop_assert_eq!(admitted, head);
            match outcome.halted {
                Some(halt) => prop_assert_eq!(halt.position, outcome.admitted.len()),
                None => prop_assert_eq!(outcome.admitted.len(), stories.len()),
            }
        }
    }
}
