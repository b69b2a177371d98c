use std::collections::HashSet;

/// Episode-scoped memory of hindsight goals already reported.
#[derive(Debug, Clone, Default)]
pub struct HindsightTracker {
    emitted: HashSet<String>,
}

impl HindsightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.emitted.clear();
    }

    pub fn emitted_count(&self) -> usize {
        self.emitted.len()
    }

    /// Keeps goals that are newly satisfied, in the train vocabulary and not
    /// the episode goal. Navigation goals never count; grasp goals count only
    /// on a step whose command was a grasp.
    pub fn filter(
        &mut self,
        sampled: Vec<Vec<String>>,
        episode_goal: &str,
        grasped_this_step: bool,
        vocabulary: &HashSet<String>,
    ) -> Vec<String> {
        let mut fresh = Vec::new();
        for goal in sampled.into_iter().flatten() {
            if goal.starts_with("Go") {
                continue;
            }
            if goal.starts_with("Grasp") && !grasped_this_step {
                continue;
            }
            if goal == episode_goal || !vocabulary.contains(&goal) {
                continue;
            }
            if self.emitted.insert(goal.clone()) {
                fresh.push(goal);
            }
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> HashSet<String> {
        ["Grasp cow", "Grow carrot", "Grow any plant", "Go to cow"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn sampled(goals: &[&[&str]]) -> Vec<Vec<String>> {
        goals
            .iter()
            .map(|group| group.iter().map(|goal| goal.to_string()).collect())
            .collect()
    }

    #[test]
    fn navigation_and_unrequested_grasp_goals_are_dropped() {
        let mut tracker = HindsightTracker::new();
        let reported = tracker.filter(
            sampled(&[&["Go to cow"], &["Grasp cow"], &["Grow any plant"]]),
            "Grow cow",
            false,
            &vocabulary(),
        );
        assert_eq!(reported, vec!["Grow any plant"]);

        let reported = tracker.filter(
            sampled(&[&["Go to cow"], &["Grasp cow"], &[]]),
            "Grow cow",
            true,
            &vocabulary(),
        );
        assert_eq!(reported, vec!["Grasp cow"]);
    }

    #[test]
    fn goals_are_reported_once_per_episode() {
        let mut tracker = HindsightTracker::new();
        let vocabulary = vocabulary();
        let step = sampled(&[&[], &[], &["Grow any plant", "Grow any plant"]]);
        assert_eq!(
            tracker.filter(step.clone(), "Grow lion", false, &vocabulary),
            vec!["Grow any plant"]
        );
        assert!(tracker.filter(step.clone(), "Grow lion", false, &vocabulary).is_empty());

        tracker.clear();
        assert_eq!(tracker.filter(step, "Grow lion", false, &vocabulary).len(), 1);
    }

    #[test]
    fn episode_goal_and_unknown_goals_are_excluded() {
        let mut tracker = HindsightTracker::new();
        let reported = tracker.filter(
            sampled(&[&[], &[], &["Grow carrot", "Grow potato"]]),
            "Grow carrot",
            false,
            &vocabulary(),
        );
        assert!(reported.is_empty());
        assert_eq!(tracker.emitted_count(), 0);
    }
}
