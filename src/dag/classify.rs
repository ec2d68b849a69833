// src/dag/classify.rs

//! Local-vs-remote classification of tasks.
//!
//! Aggregation tasks need every intermediate result at once, so they run on
//! the coordinator. The decision is made once per task while the graph is
//! built and stored on the task as an [`ExecutionSite`].
//!
//! The default rule is textual and can misfire: a remote task whose command
//! happens to contain all the markers (say `cat`, `count` and `awk` in a
//! per-part pipeline) is classified as local. Supply a different
//! [`TaskClassifier`] or tune `[graph]` in the settings file when that
//! matters.

use regex::Regex;

use crate::config::ClassifierSettings;
use crate::errors::{DistmakeError, Result};
use crate::types::ExecutionSite;

/// Decides where a task's commands run.
pub trait TaskClassifier: Send + Sync {
    fn classify(&self, name: &str, commands: &[String]) -> ExecutionSite;
}

impl<F> TaskClassifier for F
where
    F: Fn(&str, &[String]) -> ExecutionSite + Send + Sync,
{
    fn classify(&self, name: &str, commands: &[String]) -> ExecutionSite {
        self(name, commands)
    }
}

/// Default classifier.
///
/// A task is a local aggregation when
/// - its name is one of the aggregate targets (default `total.txt`), or
/// - one of its commands contains every marker (default `cat`, `count`,
///   `awk`), or
/// - one of its commands matches the optional aggregate pattern.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    targets: Vec<String>,
    markers: Vec<String>,
    pattern: Option<Regex>,
}

impl MarkerClassifier {
    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self> {
        let pattern = settings
            .aggregate_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| {
                DistmakeError::InvalidConfig(format!("invalid aggregate pattern: {e}"))
            })?;

        Ok(Self {
            targets: settings.aggregate_targets.clone(),
            markers: settings.aggregate_markers.clone(),
            pattern,
        })
    }

    fn command_aggregates(&self, command: &str) -> bool {
        let by_markers =
            !self.markers.is_empty() && self.markers.iter().all(|m| command.contains(m.as_str()));
        let by_pattern = self
            .pattern
            .as_ref()
            .is_some_and(|re| re.is_match(command));
        by_markers || by_pattern
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        let settings = ClassifierSettings::default();
        Self {
            targets: settings.aggregate_targets,
            markers: settings.aggregate_markers,
            pattern: None,
        }
    }
}

impl TaskClassifier for MarkerClassifier {
    fn classify(&self, name: &str, commands: &[String]) -> ExecutionSite {
        let by_name = self.targets.iter().any(|t| t == name);
        if by_name || commands.iter().any(|c| self.command_aggregates(c)) {
            ExecutionSite::LocalAggregate
        } else {
            ExecutionSite::Remote
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmds(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn final_target_is_local() {
        let c = MarkerClassifier::default();
        assert_eq!(
            c.classify("total.txt", &cmds(&["echo 0 > total.txt"])),
            ExecutionSite::LocalAggregate
        );
    }

    #[test]
    fn combining_count_files_is_local() {
        let c = MarkerClassifier::default();
        let site = c.classify(
            "sum.txt",
            &cmds(&["cat count1.txt count2.txt | awk '{s+=$1} END {print s}' > sum.txt"]),
        );
        assert_eq!(site, ExecutionSite::LocalAggregate);
    }

    #[test]
    fn ordinary_work_is_remote() {
        let c = MarkerClassifier::default();
        assert_eq!(
            c.classify("count1.txt", &cmds(&["wc -w < part1.txt > count1.txt"])),
            ExecutionSite::Remote
        );
    }

    #[test]
    fn marker_rule_is_textual() {
        // Known ambiguity: a per-part pipeline that mentions every marker is
        // routed locally even though it only needs its own input.
        let c = MarkerClassifier::default();
        let site = c.classify(
            "count3.txt",
            &cmds(&["cat part3.txt | awk '{n+=NF} END {print n}' > count3.txt"]),
        );
        assert_eq!(site, ExecutionSite::LocalAggregate);
    }

    #[test]
    fn pattern_and_empty_markers() {
        let settings = ClassifierSettings {
            aggregate_targets: vec![],
            aggregate_markers: vec![],
            aggregate_pattern: Some(r"^merge\s".to_string()),
        };
        let c = MarkerClassifier::from_settings(&settings).unwrap();
        assert_eq!(
            c.classify("out", &cmds(&["merge a b > out"])),
            ExecutionSite::LocalAggregate
        );
        assert_eq!(
            c.classify("total.txt", &cmds(&["cat count | awk x"])),
            ExecutionSite::Remote
        );
    }

    #[test]
    fn closures_are_classifiers() {
        let always_local = |_: &str, _: &[String]| ExecutionSite::LocalAggregate;
        assert_eq!(
            always_local.classify("x", &[]),
            ExecutionSite::LocalAggregate
        );
    }
}
