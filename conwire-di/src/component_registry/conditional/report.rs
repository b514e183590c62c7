use crate::component_registry::conditional::ConditionOutcome;
use fxhash::FxHashMap;
use std::fmt::{Display, Formatter};

/// Outcome of a single named condition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionAndOutcome {
    pub condition: &'static str,
    pub outcome: ConditionOutcome,
}

/// Record of all condition evaluations which took place while assembling a registry, grouped by
/// the name of the guarded declaration, in evaluation order.
#[derive(Clone, Debug, Default)]
pub struct ConditionEvaluationReport {
    sources: Vec<(String, Vec<ConditionAndOutcome>)>,
    index: FxHashMap<String, usize>,
}

impl ConditionEvaluationReport {
    pub fn record_outcome(
        &mut self,
        source: &str,
        condition: &'static str,
        outcome: ConditionOutcome,
    ) {
        let entry = ConditionAndOutcome { condition, outcome };

        if let Some(index) = self.index.get(source) {
            self.sources[*index].1.push(entry);
        } else {
            self.index.insert(source.to_string(), self.sources.len());
            self.sources.push((source.to_string(), vec![entry]));
        }
    }

    /// Returns outcomes for a given declaration name, if any conditions were evaluated for it.
    pub fn outcomes_for(&self, source: &str) -> Option<&[ConditionAndOutcome]> {
        self.index
            .get(source)
            .map(|index| self.sources[*index].1.as_slice())
    }

    pub fn outcomes_by_source(&self) -> impl Iterator<Item = (&str, &[ConditionAndOutcome])> {
        self.sources
            .iter()
            .map(|(source, outcomes)| (source.as_str(), outcomes.as_slice()))
    }

    /// Checks if all conditions for a given source matched. Sources without conditions are
    /// considered matched.
    pub fn is_fully_matched(&self, source: &str) -> bool {
        self.outcomes_for(source)
            .map(|outcomes| outcomes.iter().all(|entry| entry.outcome.is_match))
            .unwrap_or(true)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Display for ConditionEvaluationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (source, outcomes) in self.outcomes_by_source() {
            writeln!(f, "{source}:")?;
            for entry in outcomes {
                writeln!(
                    f,
                    "   - {} {}: {}",
                    entry.condition,
                    if entry.outcome.is_match {
                        "matched"
                    } else {
                        "did not match"
                    },
                    entry.outcome.message
                )?;
            }
        }

        Ok(())
    }
}
