use serde::{Deserialize, Deserializer, Serialize};

/// Completed vs. uncompleted task counts, as served by `stats/completion`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStats {
    #[serde(default, deserialize_with = "count")]
    pub completed: u64,
    #[serde(default, deserialize_with = "count")]
    pub uncompleted: u64,
}

/// One slice of the completion chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSlice {
    pub label: &'static str,
    pub value: u64,
    /// Share of the total, 0.0 ..= 100.0
    pub percent: f64,
}

impl CompletionStats {
    pub fn total(&self) -> u64 {
        self.completed.saturating_add(self.uncompleted)
    }

    /// Completed share in 0.0 ..= 1.0; zero when there are no tasks
    pub fn completion_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.completed as f64 / total as f64,
        }
    }

    pub fn slices(&self) -> [ChartSlice; 2] {
        let total = self.total();
        let percent = |value: u64| {
            if total == 0 {
                0.0
            } else {
                value as f64 * 100.0 / total as f64
            }
        };
        [
            ChartSlice {
                label: "Completed",
                value: self.completed,
                percent: percent(self.completed),
            },
            ChartSlice {
                label: "Uncompleted",
                value: self.uncompleted,
                percent: percent(self.uncompleted),
            },
        ]
    }
}

// Counts may come back as numbers, numeric strings or null
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) => n,
        Some(Raw::Float(f)) if f.is_finite() && f > 0.0 => f as u64,
        Some(Raw::Text(text)) => text.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_zero() {
        let stats: CompletionStats = serde_json::from_str(r#"{"completed": 3}"#).unwrap();
        assert_eq!(stats, CompletionStats { completed: 3, uncompleted: 0 });

        let stats: CompletionStats = serde_json::from_str(r#"{"completed": null, "uncompleted": "5"}"#).unwrap();
        assert_eq!(stats, CompletionStats { completed: 0, uncompleted: 5 });
    }

    #[test]
    fn slices_carry_percentages() {
        let stats = CompletionStats {
            completed: 1,
            uncompleted: 3,
        };
        let [done, open] = stats.slices();
        assert_eq!(done.label, "Completed");
        assert_eq!(done.percent, 25.0);
        assert_eq!(open.value, 3);
        assert_eq!(open.percent, 75.0);
        assert_eq!(stats.completion_ratio(), 0.25);
    }

    #[test]
    fn empty_stats_do_not_divide_by_zero() {
        let stats = CompletionStats::default();
        assert_eq!(stats.completion_ratio(), 0.0);
        assert!(stats.slices().iter().all(|slice| slice.percent == 0.0));
    }

    #[test]
    fn huge_counts_saturate_the_total() {
        let stats: CompletionStats =
            serde_json::from_str(r#"{"completed": 18446744073709551615, "uncompleted": 1}"#).unwrap();
        assert_eq!(stats.total(), u64::MAX);
        assert!(stats.completion_ratio() <= 1.0);
    }
}
