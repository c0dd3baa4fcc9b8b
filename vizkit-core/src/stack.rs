//! Stacked layout: per-label cumulative offsets across ordered categories.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::StackedBarRecord;

/// Horizontal extent of one record inside its label's bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackSegment {
    /// Position of the source record in the input slice.
    pub index: usize,
    pub label: String,
    pub category: String,
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StackLayout {
    pub segments: Vec<StackSegment>,
    /// Categories in first-seen order across the whole dataset.
    pub categories: Vec<String>,
    /// Sum of values per label, in first-seen label order.
    pub totals: IndexMap<String, f64>,
}

impl StackLayout {
    pub fn total(&self, label: &str) -> f64 {
        self.totals.get(label).copied().unwrap_or(0.0)
    }

    pub fn max_total(&self) -> f64 {
        self.totals.values().copied().fold(0.0, f64::max)
    }

    /// Labels ordered by descending total; ties keep first-seen order.
    pub fn labels_by_total(&self) -> Vec<String> {
        let mut labels: Vec<(&String, f64)> = self.totals.iter().map(|(l, t)| (l, *t)).collect();
        labels.sort_by(|a, b| b.1.total_cmp(&a.1));
        labels.into_iter().map(|(label, _)| label.clone()).collect()
    }

    /// Share of the segment in its label total, as a percentage.
    pub fn percent_of_label(&self, segment: &StackSegment) -> f64 {
        let total = self.total(&segment.label);
        if total == 0.0 || !total.is_finite() {
            return 0.0;
        }
        (segment.to - segment.from) / total * 100.0
    }

    pub fn segment_for(&self, index: usize) -> Option<&StackSegment> {
        self.segments.iter().find(|segment| segment.index == index)
    }
}

pub fn stack_layout(records: &[StackedBarRecord]) -> StackLayout {
    let categories: IndexSet<&str> = records.iter().map(|r| r.category.as_str()).collect();

    let mut by_label: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (index, record) in records.iter().enumerate() {
        by_label.entry(record.label.as_str()).or_default().push(index);
    }

    let mut segments = Vec::with_capacity(records.len());
    let mut totals = IndexMap::with_capacity(by_label.len());
    for (label, indices) in &by_label {
        let mut cumulative = 0.0;
        for category in &categories {
            for &index in indices {
                let record = &records[index];
                if record.category != *category {
                    continue;
                }
                let from = cumulative;
                cumulative += record.value;
                segments.push(StackSegment {
                    index,
                    label: label.to_string(),
                    category: category.to_string(),
                    from,
                    to: cumulative,
                });
            }
        }
        totals.insert(label.to_string(), cumulative);
    }

    StackLayout {
        segments,
        categories: categories.into_iter().map(str::to_string).collect(),
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str, category: &str, value: f64) -> StackedBarRecord {
        StackedBarRecord {
            label: label.to_string(),
            category: category.to_string(),
            value,
            ..StackedBarRecord::default()
        }
    }

    #[test]
    fn stacks_two_labels_two_categories() {
        let records = vec![
            record("A", "x", 10.0),
            record("A", "y", 20.0),
            record("B", "x", 5.0),
            record("B", "y", 5.0),
        ];
        let layout = stack_layout(&records);

        assert_eq!(layout.total("A"), 30.0);
        assert_eq!(layout.total("B"), 10.0);
        assert_eq!(layout.max_total(), 30.0);
        for segment in layout.segments.iter().filter(|s| s.category == "x") {
            assert_eq!(segment.from, 0.0);
        }
        let a_y = layout.segment_for(1).unwrap();
        assert_eq!((a_y.from, a_y.to), (10.0, 30.0));
        assert!((layout.percent_of_label(a_y) - 66.666).abs() < 0.01);
    }

    #[test]
    fn category_order_is_global_first_seen() {
        // B lists y before x, but x was seen first across the dataset.
        let records = vec![
            record("A", "x", 1.0),
            record("B", "y", 4.0),
            record("B", "x", 2.0),
        ];
        let layout = stack_layout(&records);
        assert_eq!(layout.categories, vec!["x", "y"]);

        let b_x = layout.segment_for(2).unwrap();
        let b_y = layout.segment_for(1).unwrap();
        assert_eq!((b_x.from, b_x.to), (0.0, 2.0));
        assert_eq!((b_y.from, b_y.to), (2.0, 6.0));
    }

    #[test]
    fn labels_sort_by_descending_total() {
        let records = vec![
            record("small", "x", 1.0),
            record("big", "x", 9.0),
            record("mid", "x", 4.0),
            record("tie", "x", 4.0),
        ];
        let layout = stack_layout(&records);
        assert_eq!(layout.labels_by_total(), vec!["big", "mid", "tie", "small"]);
    }

    #[test]
    fn zero_total_gives_zero_percent() {
        let records = vec![record("A", "x", 0.0)];
        let layout = stack_layout(&records);
        assert_eq!(layout.percent_of_label(&layout.segments[0]), 0.0);
        assert!(stack_layout(&[]).segments.is_empty());
    }
}
