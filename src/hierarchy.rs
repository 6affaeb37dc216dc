use serde::Serialize;

/// Whether a classification record continues the main taxonomy path or
/// hangs off it as a sibling branch. Decided once, when a record is
/// ingested; consumers never inspect the level name again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Main,
    Alternative,
}

impl Branch {
    /// Legacy datasets mark sibling branches only through the level name.
    pub fn from_level(level: &str) -> Self {
        if level.contains("alternative parent") {
            Branch::Alternative
        } else {
            Branch::Main
        }
    }
}

/// One level/value pair of a compound's taxonomy, in descent order.
#[derive(Debug, Clone)]
pub struct ClassificationRecord {
    pub level: String,
    pub value: String,
    pub branch: Branch,
}

impl ClassificationRecord {
    pub fn new(level: &str, value: &str) -> Self {
        ClassificationRecord {
            level: level.to_string(),
            value: value.to_string(),
            branch: Branch::from_level(level),
        }
    }
}

/// A record with its parent resolved. `parent == ""` marks a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationNode {
    pub value: String,
    pub parent: String,
}

/// Resolves the parent of every record in an ordered classification
/// sequence. Main records chain to the immediately preceding record's
/// value; alternative records attach to the most recent main value.
///
/// The main chain links to `records[i - 1]` even when that predecessor is
/// an alternative record. Stored hierarchies depend on that exact shape,
/// so it is kept as is.
pub fn build_hierarchy(records: &[ClassificationRecord]) -> Vec<ClassificationNode> {
    let mut nodes = Vec::with_capacity(records.len());
    let mut last_main = String::new();
    for (i, record) in records.iter().enumerate() {
        let parent = match record.branch {
            Branch::Main => {
                let parent = if i == 0 {
                    String::new()
                } else {
                    records[i - 1].value.clone()
                };
                last_main = record.value.clone();
                parent
            }
            Branch::Alternative => last_main.clone(),
        };
        nodes.push(ClassificationNode {
            value: record.value.clone(),
            parent,
        });
    }
    nodes
}

/// Column-oriented input for a sunburst trace: positionally aligned
/// label/parent/weight arrays, one entry per node. Sectors are sized
/// uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SunburstInput {
    pub labels: Vec<String>,
    pub parents: Vec<String>,
    pub weights: Vec<u32>,
}

pub fn to_chart_input(nodes: &[ClassificationNode]) -> SunburstInput {
    SunburstInput {
        labels: nodes.iter().map(|n| n.value.clone()).collect(),
        parents: nodes.iter().map(|n| n.parent.clone()).collect(),
        weights: vec![1; nodes.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(levels: &[(&str, &str)]) -> Vec<ClassificationRecord> {
        levels
            .iter()
            .map(|(level, value)| ClassificationRecord::new(level, value))
            .collect()
    }

    fn parents(nodes: &[ClassificationNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.parent.as_str()).collect()
    }

    #[test]
    fn test_branch_from_level() {
        assert_eq!(Branch::from_level("kingdom"), Branch::Main);
        assert_eq!(Branch::from_level("direct parent"), Branch::Main);
        assert_eq!(Branch::from_level("alternative parent"), Branch::Alternative);
        assert_eq!(
            Branch::from_level("alternative parent 3"),
            Branch::Alternative
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(build_hierarchy(&[]).is_empty());
    }

    #[test]
    fn test_plain_chain() {
        let recs = records(&[("kingdom", "A"), ("superclass", "B"), ("class", "C")]);
        let nodes = build_hierarchy(&recs);
        assert_eq!(parents(&nodes), ["", "A", "B"]);
    }

    #[test]
    fn test_first_record_is_root() {
        let recs = records(&[("kingdom", "Organic compounds")]);
        let nodes = build_hierarchy(&recs);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].parent, "");
    }

    #[test]
    fn test_alternative_attaches_to_last_main() {
        let recs = records(&[
            ("kingdom", "A"),
            ("superclass", "B"),
            ("alternative parent 1", "X"),
            ("alternative parent 2", "Y"),
        ]);
        let nodes = build_hierarchy(&recs);
        // Both siblings hang off B, not off each other.
        assert_eq!(parents(&nodes), ["", "A", "B", "B"]);
    }

    #[test]
    fn test_main_after_alternative_links_to_the_alternative() {
        // A main record always chains to its immediate predecessor, even
        // when that predecessor is an alternative record. Pinned on
        // purpose: stored hierarchies rely on this exact edge.
        let recs = records(&[
            ("kingdom", "A"),
            ("superclass", "B"),
            ("alternative parent 1", "X"),
            ("class", "C"),
        ]);
        let nodes = build_hierarchy(&recs);
        assert_eq!(parents(&nodes), ["", "A", "B", "X"]);
        // and C now carries the main chain forward
        let more = records(&[
            ("kingdom", "A"),
            ("superclass", "B"),
            ("alternative parent 1", "X"),
            ("class", "C"),
            ("alternative parent 2", "Y"),
        ]);
        let nodes = build_hierarchy(&more);
        assert_eq!(parents(&nodes), ["", "A", "B", "X", "C"]);
    }

    #[test]
    fn test_leading_alternative_is_root() {
        let recs = records(&[("alternative parent 1", "X"), ("kingdom", "A")]);
        let nodes = build_hierarchy(&recs);
        assert_eq!(parents(&nodes), ["", "X"]);
    }

    #[test]
    fn test_length_and_order_preserved() {
        let recs = records(&[
            ("kingdom", "A"),
            ("superclass", "B"),
            ("alternative parent 1", "X"),
            ("class", "C"),
            ("direct parent", "D"),
        ]);
        let nodes = build_hierarchy(&recs);
        assert_eq!(nodes.len(), recs.len());
        let values: Vec<&str> = nodes.iter().map(|n| n.value.as_str()).collect();
        assert_eq!(values, ["A", "B", "X", "C", "D"]);
    }

    #[test]
    fn test_idempotent() {
        let recs = records(&[
            ("kingdom", "A"),
            ("alternative parent 1", "X"),
            ("superclass", "B"),
        ]);
        assert_eq!(build_hierarchy(&recs), build_hierarchy(&recs));
    }

    #[test]
    fn test_chart_input_alignment() {
        let recs = records(&[
            ("kingdom", "A"),
            ("superclass", "B"),
            ("alternative parent 1", "X"),
        ]);
        let input = to_chart_input(&build_hierarchy(&recs));
        assert_eq!(input.labels, ["A", "B", "X"]);
        assert_eq!(input.parents, ["", "A", "B"]);
        assert_eq!(input.weights, [1, 1, 1]);
        assert_eq!(input.labels.len(), input.parents.len());
        assert_eq!(input.labels.len(), input.weights.len());
    }

    #[test]
    fn test_chart_input_empty() {
        let input = to_chart_input(&[]);
        assert!(input.labels.is_empty());
        assert!(input.parents.is_empty());
        assert!(input.weights.is_empty());
    }
}
