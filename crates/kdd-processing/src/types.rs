use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Cell Values
// ============================================================================

/// A single sniffed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) | Self::Missing => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Missing => write!(f, "?"),
        }
    }
}

// ============================================================================
// Split Tags
// ============================================================================

/// Which partition of the dataset a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Train,
    Validation,
    Test,
}

impl SplitKind {
    pub const ALL: [SplitKind; 3] = [SplitKind::Train, SplitKind::Validation, SplitKind::Test];

    /// Lower-case key used in JSON payloads and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }

    /// Human-readable title used in logs and chart captions.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Train => "Training Set",
            Self::Validation => "Validation Set",
            Self::Test => "Test Set",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per split, serialized as `{ "train": .., "validation": .., "test": .. }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSplit<T> {
    pub train: T,
    pub validation: T,
    pub test: T,
}

impl<T> PerSplit<T> {
    pub fn get(&self, kind: SplitKind) -> &T {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Validation => &self.validation,
            SplitKind::Test => &self.test,
        }
    }

    /// Apply `f` to every split, in train/validation/test order.
    pub fn map<U>(self, mut f: impl FnMut(SplitKind, T) -> U) -> PerSplit<U> {
        PerSplit {
            train: f(SplitKind::Train, self.train),
            validation: f(SplitKind::Validation, self.validation),
            test: f(SplitKind::Test, self.test),
        }
    }

    /// Like [`PerSplit::map`] but borrowing and short-circuiting on the first error.
    pub fn try_map_ref<U, E>(
        &self,
        mut f: impl FnMut(SplitKind, &T) -> Result<U, E>,
    ) -> Result<PerSplit<U>, E> {
        Ok(PerSplit {
            train: f(SplitKind::Train, &self.train)?,
            validation: f(SplitKind::Validation, &self.validation)?,
            test: f(SplitKind::Test, &self.test)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (SplitKind, &T)> {
        SplitKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

// ============================================================================
// Label Frequencies
// ============================================================================

/// Occurrence count of each label value within one split.
///
/// Entries are ordered by count (descending), then label (ascending), and
/// serialize as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFrequency {
    entries: Vec<(String, usize)>,
}

impl LabelFrequency {
    /// Build from unordered `(label, count)` pairs.
    pub fn from_counts(counts: impl IntoIterator<Item = (String, usize)>) -> Self {
        let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> usize {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.entries.first().map(|(_, c)| *c).unwrap_or(0)
    }
}

impl Serialize for LabelFrequency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_frequency_ordering() {
        let freq = LabelFrequency::from_counts(vec![
            ("udp".to_string(), 3),
            ("icmp".to_string(), 3),
            ("tcp".to_string(), 10),
        ]);
        let labels: Vec<&str> = freq.entries().iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["tcp", "icmp", "udp"]);
        assert_eq!(freq.total(), 16);
        assert_eq!(freq.max_count(), 10);
        assert_eq!(freq.get("missing"), 0);
    }

    #[test]
    fn test_label_frequency_serializes_in_order() {
        let freq = LabelFrequency::from_counts(vec![
            ("udp".to_string(), 1),
            ("tcp".to_string(), 5),
        ]);
        assert_eq!(serde_json::to_string(&freq).unwrap(), r#"{"tcp":5,"udp":1}"#);
    }

    #[test]
    fn test_per_split_serialization_and_map() {
        let sizes = PerSplit {
            train: 6,
            validation: 2,
            test: 2,
        };
        let json = serde_json::to_value(&sizes).unwrap();
        assert_eq!(json["validation"], 2);

        let doubled = sizes.map(|_, n| n * 2);
        assert_eq!(doubled.train, 12);
        let order: Vec<SplitKind> = doubled.iter().map(|(k, _)| k).collect();
        assert_eq!(order, SplitKind::ALL.to_vec());
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Int(0).to_string(), "0");
        assert_eq!(Scalar::Float(2.0).to_string(), "2.0");
        assert_eq!(Scalar::Text("tcp".into()).to_string(), "tcp");
        assert_eq!(Scalar::Missing.as_f64(), None);
    }
}
