//! Column buffers that turn parsed values into a polars `DataFrame`.

use super::{ArffError, AttributeKind};
use crate::types::Scalar;
use polars::prelude::*;

/// Typed, nullable values of one column.
#[derive(Debug, Clone)]
pub(crate) enum ColumnData {
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    /// Empty buffer matching a declared attribute type.
    pub(crate) fn for_kind(kind: &AttributeKind) -> Self {
        match kind {
            AttributeKind::Numeric | AttributeKind::Real => Self::Float(Vec::new()),
            AttributeKind::Integer => Self::Int(Vec::new()),
            AttributeKind::String | AttributeKind::Nominal(_) => Self::Text(Vec::new()),
        }
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), ArffError> {
        match self {
            Self::Float(values) => values.try_reserve(additional)?,
            Self::Int(values) => values.try_reserve(additional)?,
            Self::Text(values) => values.try_reserve(additional)?,
        }
        Ok(())
    }

    /// Collapse sniffed scalars into the narrowest column type that holds all of them:
    /// all integers stay `Int64`, integers mixed with floats widen to `Float64`,
    /// and any string turns the whole column into text.
    pub(crate) fn from_scalars(values: Vec<Scalar>) -> Self {
        let has_text = values.iter().any(|v| matches!(v, Scalar::Text(_)));
        let has_float = values.iter().any(|v| matches!(v, Scalar::Float(_)));

        if has_text {
            Self::Text(
                values
                    .into_iter()
                    .map(|v| match v {
                        Scalar::Missing => None,
                        other => Some(other.to_string()),
                    })
                    .collect(),
            )
        } else if has_float {
            Self::Float(values.into_iter().map(|v| v.as_f64()).collect())
        } else {
            Self::Int(
                values
                    .into_iter()
                    .map(|v| match v {
                        Scalar::Int(i) => Some(i),
                        _ => None,
                    })
                    .collect(),
            )
        }
    }

    fn into_column(self, name: &str) -> Column {
        let series = match self {
            Self::Float(values) => Series::new(name.into(), values),
            Self::Int(values) => Series::new(name.into(), values),
            Self::Text(values) => Series::new(name.into(), values),
        };
        Column::from(series)
    }
}

/// Assemble named column buffers into a `DataFrame`.
pub(crate) fn build_frame<'a>(
    names: impl IntoIterator<Item = &'a str>,
    columns: Vec<ColumnData>,
) -> Result<DataFrame, ArffError> {
    let columns: Vec<Column> = names
        .into_iter()
        .zip(columns)
        .map(|(name, data)| data.into_column(name))
        .collect();
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scalars_keeps_integers() {
        let data = ColumnData::from_scalars(vec![Scalar::Int(0), Scalar::Int(5)]);
        assert!(matches!(data, ColumnData::Int(ref v) if v == &vec![Some(0), Some(5)]));
    }

    #[test]
    fn test_from_scalars_widens_to_float() {
        let data = ColumnData::from_scalars(vec![Scalar::Int(1), Scalar::Float(1.5)]);
        assert!(matches!(data, ColumnData::Float(ref v) if v == &vec![Some(1.0), Some(1.5)]));
    }

    #[test]
    fn test_from_scalars_text_wins() {
        let data = ColumnData::from_scalars(vec![
            Scalar::Int(1),
            Scalar::Text("tcp".to_string()),
            Scalar::Missing,
        ]);
        assert!(
            matches!(data, ColumnData::Text(ref v) if v == &vec![Some("1".to_string()), Some("tcp".to_string()), None])
        );
    }

    #[test]
    fn test_build_frame_shapes() {
        let df = build_frame(
            ["a", "b"],
            vec![
                ColumnData::Float(vec![Some(1.0), None]),
                ColumnData::Text(vec![Some("x".to_string()), Some("y".to_string())]),
            ],
        )
        .unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("b").unwrap().dtype(), &DataType::String);
    }
}
