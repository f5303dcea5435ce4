//! Broadcasting of scalar-or-vector parameters to a fixed number of dimensions.

use crate::error::ShapeError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A parameter given either once for every axis or explicitly per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue<T> {
    Scalar(T),
    Vector(Vec<T>),
}

impl<T: Clone> ParamValue<T> {
    /// Number of components when the value is a vector, `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            ParamValue::Scalar(_) => None,
            ParamValue::Vector(values) => Some(values.len()),
        }
    }

    /// Coerces the value to a vector of at least one element.
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            ParamValue::Scalar(value) => vec![value.clone()],
            ParamValue::Vector(values) => values.clone(),
        }
    }
}

impl From<f64> for ParamValue<f64> {
    fn from(value: f64) -> Self {
        ParamValue::Scalar(value)
    }
}

impl<T> From<Vec<T>> for ParamValue<T> {
    fn from(values: Vec<T>) -> Self {
        ParamValue::Vector(values)
    }
}

impl<T: Clone> From<&[T]> for ParamValue<T> {
    fn from(values: &[T]) -> Self {
        ParamValue::Vector(values.to_vec())
    }
}

impl<T, const N: usize> From<[T; N]> for ParamValue<T> {
    fn from(values: [T; N]) -> Self {
        ParamValue::Vector(values.into())
    }
}

/// Converts `value` into a vector of exactly `ndim` entries.
///
/// Scalars are repeated; vectors must already have `ndim` entries.
pub fn value_to_vector<T>(value: impl Into<ParamValue<T>>, ndim: usize) -> Result<Vec<T>, ShapeError>
where
    T: Clone + Debug,
{
    match value.into() {
        ParamValue::Scalar(value) => Ok(vec![value; ndim]),
        ParamValue::Vector(values) => {
            if values.len() != ndim {
                return Err(ShapeError::DimensionMismatch {
                    value: format!("{values:?}"),
                    ndim,
                });
            }
            Ok(values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{value_to_vector, ParamValue};
    use crate::boundary::Boundary;
    use crate::error::ShapeError;

    #[test]
    fn scalar_is_repeated_ndim_times() {
        for ndim in 1..5 {
            let vec = value_to_vector::<f64>(2.5, ndim).expect("scalar broadcast");
            assert_eq!(vec.len(), ndim);
            assert!(vec.iter().all(|&v| v == 2.5));
        }
    }

    #[test]
    fn matching_vector_is_returned_unchanged() {
        let vec = value_to_vector::<f64>(vec![1.0, -2.0, 3.5], 3).expect("vector passthrough");
        assert_eq!(vec, vec![1.0, -2.0, 3.5]);
        let vec = value_to_vector::<f64>([4.0, 5.0], 2).expect("array passthrough");
        assert_eq!(vec, vec![4.0, 5.0]);
    }

    #[test]
    fn mismatched_vector_is_rejected() {
        let err = value_to_vector::<f64>(vec![1.0, 2.0], 3).expect_err("length mismatch");
        assert!(matches!(err, ShapeError::DimensionMismatch { ndim: 3, .. }));
        let message = err.to_string();
        assert!(message.contains("ndim = 3"), "got {message}");
        assert!(message.contains("[1.0, 2.0]"), "got {message}");
    }

    #[test]
    fn single_element_vector_is_not_treated_as_scalar() {
        assert!(value_to_vector::<f64>(vec![1.0], 2).is_err());
        assert_eq!(value_to_vector::<f64>(vec![1.0], 1).unwrap(), vec![1.0]);
    }

    #[test]
    fn non_numeric_values_broadcast() {
        let vec = value_to_vector(ParamValue::Scalar(Boundary::Periodic), 2).unwrap();
        assert_eq!(vec, vec![Boundary::Periodic, Boundary::Periodic]);
        let ints = value_to_vector(ParamValue::Scalar(3usize), 2).unwrap();
        assert_eq!(ints, vec![3, 3]);
    }

    #[test]
    fn param_value_deserializes_scalar_or_list() {
        let scalar: ParamValue<f64> = serde_json::from_str("3.0").unwrap();
        assert_eq!(scalar, ParamValue::Scalar(3.0));
        let vector: ParamValue<f64> = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(vector.len(), Some(2));
    }
}
