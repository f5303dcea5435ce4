use serde::{Deserialize, Serialize};

/// Behaviour of probability at the two ends of a grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// No flux leaves through the walls.
    #[default]
    Reflecting,
    /// The last cell hops onto the first and vice versa.
    Periodic,
}

impl From<Boundary> for crate::broadcast::ParamValue<Boundary> {
    fn from(value: Boundary) -> Self {
        crate::broadcast::ParamValue::Scalar(value)
    }
}
