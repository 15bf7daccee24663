//! The faces of a roll.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Faces rolled, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollResult {
    faces: Vec<u32>,
}

impl RollResult {
    /// Wrap known d6 faces.
    pub fn from_d6(faces: impl Into<Vec<u32>>) -> Self {
        Self {
            faces: faces.into(),
        }
    }

    /// Sum of the faces.
    pub fn total(&self) -> u32 {
        self.faces.iter().sum()
    }

    /// The faces, in roll order.
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    /// Number of dice rolled.
    pub fn count(&self) -> usize {
        self.faces.len()
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<String> = self.faces.iter().map(u32::to_string).collect();
        write!(f, "[{}] = {}", faces.join(", "), self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_and_faces() {
        let r = RollResult::from_d6([4, 3]);
        assert_eq!(r.total(), 7);
        assert_eq!(r.faces(), [4, 3]);
        assert_eq!(r.count(), 2);
    }

    #[test]
    fn empty_result() {
        let r = RollResult::default();
        assert_eq!(r.total(), 0);
        assert_eq!(r.count(), 0);
    }

    #[test]
    fn display() {
        assert_eq!(RollResult::from_d6([3, 5]).to_string(), "[3, 5] = 8");
    }

    #[test]
    fn serializes_as_face_list() {
        let json = serde_json::to_string(&RollResult::from_d6([6, 1])).unwrap();
        assert_eq!(json, "[6,1]");
    }
}
