//! Game status lifecycle.
//!
//! The numeric status codes and their partition into the three lifecycle
//! states are an upstream contract, not something we get to invent.

use crate::ParseError;

/// The three-state lifecycle of a game. The derived ordering is the
/// transition order: `Preview < Live < Final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GameStatus {
    Preview,
    Live,
    Final,
}

impl GameStatus {
    /// Maps an upstream numeric status code to its lifecycle state.
    pub fn from_code(code: i64) -> Result<GameStatus, ParseError> {
        match code {
            1 | 2 | 8 | 9 => Ok(GameStatus::Preview),
            3 | 4 => Ok(GameStatus::Live),
            5 | 6 | 7 => Ok(GameStatus::Final),
            other => Err(ParseError::UnknownStatusCode(other)),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, GameStatus::Final)
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, GameStatus::Preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_partition_matches_upstream_contract() {
        for code in [1, 2, 8, 9] {
            assert_eq!(GameStatus::from_code(code).unwrap(), GameStatus::Preview);
        }
        for code in [3, 4] {
            assert_eq!(GameStatus::from_code(code).unwrap(), GameStatus::Live);
        }
        for code in [5, 6, 7] {
            assert_eq!(GameStatus::from_code(code).unwrap(), GameStatus::Final);
        }
        assert!(GameStatus::from_code(10).is_err());
    }

    #[test]
    fn lifecycle_order_is_monotone() {
        assert!(GameStatus::Preview < GameStatus::Live);
        assert!(GameStatus::Live < GameStatus::Final);
    }
}
