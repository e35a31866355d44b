use std::fmt;
use std::str::FromStr;

use crate::slides::{SlideIndex, FIRST_SLIDE};
use crate::TransitionError;

/// Direction token carried by a navigation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Next,
    Previous,
}

impl FromStr for Direction {
    type Err = TransitionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "next" => Ok(Direction::Next),
            "previous" | "prev" => Ok(Direction::Previous),
            _ => Err(TransitionError::InvalidNavigation(raw.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Next => f.write_str("next"),
            Direction::Previous => f.write_str("previous"),
        }
    }
}

/// Applies the ring navigation rule over `[1, max_index]`.
///
/// `next` past the last slide wraps to the first one and `previous` before
/// the first slide wraps to the last one.
pub fn resolve_target(
    direction: Direction,
    active: SlideIndex,
    max_index: SlideIndex,
) -> SlideIndex {
    match direction {
        Direction::Next => {
            if active < max_index {
                active + 1
            } else {
                FIRST_SLIDE
            }
        }
        Direction::Previous => {
            if active <= FIRST_SLIDE {
                max_index
            } else {
                active - 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_advances_and_wraps() {
        assert_eq!(resolve_target(Direction::Next, 1, 4), 2);
        assert_eq!(resolve_target(Direction::Next, 3, 4), 4);
        assert_eq!(resolve_target(Direction::Next, 4, 4), 1);
    }

    #[test]
    fn previous_retreats_and_wraps() {
        assert_eq!(resolve_target(Direction::Previous, 4, 4), 3);
        assert_eq!(resolve_target(Direction::Previous, 2, 4), 1);
        assert_eq!(resolve_target(Direction::Previous, 1, 4), 4);
    }

    #[test]
    fn single_slide_maps_onto_itself() {
        assert_eq!(resolve_target(Direction::Next, 1, 1), 1);
        assert_eq!(resolve_target(Direction::Previous, 1, 1), 1);
    }

    #[test]
    fn parses_direction_tokens() {
        assert_eq!("next".parse::<Direction>().unwrap(), Direction::Next);
        assert_eq!(" Previous ".parse::<Direction>().unwrap(), Direction::Previous);
        assert_eq!("prev".parse::<Direction>().unwrap(), Direction::Previous);
    }

    #[test]
    fn rejects_unknown_tokens() {
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert!(matches!(
            err,
            TransitionError::InvalidNavigation(ref raw) if raw == "sideways"
        ));
    }
}
