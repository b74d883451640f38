//! Dual-level task identifiers.
//!
//! `"N"` names task `N`; `"N.M"` names the `M`-th subtask of task `N`.
//! Both parts are positive integers written without leading zeros.

use std::fmt;
use std::str::FromStr;

use crate::errors::TasksError;

/// A parsed reference to a task or a subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskRef {
    /// A top-level task
    Task(u32),
    /// A subtask within a parent task
    Subtask { parent: u32, index: u32 },
}

impl TaskRef {
    /// Id of the top-level task this reference lives under.
    pub fn task_id(self) -> u32 {
        match self {
            Self::Task(id) | Self::Subtask { parent: id, .. } => id,
        }
    }

    pub fn is_subtask(self) -> bool {
        matches!(self, Self::Subtask { .. })
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(id) => write!(f, "{id}"),
            Self::Subtask { parent, index } => write!(f, "{parent}.{index}"),
        }
    }
}

impl FromStr for TaskRef {
    type Err = TasksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || TasksError::InvalidId { id: s.to_string() };

        match trimmed.split_once('.') {
            None => parse_part(trimmed).map(Self::Task).ok_or_else(invalid),
            Some((parent, index)) => {
                // split_once leaves any further dots in `index`, which parse_part rejects
                let parent = parse_part(parent).ok_or_else(invalid)?;
                let index = parse_part(index).ok_or_else(invalid)?;
                Ok(Self::Subtask { parent, index })
            }
        }
    }
}

/// Parse one positive, canonical integer component.
fn parse_part(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) || part.starts_with('0') {
        return None;
    }
    part.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task() {
        assert_eq!("4".parse::<TaskRef>().unwrap(), TaskRef::Task(4));
        assert_eq!(" 12 ".parse::<TaskRef>().unwrap(), TaskRef::Task(12));
    }

    #[test]
    fn test_parse_subtask() {
        assert_eq!(
            "4.2".parse::<TaskRef>().unwrap(),
            TaskRef::Subtask {
                parent: 4,
                index: 2
            }
        );
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "", "0", "04", "4.", ".2", "4.0", "4.02", "1.2.3", "a", "4.x", "-1", "+3", "4 .2",
            "99999999999",
        ] {
            assert!(
                matches!(bad.parse::<TaskRef>(), Err(TasksError::InvalidId { .. })),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn test_display_is_inverse_of_parse() {
        for id in ["1", "17", "4.2", "10.11"] {
            assert_eq!(id.parse::<TaskRef>().unwrap().to_string(), id);
        }
    }

    #[test]
    fn test_task_id() {
        assert_eq!(TaskRef::Task(3).task_id(), 3);
        assert_eq!(
            TaskRef::Subtask {
                parent: 5,
                index: 1
            }
            .task_id(),
            5
        );
        assert!(!TaskRef::Task(3).is_subtask());
    }
}
