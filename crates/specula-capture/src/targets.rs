use std::str::FromStr;

use specula_engine::coords::{LogicalSize, PhysicalExtent};

/// Identifier of a capture target.
///
/// Stable for as long as the underlying display/window exists; a target
/// that disappears and comes back may enumerate under a new id.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TargetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| "invalid target id".to_string())
    }
}

/// What kind of thing a target mirrors.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetKind {
    Display,
    Window,
}

/// Descriptor of one enumerable capture target.
#[derive(Debug, Clone)]
pub struct Target {
    pub id: TargetId,
    pub kind: TargetKind,
    pub name: String,

    /// Backing-store dimensions in physical pixels.
    pub physical: PhysicalExtent,

    /// Intended display size in logical pixels (physical divided by the
    /// target's scale factor).
    pub logical: LogicalSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_id_round_trips_through_str() {
        let id = TargetId::new(42);
        let parsed: TargetId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn target_id_rejects_garbage() {
        assert!("not-a-number".parse::<TargetId>().is_err());
    }
}
