//! Decision types produced by the gates.

use serde::{Deserialize, Serialize};

/// The three policy gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateKind {
    /// Code changes only on `milestone/*` branches.
    Milestone,
    /// Committed test files are locked.
    TddLock,
    /// Merges into the protected branch need milestone docs.
    Merge,
}

impl GateKind {
    /// All gates in evaluation order.
    pub const ALL: [GateKind; 3] = [GateKind::Milestone, GateKind::TddLock, GateKind::Merge];

    pub fn as_str(self) -> &'static str {
        match self {
            GateKind::Milestone => "milestone",
            GateKind::TddLock => "tdd-lock",
            GateKind::Merge => "merge",
        }
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one intercepted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Operation proceeds; nothing is emitted.
    Allow,
    /// Operation is refused with an actionable, multi-line reason.
    Block { gate: GateKind, reason: String },
}

impl Decision {
    pub fn block(gate: GateKind, reason: impl Into<String>) -> Self {
        Self::Block {
            gate,
            reason: reason.into(),
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The gate that blocked, if any.
    pub fn gate(&self) -> Option<GateKind> {
        match self {
            Self::Allow => None,
            Self::Block { gate, .. } => Some(*gate),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Block { reason, .. } => Some(reason),
        }
    }
}
