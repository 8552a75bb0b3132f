use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SnapshotMissing,
    SnapshotInvalid,
    ItemNotFound,
    CycleDetected,
    InvalidReassignTarget,
    ContractViolation,
    InvalidChanges,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SnapshotMissing => "E1001",
            Self::ConfigParseError => "E1002",
            Self::SnapshotInvalid => "E1004",
            Self::ItemNotFound => "E2001",
            Self::CycleDetected => "E2003",
            Self::InvalidChanges => "E2005",
            Self::InvalidReassignTarget => "E2006",
            Self::ContractViolation => "E2007",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SnapshotMissing => "Snapshot file not found",
            Self::SnapshotInvalid => "Snapshot file is invalid",
            Self::ItemNotFound => "Item not found",
            Self::CycleDetected => "Cycle detected in work item graph",
            Self::InvalidReassignTarget => "Invalid reassignment target",
            Self::ContractViolation => "Resolved attributes violate the work package contract",
            Self::InvalidChanges => "Requested changes are not a valid attribute document",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .cadence/config.toml and retry."),
            Self::SnapshotMissing => Some("Pass --snapshot <file> or create cadence.json."),
            Self::SnapshotInvalid => {
                Some("Every item needs a unique id; check the snapshot JSON for typos.")
            }
            Self::ItemNotFound => None,
            Self::CycleDetected => {
                Some("Remove the precedes/follows or parent link that closes the loop.")
            }
            Self::InvalidReassignTarget => {
                Some("Pick an existing work package that is not being deleted.")
            }
            Self::ContractViolation => Some("Supply the missing attributes or fix the dates."),
            Self::InvalidChanges => Some(
                "Pass a JSON object of known attributes, e.g. {\"subject\": \"Draft\", \"parent_id\": null}.",
            ),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
