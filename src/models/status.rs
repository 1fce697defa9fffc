use std::fmt;

/// Approval stage shared by timesheets and expense reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalStatus {
    Draft,
    Submitted,
    ClientApproved,
    PayrollApproved,
    Rejected,
}

impl ApprovalStatus {
    pub const ALL: [ApprovalStatus; 5] = [
        ApprovalStatus::Draft,
        ApprovalStatus::Submitted,
        ApprovalStatus::ClientApproved,
        ApprovalStatus::PayrollApproved,
        ApprovalStatus::Rejected,
    ];

    /// Value stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "draft",
            ApprovalStatus::Submitted => "submitted",
            ApprovalStatus::ClientApproved => "client_approved",
            ApprovalStatus::PayrollApproved => "payroll_approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    /// Human readable badge text
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "Draft",
            ApprovalStatus::Submitted => "Submitted",
            ApprovalStatus::ClientApproved => "Client Approved",
            ApprovalStatus::PayrollApproved => "Payroll Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }

    /// Whether the owner may still change entries/items
    pub fn is_editable(&self) -> bool {
        matches!(self, ApprovalStatus::Draft | ApprovalStatus::Rejected)
    }

    /// Waiting on somebody other than the owner
    pub fn is_pending(&self) -> bool {
        matches!(self, ApprovalStatus::Submitted | ApprovalStatus::ClientApproved)
    }

    /// Client approval or later
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::ClientApproved | ApprovalStatus::PayrollApproved)
    }

    /// Cycles through the status filter on list screens; `None` means all.
    pub fn cycle_filter(current: Option<ApprovalStatus>) -> Option<ApprovalStatus> {
        match current {
            None => Some(ApprovalStatus::Draft),
            Some(ApprovalStatus::Draft) => Some(ApprovalStatus::Submitted),
            Some(ApprovalStatus::Submitted) => Some(ApprovalStatus::ClientApproved),
            Some(ApprovalStatus::ClientApproved) => Some(ApprovalStatus::PayrollApproved),
            Some(ApprovalStatus::PayrollApproved) => Some(ApprovalStatus::Rejected),
            Some(ApprovalStatus::Rejected) => None,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl TryFrom<String> for ApprovalStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApprovalStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
