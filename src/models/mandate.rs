use serde::Deserialize;

/// Lifecycle states a GoCardless mandate can be in.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MandateStatus {
    PendingCustomerApproval,
    PendingSubmission,
    Submitted,
    Active,
    SuspendedByPayer,
    Failed,
    Cancelled,
    Expired,
    Consumed,
    Blocked,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MandateLinks {
    pub customer: Option<String>,
}

/// Authorisation linking a customer to a payment method.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Mandate {
    pub id: String,
    #[serde(default)]
    pub status: Option<MandateStatus>,
    #[serde(default)]
    pub links: MandateLinks,
}

impl Mandate {
    pub fn customer_id(&self) -> Option<&str> {
        self.links.customer.as_deref()
    }
}
