use serde::Deserialize;

/// Lifecycle states a GoCardless subscription can be in.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    PendingCustomerApproval,
    CustomerApprovalDenied,
    Active,
    Finished,
    Cancelled,
    Paused,
    #[serde(other)]
    Unknown,
}

/// Foreign keys carried by a subscription.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionLinks {
    pub mandate: Option<String>,
}

/// A recurring billing plan instance.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: String,
    /// Plan name. Subscriptions created without one come back as `null`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub links: SubscriptionLinks,
}

impl Subscription {
    /// Label value used when the provider returned no plan name.
    pub const UNNAMED_PLAN: &'static str = "unnamed";

    pub fn plan_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => Self::UNNAMED_PLAN,
        }
    }

    pub fn mandate_id(&self) -> Option<&str> {
        self.links.mandate.as_deref()
    }
}
