//! Provider records read on each scrape.
//!
//! Every field the provider may omit is optional so a sparse record never
//! fails the whole page.

pub mod mandate;
pub mod subscription;

pub use mandate::{Mandate, MandateLinks, MandateStatus};
pub use subscription::{Subscription, SubscriptionLinks, SubscriptionStatus};
