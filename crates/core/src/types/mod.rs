//! Core types for the Culto portal.
//!
//! Flat DTOs mirrored from the Culto API plus a few validated newtypes.

pub mod email;
pub mod grind;
pub mod reason;
pub mod status;
pub mod subscription;

pub use email::{Email, EmailError};
pub use grind::{api_grinding_type, grind_label};
pub use reason::CancellationReason;
pub use status::{DeliveryMethod, FlowType, SubscriptionStatus};
pub use subscription::{
    Address, Coupon, DEFAULT_PLAN_NAME, Price, Subscription, SubscriptionUpdate, current_subscription,
    parse_api_date, plan_name,
};
