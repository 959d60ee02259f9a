//! Session models for the portal.

pub mod session;

pub use session::{
    Banner, BannerKind, CustomerIdentity, PortalSession, ProfileState, keys as session_keys,
};
