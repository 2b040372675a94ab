//! Business logic.
//!
//! | Service | Role |
//! |---------|------|
//! | [`SubscribersGroupValidator`] | Public entry point for subscribers-group checks |
//! | [`MembershipResolver`] | Direct and nested custom-group membership |
//! | [`SystemGroupPolicy`] | Role requirements of system groups |

mod membership;
mod role_policy;
mod subscribers_group;

pub use membership::MembershipResolver;
pub use role_policy::SystemGroupPolicy;
pub use subscribers_group::SubscribersGroupValidator;
