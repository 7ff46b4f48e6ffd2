//! The eleven entity handles making up the domain model (§3). Each wraps a
//! `GatewayId`-identified vertex behind a cheap, clonable `Arc<Mutex<_>>`
//! handle shared through the process-wide identity cache (`crate::cache`).

mod component;
mod component_type;
mod component_version;
mod flag;
mod flag_severity;
mod flag_type;
mod permission;
mod property;
mod property_type;
mod user;
mod user_group;

pub use component::{Component, ComponentFilter, ComponentOrderKey};
pub use component_type::ComponentType;
pub use component_version::ComponentVersion;
pub use flag::Flag;
pub use flag_severity::FlagSeverity;
pub use flag_type::FlagType;
pub use permission::Permission;
pub use property::Property;
pub use property_type::PropertyType;
pub use user::User;
pub use user_group::UserGroup;
