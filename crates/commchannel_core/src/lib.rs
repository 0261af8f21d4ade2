//! Communication channel domain module.
//!
//! Models postal addresses, phone/fax numbers and email addresses that can be
//! attached to arbitrary owner entities of a host application, resolved
//! polymorphically through an owner-kind registry. This crate is the single
//! source of truth for channel business invariants.

pub mod config;
pub mod db;
pub mod fixture;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::ChannelConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::channel::{
    Channel, ChannelDetails, ChannelId, ChannelType, ChannelValidationError, GeoLocation,
};
pub use model::owner::{
    CommunicationChannelOwner, OwnerKindRegistry, OwnerRef, OwnerRegistryError, OwnerResolver,
};
pub use repo::channel_repo::{ChannelRepository, SqliteChannelRepository};
pub use repo::owner_link_repo::{OwnerLink, OwnerLinkRepository, SqliteOwnerLinkRepository};
pub use repo::{RepoError, RepoResult};
pub use service::channel_actions::{ActionError, ChannelActions, PHONE_OR_FAX_CHOICES};
pub use service::purpose_service::{PurposeService, SqlitePurposeService};
