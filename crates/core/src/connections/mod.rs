//! Connections module - broker account links, their credentials and push tokens.

mod connections_model;
mod connections_service;
mod connections_traits;


pub use connections_model::{
    CallerIdentity, Connection, ConnectionChanges, ConnectionStatus, ConnectionUpdate, LastSyncStatus,
    NewConnection, OwnerSummary, ProviderKind, PushTokenGrant, SyncStateUpdate,
};
pub use connections_service::{generate_push_token, ConnectionService};
pub use connections_traits::{ConnectionRepositoryTrait, ConnectionServiceTrait};
