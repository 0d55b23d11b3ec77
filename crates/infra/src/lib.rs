//! Infrastructure layer: event store, dispatch pipeline, projections, config
//! and the token service that composes them.

pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod projections;
pub mod read_model;
pub mod service;


pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use config::{ConfigError, LedgerConfig, RoleAssignments};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent};
pub use service::{InMemoryBus, InMemoryTokenService, ServiceResult, TokenService};
