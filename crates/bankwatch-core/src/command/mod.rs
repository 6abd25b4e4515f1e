// ── Command API ──
//
// All writes flow through a single `Command` enum, processed one at a
// time by the controller's command task.

pub mod requests;

use crate::error::CoreError;
use crate::model::{Entity, EntityId, HierarchyConfig};

pub use requests::{CreateCustomerRequest, CreateEntityRequest, UpdateEntityRequest};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All write operations against the entity store.
#[derive(Debug, Clone)]
pub enum Command {
    CreateEntity(CreateEntityRequest),
    CreateCustomer(CreateCustomerRequest),
    UpdateEntity {
        id: EntityId,
        update: UpdateEntityRequest,
    },
    DeleteEntity {
        id: EntityId,
    },
}

/// Result of a successful command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Entity(Entity),
    Customer {
        customer: Entity,
        config: HierarchyConfig,
    },
    Deleted(EntityId),
}
