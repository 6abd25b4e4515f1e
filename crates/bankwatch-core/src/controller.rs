// ── Controller ──
//
// Full lifecycle management for one entity-store session: access
// resolution, fetch cycles, command routing, and the background refresh
// and summary tasks.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bankwatch_api::EntityQuery;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{
    Command, CommandEnvelope, CommandResult, CreateCustomerRequest, CreateEntityRequest,
    UpdateEntityRequest,
};
use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::hierarchy::{
    BreadcrumbItem, Forest, MAX_HIERARCHY_DEPTH, next_child_type, resolve_path_remote,
};
use crate::model::hierarchy_config::validate_levels;
use crate::model::{
    AccessScope, Entity, EntityId, EntityType, EntityUpdate, HierarchyConfig, Metadata,
    NewEntity, Role, UserContext,
};
use crate::source::{EntitySource, RestSource};
use crate::store::{DataStore, RefreshSnapshot};
use crate::summary::DashboardSummary;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Generic over the entity
/// source so the same logic runs against the REST store and in-memory
/// fixtures.
pub struct Controller<S: EntitySource = RestSource> {
    inner: Arc<ControllerInner<S>>,
}

impl<S: EntitySource> Clone for Controller<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<S> {
    config: ControllerConfig,
    source: S,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    user: Mutex<Option<UserContext>>,
    scope: watch::Sender<AccessScope>,
    /// Last issued fetch generation.
    generation: AtomicU64,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current connection, replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller<RestSource> {
    /// Controller backed by the REST store described in `config`.
    /// Does NOT connect: call [`connect()`](Self::connect).
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let source = RestSource::new(&config)?;
        Ok(Self::with_source(config, source))
    }

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Disables the periodic refresh and summary tasks since a CLI
    /// invocation needs a single fetch cycle.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;
        cfg.summary_interval = Duration::ZERO;

        let controller = Controller::new(cfg)?;
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }
}

impl<S: EntitySource> Controller<S> {
    pub fn with_source(config: ControllerConfig, source: S) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (scope, _) = watch::channel(AccessScope::Nothing);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                source,
                store: Arc::new(DataStore::new()),
                connection_state,
                user: Mutex::new(None),
                scope,
                generation: AtomicU64::new(0),
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Resolve the user's access scope, run the first fetch cycle, and
    /// spawn the background tasks.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        if let Err(e) = self.initial_load().await {
            self.inner
                .connection_state
                .send_replace(ConnectionState::Failed);
            return Err(e);
        }

        let config = &self.inner.config;
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx, child.clone())));
        }

        let interval_secs = config.refresh_interval_secs;
        if interval_secs > 0 {
            let ctrl = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(refresh_task(ctrl, interval_secs, cancel)));
        }

        let summary_interval = config.summary_interval;
        if !summary_interval.is_zero() {
            let ctrl = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(summary_task(ctrl, summary_interval, cancel)));
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(url = %config.url, "connected to entity store");
        Ok(())
    }

    async fn initial_load(&self) -> Result<(), CoreError> {
        let user = self.resolve_user().await?;
        let scope = AccessScope::for_user(&user);
        debug!(user = %user.user_id, role = %user.role, ?scope, "resolved access scope");
        if scope == AccessScope::Nothing {
            warn!(user = %user.user_id, "user has no hierarchy access");
        }
        *self.inner.user.lock().await = Some(user);
        self.inner.scope.send_replace(scope);

        self.full_refresh().await?;
        Ok(())
    }

    async fn resolve_user(&self) -> Result<UserContext, CoreError> {
        let Some(user_id) = self.inner.config.user_id.as_deref() else {
            return Ok(UserContext::service());
        };
        match self.inner.source.get_profile(user_id).await? {
            Some(profile) => Ok(profile),
            None => {
                warn!(user_id, "no profile row, treating as plain user");
                Ok(UserContext {
                    user_id: user_id.to_owned(),
                    display_name: None,
                    role: Role::User,
                    customer_id: None,
                })
            }
        }
    }

    /// Cancel background tasks, drop resident data, and reset the
    /// connection state to [`Disconnected`](ConnectionState::Disconnected).
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        // Fresh command channel so a reconnect can spawn a new processor.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.inner.store.clear();
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Fetch cycles ─────────────────────────────────────────────

    /// Fetch the scoped entity set, rebuild the forest, and swap it in.
    ///
    /// On failure the previous forest stays in place. A cycle overtaken
    /// by a newer one is discarded, and the newer forest is returned.
    pub async fn full_refresh(&self) -> Result<Arc<Forest>, CoreError> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let scope = self.inner.scope.borrow().clone();

        let (entities, configs) = self.fetch_scoped(&scope).await?;
        let forest = Forest::build(entities.clone(), self.inner.config.orphan_policy)?;

        info!(
            generation,
            entities = entities.len(),
            roots = forest.roots().len(),
            clean = forest.report().is_clean(),
            "fetch cycle complete"
        );

        let applied = self.inner.store.apply_snapshot(RefreshSnapshot {
            generation,
            entities,
            configs,
            forest,
        });
        if applied {
            self.inner.store.refresh_summary();
        }
        Ok(self.inner.store.forest())
    }

    /// Fetch exactly the rows the scope allows.
    ///
    /// Scoped users never request other customers' rows: the customer is
    /// fetched by id, then its subtree one level at a time with
    /// `parent_id in (…)`.
    async fn fetch_scoped(
        &self,
        scope: &AccessScope,
    ) -> Result<(Vec<Entity>, Vec<HierarchyConfig>), CoreError> {
        let source = &self.inner.source;

        match scope {
            AccessScope::Nothing => Ok((Vec::new(), Vec::new())),
            AccessScope::All => {
                let entities = source.list_entities(&EntityQuery::all()).await?;
                let configs = source.list_hierarchy_configs(None).await?;
                Ok((entities, configs))
            }
            AccessScope::Customer(customer_id) => {
                let query = EntityQuery::by_id(customer_id.to_string())
                    .of_type(EntityType::Customer.to_string());
                let mut entities = source.list_entities(&query).await?;
                if entities.is_empty() {
                    warn!(%customer_id, "scoped customer not found");
                    return Ok((Vec::new(), Vec::new()));
                }

                let mut seen: HashSet<EntityId> = HashSet::from([customer_id.clone()]);
                let mut frontier = vec![customer_id.to_string()];
                // Customer plus at most MAX_HIERARCHY_DEPTH levels below it.
                for _ in 0..MAX_HIERARCHY_DEPTH {
                    let parents = std::mem::take(&mut frontier);
                    let level = source
                        .list_entities(&EntityQuery::children_of_any(parents))
                        .await?;
                    let fresh: Vec<Entity> = level
                        .into_iter()
                        .filter(|e| seen.insert(e.id.clone()))
                        .collect();
                    if fresh.is_empty() {
                        break;
                    }
                    frontier = fresh.iter().map(|e| e.id.to_string()).collect();
                    entities.extend(fresh);
                }
                if !frontier.is_empty() {
                    warn!(
                        %customer_id,
                        max_depth = MAX_HIERARCHY_DEPTH,
                        pending = frontier.len(),
                        "scoped fetch reached depth limit, deeper levels not loaded"
                    );
                }

                let configs = source
                    .list_hierarchy_configs(Some(std::slice::from_ref(customer_id)))
                    .await?;
                Ok((entities, configs))
            }
        }
    }

    /// Recount the dashboard summary straight from the store.
    ///
    /// Independent of the forest: runs its own scoped fetch and only
    /// publishes the counts.
    pub async fn refresh_summary(&self) -> Result<Arc<DashboardSummary>, CoreError> {
        let scope = self.inner.scope.borrow().clone();
        let (entities, _) = self.fetch_scoped(&scope).await?;
        let summary = Arc::new(DashboardSummary::compute(&entities));
        self.inner.store.publish_summary(Arc::clone(&summary));
        Ok(summary)
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn forest(&self) -> Arc<Forest> {
        self.inner.store.forest()
    }

    pub async fn user(&self) -> Option<UserContext> {
        self.inner.user.lock().await.clone()
    }

    pub fn access_scope(&self) -> AccessScope {
        self.inner.scope.borrow().clone()
    }

    /// A resident entity, or `NotFound` if it is outside the current view.
    pub fn entity(&self, id: &EntityId) -> Result<Arc<Entity>, CoreError> {
        self.inner
            .store
            .entity(id)
            .ok_or_else(|| not_found(id))
    }

    /// Child tier of an entity under its customer's hierarchy config.
    pub fn child_type(&self, id: &EntityId) -> Option<EntityType> {
        self.inner.store.child_type_of(id)
    }

    /// Ancestor path, root first.
    ///
    /// Resident entities resolve in memory. Others are resolved with
    /// point lookups, and only returned when their root customer is
    /// inside the user's scope.
    pub async fn breadcrumb(&self, id: &EntityId) -> Result<Vec<BreadcrumbItem>, CoreError> {
        let forest = self.forest();
        if forest.entity(id).is_some() {
            return forest.resolve_path(id);
        }

        debug!(%id, "entity not resident, resolving path remotely");
        let path = resolve_path_remote(&self.inner.source, id, self.inner.config.orphan_policy)
            .await?;
        let scope = self.access_scope();
        let visible = path.first().is_some_and(|root| scope.allows_customer(&root.id));
        if !visible {
            return Err(not_found(id));
        }
        Ok(path)
    }

    pub fn summary(&self) -> Option<Arc<DashboardSummary>> {
        self.inner.store.summary()
    }

    pub fn subscribe_summary(&self) -> watch::Receiver<Option<Arc<DashboardSummary>>> {
        self.inner.store.subscribe_summary()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command.
    ///
    /// Sends it through the internal channel to the command processor
    /// task and awaits the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::ControllerDisconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?;

        rx.await.map_err(|_| CoreError::ControllerDisconnected)?
    }

    /// Re-fetch after a successful write. The write already happened, so
    /// a failing refresh is only logged.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.full_refresh().await {
            warn!(error = %e, "refresh after write failed");
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn refresh_task<S: EntitySource>(
    controller: Controller<S>,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

async fn summary_task<S: EntitySource>(
    controller: Controller<S>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh_summary().await {
                    warn!(error = %e, "summary refresh failed");
                }
            }
        }
    }
}

/// Process commands one at a time, in arrival order.
async fn command_processor_task<S: EntitySource>(
    controller: Controller<S>,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&controller, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command<S: EntitySource>(
    controller: &Controller<S>,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    let result = match cmd {
        Command::CreateEntity(req) => create_entity(controller, req).await?,
        Command::CreateCustomer(req) => create_customer(controller, req).await?,
        Command::UpdateEntity { id, update } => update_entity(controller, &id, update).await?,
        Command::DeleteEntity { id } => delete_entity(controller, &id).await?,
    };
    controller.refresh_after_write().await;
    Ok(result)
}

async fn create_entity<S: EntitySource>(
    controller: &Controller<S>,
    req: CreateEntityRequest,
) -> Result<CommandResult, CoreError> {
    let name = validate_name(&req.name)?;
    let store = controller.store();
    let parent = controller.entity(&req.parent_id)?;

    let config = store.config_for(&parent.id);
    let Some(expected) = next_child_type(parent.entity_type, config.as_deref()) else {
        return Err(CoreError::ValidationFailed {
            message: format!("{} '{}' cannot have children", parent.entity_type, parent.name),
        });
    };
    if req.entity_type != expected {
        return Err(CoreError::ValidationFailed {
            message: format!(
                "children of {} '{}' must be of type {expected}, not {}",
                parent.entity_type, parent.name, req.entity_type
            ),
        });
    }

    let entity = NewEntity {
        entity_type: expected,
        name,
        parent_id: Some(parent.id.clone()),
        metadata: conform(expected, &req.metadata),
    };
    let created = controller.source().insert_entity(&entity).await?;
    info!(id = %created.id, kind = %created.entity_type, "entity created");
    Ok(CommandResult::Entity(created))
}

async fn create_customer<S: EntitySource>(
    controller: &Controller<S>,
    req: CreateCustomerRequest,
) -> Result<CommandResult, CoreError> {
    if controller.access_scope() != AccessScope::All {
        return Err(CoreError::AccessDenied {
            message: "only super admins can add customers".into(),
        });
    }
    let name = validate_name(&req.name)?;
    validate_levels(&req.levels)?;

    let source = controller.source();
    let customer = source
        .insert_entity(&NewEntity {
            entity_type: EntityType::Customer,
            name,
            parent_id: None,
            metadata: conform(EntityType::Customer, &req.metadata),
        })
        .await?;

    let config = HierarchyConfig {
        customer_id: customer.id.clone(),
        levels: req.levels,
    };
    let config = match source.insert_hierarchy_config(&config).await {
        Ok(config) => config,
        Err(e) => {
            warn!(id = %customer.id, error = %e, "customer created without hierarchy config");
            return Err(e);
        }
    };

    info!(id = %customer.id, levels = ?config.levels, "customer created");
    Ok(CommandResult::Customer { customer, config })
}

async fn update_entity<S: EntitySource>(
    controller: &Controller<S>,
    id: &EntityId,
    req: UpdateEntityRequest,
) -> Result<CommandResult, CoreError> {
    if req.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "nothing to update".into(),
        });
    }
    let current = controller.entity(id)?;
    let update = EntityUpdate {
        name: req.name.as_deref().map(validate_name).transpose()?,
        metadata: req
            .metadata
            .as_ref()
            .map(|m| conform(current.entity_type, m)),
    };

    let updated = controller.source().update_entity(id, &update).await?;
    info!(%id, "entity updated");
    Ok(CommandResult::Entity(updated))
}

async fn delete_entity<S: EntitySource>(
    controller: &Controller<S>,
    id: &EntityId,
) -> Result<CommandResult, CoreError> {
    let entity = controller.entity(id)?;
    let children = controller
        .store()
        .entities_snapshot()
        .iter()
        .filter(|e| e.parent_id.as_ref() == Some(id))
        .count();
    if children > 0 {
        return Err(CoreError::Conflict {
            message: format!(
                "{} '{}' still has {children} child entities",
                entity.entity_type, entity.name
            ),
        });
    }

    controller.source().delete_entity(id).await?;
    info!(%id, "entity deleted");
    Ok(CommandResult::Deleted(id.clone()))
}

fn validate_name(raw: &str) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "name is required".into(),
        });
    }
    Ok(name.to_owned())
}

/// Re-read metadata through the schema of the target tier.
fn conform(entity_type: EntityType, metadata: &Metadata) -> Metadata {
    Metadata::from_value(entity_type, Some(metadata.to_value()))
}

fn not_found(id: &EntityId) -> CoreError {
    CoreError::NotFound {
        entity_type: "entity".into(),
        identifier: id.to_string(),
    }
}
