//! Plan/apply driver for single resource instances.
//!
//! This is the minimal host loop needed to embed the provider: it validates
//! configuration, lets the resource reject invalid combinations, chooses an
//! action by comparing declared values with recorded state, and runs the
//! matching handler operation. Graph scheduling and state storage stay with
//! the caller.

use super::core::Provider;
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult};
use crate::resource::{InstanceState, ResourceData, ResourceHandler, ResourceOperation};
use crate::schema::ResourceSchema;
use log::{debug, info, warn};
use serde_json::Value;

/// What applying a plan will do to the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// No recorded state: create (or adopt) the object
    Create,
    /// Change the object in place
    Update,
    /// Delete the object and create it again
    Replace,
    /// Declared values match recorded state
    NoOp,
}

/// A validated change to one resource instance.
#[derive(Debug, Clone)]
pub struct Plan {
    pub resource_type: String,
    pub action: PlanAction,
    config: Value,
    prior: Option<InstanceState>,
    data: ResourceData,
}

impl Plan {
    /// Attribute values the apply will work with, defaults included.
    pub fn planned_attributes(&self) -> &Value {
        self.data.attributes()
    }
}

/// A failed apply, with the state to record for the instance.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct ApplyError {
    #[source]
    pub source: ProviderError,
    /// `None` when nothing exists remotely for the instance
    pub state: Option<InstanceState>,
}

impl ApplyError {
    fn new(source: ProviderError, state: Option<InstanceState>) -> Self {
        Self { source, state }
    }
}

impl<C: OktaApi> Provider<C> {
    /// Plan a change to one instance. No remote call is made.
    ///
    /// Fails when the configuration does not satisfy the resource schema or
    /// the resource's own cross-field checks.
    pub fn plan(
        &self,
        resource_type: &str,
        config: Value,
        prior: Option<&InstanceState>,
    ) -> ProviderResult<Plan> {
        let handler = self.get_handler(resource_type)?;
        let schema = handler.schema();

        schema.validate(&config)?;
        let mut config = config;
        schema.apply_defaults(&mut config);

        let mut data = ResourceData::new(config.clone(), prior);
        carry_computed(&schema, &mut data);
        handler.customize_diff(&data)?;

        let action = match prior {
            None => PlanAction::Create,
            Some(_) => {
                let changed: Vec<_> = schema
                    .configurable_attributes()
                    .filter(|attr| data.has_change(&attr.name))
                    .collect();
                if changed.is_empty() {
                    PlanAction::NoOp
                } else if changed.iter().any(|attr| attr.force_new)
                    || !handler.operations().contains(&ResourceOperation::Update)
                {
                    PlanAction::Replace
                } else {
                    PlanAction::Update
                }
            }
        };

        debug!("Planned {:?} for {}", action, resource_type);
        Ok(Plan {
            resource_type: resource_type.to_string(),
            action,
            config,
            prior: prior.cloned(),
            data,
        })
    }

    /// Execute a plan and return the state to record (`None` when the
    /// instance no longer exists).
    pub async fn apply(&self, plan: Plan) -> Result<Option<InstanceState>, ApplyError> {
        let handler = self
            .get_handler(&plan.resource_type)
            .map_err(|e| ApplyError::new(e, plan.prior.clone()))?;
        let client = self.client.as_ref();

        match plan.action {
            PlanAction::NoOp => {
                info!("{} {} is up to date", plan.resource_type, plan.data.id().unwrap_or_default());
                Ok(plan.data.into_state())
            }
            PlanAction::Create => {
                self.run_create(handler.as_ref(), plan.data).await
            }
            PlanAction::Update => {
                self.ensure_operation_supported(handler.as_ref(), ResourceOperation::Update)
                    .map_err(|e| ApplyError::new(e, plan.prior.clone()))?;
                let mut data = plan.data;
                match handler.update(client, &mut data).await {
                    Ok(()) => Ok(data.into_state()),
                    Err(e) => Err(ApplyError::new(e, data.into_failed_state())),
                }
            }
            PlanAction::Replace => {
                let Some(prior) = plan.prior else {
                    return Err(ApplyError::new(
                        ProviderError::internal("replacement planned without prior state"),
                        None,
                    ));
                };
                info!("Replacing {} {}", plan.resource_type, prior.id);
                let mut old = ResourceData::from_state(&prior);
                if let Err(e) = handler.delete(client, &mut old).await {
                    return Err(ApplyError::new(e, Some(prior)));
                }
                self.run_create(handler.as_ref(), ResourceData::new(plan.config, None))
                    .await
            }
        }
    }

    /// Plan and apply in one step.
    pub async fn plan_and_apply(
        &self,
        resource_type: &str,
        config: Value,
        prior: Option<&InstanceState>,
    ) -> Result<Option<InstanceState>, ApplyError> {
        let plan = self
            .plan(resource_type, config, prior)
            .map_err(|e| ApplyError::new(e, prior.cloned()))?;
        self.apply(plan).await
    }

    /// Re-read an instance from the remote API.
    ///
    /// Returns `None` when the remote object is gone and the instance should be
    /// dropped from state.
    pub async fn refresh(
        &self,
        resource_type: &str,
        state: &InstanceState,
    ) -> ProviderResult<Option<InstanceState>> {
        let handler = self.get_handler(resource_type)?;
        let client = self.client.as_ref();
        let mut data = ResourceData::from_state(state);

        if !handler.exists(client, &data).await? {
            warn!(
                "{} {} no longer exists in Okta, removing from state",
                resource_type, state.id
            );
            return Ok(None);
        }

        handler.read(client, &mut data).await?;
        let refreshed = data.into_state();
        if refreshed.is_none() {
            warn!("{} {} removed from state", resource_type, state.id);
        }
        Ok(refreshed)
    }

    /// Delete the remote object behind an instance.
    pub async fn destroy(&self, resource_type: &str, state: &InstanceState) -> ProviderResult<()> {
        let handler = self.get_handler(resource_type)?;
        self.ensure_operation_supported(handler.as_ref(), ResourceOperation::Delete)?;
        let mut data = ResourceData::from_state(state);
        handler.delete(self.client.as_ref(), &mut data).await
    }

    /// Adopt an existing remote object by import identifier.
    pub async fn import(&self, resource_type: &str, id: &str) -> ProviderResult<InstanceState> {
        let handler = self.get_handler(resource_type)?;
        self.ensure_operation_supported(handler.as_ref(), ResourceOperation::Import)?;
        let client = self.client.as_ref();

        let mut data = handler.import(client, id).await?;
        handler.read(client, &mut data).await?;
        data.into_state()
            .ok_or_else(|| ProviderError::not_found(resource_type, id))
    }

    /// Resolve a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> ProviderResult<InstanceState> {
        let handler = self.get_data_source(data_source_type)?;
        let schema = handler.schema();
        schema.validate(&config)?;
        let mut config = config;
        schema.apply_defaults(&mut config);

        let mut data = ResourceData::new(config, None);
        handler.read(self.client.as_ref(), &mut data).await?;
        data.into_state().ok_or_else(|| {
            ProviderError::internal(format!("{} did not resolve an ID", data_source_type))
        })
    }

    async fn run_create(
        &self,
        handler: &dyn ResourceHandler<C>,
        mut data: ResourceData,
    ) -> Result<Option<InstanceState>, ApplyError> {
        self.ensure_operation_supported(handler, ResourceOperation::Create)
            .map_err(|e| ApplyError::new(e, None))?;
        match handler.create(self.client.as_ref(), &mut data).await {
            Ok(()) => Ok(data.into_state()),
            Err(e) => Err(ApplyError::new(e, data.into_failed_state())),
        }
    }
}

/// Keep recorded values of computed attributes the configuration leaves out.
fn carry_computed(schema: &ResourceSchema, data: &mut ResourceData) {
    let carried: Vec<(String, Value)> = schema
        .attributes
        .iter()
        .filter(|attr| attr.computed && data.get(&attr.name).is_none())
        .filter_map(|attr| {
            let (old, _) = data.get_change(&attr.name);
            old.map(|value| (attr.name.clone(), value))
        })
        .collect();
    for (name, value) in carried {
        data.set(&name, value);
    }
}
