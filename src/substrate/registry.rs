//! Name → instance resolution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use url::Url;

use crate::config::{ConfigError, RouterConfig};
use crate::config::validation::ValidationError;
use crate::error::RouterError;
use crate::substrate::{Activity, BackendName, HttpInstance, Instance, InstanceEvent};

const EVENT_CAPACITY: usize = 64;

/// Registered backends and bindings, keyed by logical name.
///
/// Built once at startup and immutable afterwards.
#[derive(Debug)]
pub struct BackendRegistry {
    instances: HashMap<BackendName, Arc<dyn Instance>>,
    events: broadcast::Sender<InstanceEvent>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            instances: HashMap::new(),
            events,
        }
    }

    /// Build HTTP instances for every enabled backend and the service binding.
    ///
    /// A binding named like a backend is refused rather than replacing it.
    pub fn from_config(config: &RouterConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::new();

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        let timeout = Duration::from_secs(config.timeouts.request_secs);

        let mut endpoints = Vec::new();
        if config.api.enabled {
            endpoints.push((BackendName::API, "api.address", &config.api.instance_name, &config.api.address));
        }
        if config.web.enabled {
            endpoints.push((BackendName::WEB, "web.address", &config.web.instance_name, &config.web.address));
        }
        if let Some(binding) = &config.service_binding {
            endpoints.push((
                BackendName::new(binding.name.clone()),
                "service_binding.address",
                &binding.name,
                &binding.address,
            ));
        }

        for (name, field, instance_name, address) in endpoints {
            if registry.instances.contains_key(&name) {
                return Err(ConfigError::Validation(vec![ValidationError::ReservedBindingName(
                    name.to_string(),
                )]));
            }

            let invalid = |reason: String| {
                ConfigError::Validation(vec![ValidationError::InvalidBackendUrl {
                    field,
                    value: address.clone(),
                    reason,
                }])
            };

            let url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
            let activity = Activity::new(name.clone(), registry.events.clone());
            let instance = HttpInstance::new(
                name.clone(),
                instance_name,
                &url,
                client.clone(),
                timeout,
                activity,
            )
            .map_err(|e| invalid(e.to_string()))?;

            tracing::info!(backend = %name, address = %url, instance_id = instance.id(), "Backend registered");
            registry.register(name, Arc::new(instance));
        }

        Ok(registry)
    }

    /// Register (or replace) the instance behind `name`.
    pub fn register(&mut self, name: BackendName, instance: Arc<dyn Instance>) {
        self.instances.insert(name, instance);
    }

    /// Look up the instance behind `name`. Never touches the network.
    pub fn resolve(&self, name: &BackendName) -> Result<Arc<dyn Instance>, RouterError> {
        self.instances
            .get(name)
            .cloned()
            .ok_or_else(|| RouterError::binding_missing(name.as_str()))
    }

    pub fn instances(&self) -> impl Iterator<Item = (&BackendName, &Arc<dyn Instance>)> {
        self.instances.iter()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InstanceEvent> {
        self.events.subscribe()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
