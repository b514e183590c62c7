//! Core application framework functionality.

use crate::config::ApplicationConfig;
use config::ConfigError;
use conwire_di::component::TypeDescriptor;
use conwire_di::component_registry::conditional::{
    ComponentDefinitionRegistryFacade, ComponentDefinitionRegistryFacadePtr,
    ConditionEvaluationReport,
};
use conwire_di::component_registry::{
    ComponentConfiguration, ComponentDefinition, ComponentDefinitionRegistry,
    ComponentDefinitionRegistryBuilder, DefaultComponentDefinitionRegistry, SharedPtr,
};
use conwire_di::error::ComponentDefinitionRegistryError;
use derive_more::Constructor;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Error loading configuration: {0}")]
    ConfigError(ConfigError),
    #[error("Error assembling component registry: {0}")]
    RegistryError(ComponentDefinitionRegistryError),
}

/// Assembled component registry, optionally being a child of another context.
#[derive(Clone, Constructor)]
pub struct ApplicationContext {
    registry: SharedPtr<DefaultComponentDefinitionRegistry>,
}

impl ApplicationContext {
    #[inline]
    pub fn registry(&self) -> &DefaultComponentDefinitionRegistry {
        &self.registry
    }

    /// Checks if a component with given name is registered in this context, ignoring ancestors.
    #[inline]
    pub fn contains_local_component(&self, name: &str) -> bool {
        ComponentDefinitionRegistry::is_name_registered(&*self.registry, name)
    }

    /// Checks if a component with given name is registered in this context or any ancestor.
    pub fn contains_component(&self, name: &str) -> bool {
        if self.contains_local_component(name) {
            return true;
        }

        let mut next = self.registry.parent();
        while let Some(parent) = next {
            if parent.is_name_registered(name) {
                return true;
            }

            next = parent.parent();
        }

        false
    }

    /// Returns names of local components assignable to given type, including factories referred
    /// to with the `&` prefix.
    #[inline]
    pub fn component_names_for_type(&self, target: &TypeDescriptor) -> Vec<String> {
        self.registry.names_for_type(target, true)
    }

    #[inline]
    pub fn component_by_name(&self, name: &str) -> Option<ComponentDefinition> {
        self.registry.component_by_name(name)
    }

    #[inline]
    pub fn condition_evaluation_report(&self) -> &ConditionEvaluationReport {
        self.registry.condition_evaluation_report()
    }

    /// Returns a handle to the registry of this context, usable as a parent of other registries.
    pub fn as_parent(&self) -> ComponentDefinitionRegistryFacadePtr {
        self.registry.clone() as ComponentDefinitionRegistryFacadePtr
    }
}

/// Main entrypoint for the application. Bootstraps the application and assembles an
/// [ApplicationContext] from given configurations.
pub struct Application {
    config: ApplicationConfig,
    configurations: Vec<ComponentConfiguration>,
    include_static_configurations: bool,
    parent: Option<ComponentDefinitionRegistryFacadePtr>,
}

impl Application {
    pub fn new(config: ApplicationConfig) -> Self {
        Self {
            config,
            configurations: vec![],
            include_static_configurations: false,
            parent: None,
        }
    }

    /// Creates an application configured from the environment.
    pub fn from_environment() -> Result<Self, ApplicationError> {
        ApplicationConfig::init_from_environment()
            .map(Self::new)
            .map_err(ApplicationError::ConfigError)
    }

    pub fn with_configuration(mut self, configuration: ComponentConfiguration) -> Self {
        self.configurations.push(configuration);
        self
    }

    pub fn with_configurations<I: IntoIterator<Item = ComponentConfiguration>>(
        mut self,
        configurations: I,
    ) -> Self {
        self.configurations.extend(configurations);
        self
    }

    /// Includes configurations submitted statically.
    pub fn with_static_configurations(mut self) -> Self {
        self.include_static_configurations = true;
        self
    }

    pub fn with_parent(mut self, parent: &ApplicationContext) -> Self {
        self.parent = Some(parent.as_parent());
        self
    }

    pub fn run(self) -> Result<ApplicationContext, ApplicationError> {
        if self.config.install_tracing_logger {
            if let Err(error) = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .try_init()
            {
                debug!("Not installing tracing logger: {error}");
            }
        }

        info!("Assembling component registry...");

        let mut builder = ComponentDefinitionRegistryBuilder::new()
            .with_allow_definition_overriding(self.config.allow_definition_overriding)
            .with_configurations(self.configurations);

        if self.include_static_configurations {
            builder = builder.with_static_configurations();
        }

        if let Some(parent) = self.parent {
            builder = builder.with_parent(parent);
        }

        let registry = builder.build().map_err(ApplicationError::RegistryError)?;

        if self.config.log_condition_report {
            info!(
                "Condition evaluation report:\n{}",
                registry.condition_evaluation_report()
            );
        }

        Ok(ApplicationContext::new(SharedPtr::new(registry)))
    }
}
