//! Runners assembling [ApplicationContext]s, mainly for exercising configurations in tests.

use crate::application::{Application, ApplicationContext, ApplicationError};
use crate::config::ApplicationConfig;
use conwire_di::component_registry::ComponentConfiguration;

/// Assembles a fresh [ApplicationContext] from user configurations on each run. Configurations are
/// processed in the order they were added, which matters for conditions checking for existing
/// components.
///
/// ```
/// use conwire::runner::ApplicationContextRunner;
/// use conwire_di::component::{ComponentDeclaration, TypeDescriptor};
/// use conwire_di::component_registry::ComponentConfiguration;
///
/// let parent = ApplicationContextRunner::new()
///     .with_user_configuration(
///         ComponentConfiguration::new(ComponentDeclaration::new(
///             "parentConfiguration",
///             TypeDescriptor::new("ParentConfiguration"),
///         ))
///         .with_unconditional_component(ComponentDeclaration::new(
///             "foo",
///             TypeDescriptor::new("Foo"),
///         )),
///     )
///     .build()
///     .unwrap();
///
/// let found = ApplicationContextRunner::new()
///     .with_parent(parent)
///     .run(|context| context.contains_component("foo") && !context.contains_local_component("foo"))
///     .unwrap();
/// assert!(found);
/// ```
#[derive(Clone)]
pub struct ApplicationContextRunner {
    configurations: Vec<ComponentConfiguration>,
    parent: Option<ApplicationContext>,
    config: ApplicationConfig,
}

impl Default for ApplicationContextRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationContextRunner {
    /// Creates a runner with default config, except for the tracing logger, which is not
    /// installed.
    pub fn new() -> Self {
        Self {
            configurations: vec![],
            parent: None,
            config: ApplicationConfig {
                install_tracing_logger: false,
                ..Default::default()
            },
        }
    }

    pub fn with_user_configuration(mut self, configuration: ComponentConfiguration) -> Self {
        self.configurations.push(configuration);
        self
    }

    pub fn with_parent(mut self, parent: ApplicationContext) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_config(mut self, config: ApplicationConfig) -> Self {
        self.config = config;
        self
    }

    /// Assembles a new context.
    pub fn build(&self) -> Result<ApplicationContext, ApplicationError> {
        let application = Application::new(self.config.clone())
            .with_configurations(self.configurations.iter().cloned());

        match &self.parent {
            Some(parent) => application.with_parent(parent).run(),
            None => application.run(),
        }
    }

    /// Assembles a new context and passes it to `f`.
    pub fn run<R, F: FnOnce(&ApplicationContext) -> R>(&self, f: F) -> Result<R, ApplicationError> {
        self.build().map(|context| f(&context))
    }
}
