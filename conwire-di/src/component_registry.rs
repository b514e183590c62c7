//! Functionality related to registering definitions of components. Definitions come from
//! [ComponentConfiguration]s - groups of [ComponentDeclaration]s, which can be registered
//! conditionally, depending on what is already present in the registry hierarchy.
//!
//! ## Assembling a registry
//!
//! Configurations are processed in order of descending priority, and in submission order for
//! equal priorities. Conditions are evaluated against the definitions registered so far, so
//! changing the order of configurations can change which components end up registered:
//!
//! ```
//! use conwire_di::component::{ComponentDeclaration, TypeDescriptor};
//! use conwire_di::component_registry::conditional::on_component::{
//!     OnMissingComponent, RegistrationCondition,
//! };
//! use conwire_di::component_registry::{
//!     ComponentConfiguration, ComponentDefinitionRegistry, ComponentDefinitionRegistryBuilder,
//!     ComponentRegistration,
//! };
//!
//! let text = TypeDescriptor::of::<String>();
//!
//! let foo = ComponentConfiguration::new(ComponentDeclaration::new(
//!     "fooConfiguration",
//!     TypeDescriptor::new("FooConfiguration"),
//! ))
//! .with_unconditional_component(ComponentDeclaration::new("foo", text.clone()));
//!
//! let bar = ComponentConfiguration::new(ComponentDeclaration::new(
//!     "barConfiguration",
//!     TypeDescriptor::new("BarConfiguration"),
//! ))
//! .with_condition(OnMissingComponent(RegistrationCondition::new().with_name("foo")).into_condition())
//! .with_unconditional_component(ComponentDeclaration::new("bar", text));
//!
//! let registry = ComponentDefinitionRegistryBuilder::new()
//!     .with_configuration(foo.clone())
//!     .with_configuration(bar.clone())
//!     .build()
//!     .unwrap();
//! assert!(!registry.is_name_registered("bar"));
//!
//! let registry = ComponentDefinitionRegistryBuilder::new()
//!     .with_configuration(bar)
//!     .with_configuration(foo)
//!     .build()
//!     .unwrap();
//! assert!(registry.is_name_registered("bar"));
//! ```
//!
//! ## Registry hierarchies
//!
//! A registry can have a parent, which conditions can search depending on their
//! [SearchStrategy](conditional::on_component::SearchStrategy). Parents are shared via
//! [ComponentDefinitionRegistryFacadePtr].

pub mod conditional;

use crate::component::{Annotation, ComponentDeclaration, TypeDescriptor};
use crate::component_registry::conditional::{
    ComponentDefinitionRegistryFacade, ComponentDefinitionRegistryFacadePtr,
    ConditionEvaluationReport, ConditionMetadata, ConditionPtr, ContextFactory,
    SimpleContextFactory,
};
use crate::component_registry::internal::ConfigurationRegisterer;
use crate::component_registry::registry::NamedComponentDefinitionMap;
use crate::error::ComponentDefinitionRegistryError;
use derivative::Derivative;
use itertools::Itertools;
use std::cmp::Reverse;
#[cfg(not(feature = "threadsafe"))]
use std::rc::Rc;
#[cfg(feature = "threadsafe")]
use std::sync::Arc;
use tracing::debug;

#[cfg(not(feature = "threadsafe"))]
pub type SharedPtr<T> = Rc<T>;
#[cfg(feature = "threadsafe")]
pub type SharedPtr<T> = Arc<T>;

/// Definition of a component registered in a definition registry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComponentDefinition {
    pub declaration: ComponentDeclaration,

    /// Name of the configuration which contained the declaration, if any.
    pub source: Option<String>,
}

/// A [ComponentDeclaration] guarded by conditions, which all need to pass for it to be
/// registered.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ComponentRegistration {
    pub declaration: ComponentDeclaration,

    #[derivative(Debug = "ignore")]
    pub conditions: Vec<ConditionPtr>,
}

impl ComponentRegistration {
    pub fn new(declaration: ComponentDeclaration) -> Self {
        Self {
            declaration,
            conditions: vec![],
        }
    }

    pub fn with_condition(mut self, condition: ConditionPtr) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// A configuration source - a group of component registrations declared together. The
/// configuration itself is registered as a component, before the components it contains.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ComponentConfiguration {
    pub declaration: ComponentDeclaration,

    /// Conditions guarding the configuration and all its components.
    #[derivative(Debug = "ignore")]
    pub conditions: Vec<ConditionPtr>,

    /// Configurations with higher priority are processed first.
    pub priority: i8,

    pub components: Vec<ComponentRegistration>,
}

impl ComponentConfiguration {
    pub fn new(declaration: ComponentDeclaration) -> Self {
        Self {
            declaration,
            conditions: vec![],
            priority: 0,
            components: vec![],
        }
    }

    pub fn with_condition(mut self, condition: ConditionPtr) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_component(mut self, registration: ComponentRegistration) -> Self {
        self.components.push(registration);
        self
    }

    pub fn with_unconditional_component(self, declaration: ComponentDeclaration) -> Self {
        self.with_component(ComponentRegistration::new(declaration))
    }
}

/// A registry of component definitions.
pub trait ComponentDefinitionRegistry {
    /// Adds a new definition unconditionally. Duplicate names are rejected, unless definition
    /// overriding is allowed.
    fn register_component(
        &mut self,
        declaration: ComponentDeclaration,
    ) -> Result<(), ComponentDefinitionRegistryError>;

    /// Returns a definition with given name. A name prefixed with `&` only refers to factories.
    fn component_by_name(&self, name: &str) -> Option<ComponentDefinition>;

    /// Returns all definitions providing instances of a given type, or being factories of a given
    /// type.
    fn components_by_type(&self, target: &TypeDescriptor) -> Vec<ComponentDefinition>;

    /// Checks if there's a definition with given name.
    fn is_name_registered(&self, name: &str) -> bool;

    /// Returns a copy of all definitions, in registration order.
    fn all_definitions(&self) -> Vec<ComponentDefinition>;
}

/// Registry assembled from [ComponentConfiguration]s by a [ComponentDefinitionRegistryBuilder].
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct DefaultComponentDefinitionRegistry {
    definition_map: NamedComponentDefinitionMap,
    allow_definition_overriding: bool,
    #[derivative(Debug = "ignore")]
    parent: Option<ComponentDefinitionRegistryFacadePtr>,
    report: ConditionEvaluationReport,
}

impl DefaultComponentDefinitionRegistry {
    /// Creates an empty registry.
    pub fn new(
        allow_definition_overriding: bool,
        parent: Option<ComponentDefinitionRegistryFacadePtr>,
    ) -> Self {
        Self {
            definition_map: Default::default(),
            allow_definition_overriding,
            parent,
            report: Default::default(),
        }
    }

    /// Returns outcomes of all conditions evaluated while assembling this registry.
    #[inline]
    pub fn condition_evaluation_report(&self) -> &ConditionEvaluationReport {
        &self.report
    }

    /// Evaluates configuration conditions and registers the configuration along with its
    /// components, if they pass.
    pub fn register_configuration<CF: ContextFactory>(
        &mut self,
        configuration: ComponentConfiguration,
        context_factory: &CF,
    ) -> Result<(), ComponentDefinitionRegistryError> {
        let ComponentConfiguration {
            declaration,
            conditions,
            components,
            ..
        } = configuration;

        if !self.evaluate_conditions(
            &conditions,
            ConditionMetadata::Configuration(&declaration),
            context_factory,
        ) {
            debug!(
                configuration = declaration.name.as_str(),
                "Skipping configuration with failed conditions."
            );
            return Ok(());
        }

        let source = declaration.name.clone();
        self.definition_map.try_register_component(
            ComponentDefinition {
                declaration,
                source: None,
            },
            self.allow_definition_overriding,
        )?;

        for ComponentRegistration {
            declaration,
            conditions,
        } in components
        {
            if self.evaluate_conditions(
                &conditions,
                ConditionMetadata::Component(&declaration),
                context_factory,
            ) {
                debug!(
                    component = declaration.name.as_str(),
                    configuration = source.as_str(),
                    "Registering component."
                );

                self.definition_map.try_register_component(
                    ComponentDefinition {
                        declaration,
                        source: Some(source.clone()),
                    },
                    self.allow_definition_overriding,
                )?;
            } else {
                debug!(
                    component = declaration.name.as_str(),
                    configuration = source.as_str(),
                    "Skipping component with failed conditions."
                );
            }
        }

        Ok(())
    }

    // stops at the first failed condition
    fn evaluate_conditions<CF: ContextFactory>(
        &mut self,
        conditions: &[ConditionPtr],
        metadata: ConditionMetadata,
        context_factory: &CF,
    ) -> bool {
        for condition in conditions {
            let outcome = condition.evaluate(
                context_factory.create_context(&*self).as_ref(),
                metadata,
            );
            let is_match = outcome.is_match;

            self.report
                .record_outcome(&metadata.declaration().name, condition.name(), outcome);

            if !is_match {
                return false;
            }
        }

        true
    }
}

impl ComponentDefinitionRegistry for DefaultComponentDefinitionRegistry {
    #[inline]
    fn register_component(
        &mut self,
        declaration: ComponentDeclaration,
    ) -> Result<(), ComponentDefinitionRegistryError> {
        self.definition_map.try_register_component(
            ComponentDefinition {
                declaration,
                source: None,
            },
            self.allow_definition_overriding,
        )
    }

    #[inline]
    fn component_by_name(&self, name: &str) -> Option<ComponentDefinition> {
        self.definition_map.component_by_name(name).cloned()
    }

    #[inline]
    fn components_by_type(&self, target: &TypeDescriptor) -> Vec<ComponentDefinition> {
        self.definition_map.components_by_type(target)
    }

    #[inline]
    fn is_name_registered(&self, name: &str) -> bool {
        self.definition_map.is_name_registered(name)
    }

    #[inline]
    fn all_definitions(&self) -> Vec<ComponentDefinition> {
        self.definition_map.definitions().to_vec()
    }
}

impl ComponentDefinitionRegistryFacade for DefaultComponentDefinitionRegistry {
    #[inline]
    fn is_name_registered(&self, name: &str) -> bool {
        self.definition_map.is_name_registered(name)
    }

    #[inline]
    fn names_for_type(
        &self,
        target: &TypeDescriptor,
        include_non_singletons: bool,
    ) -> Vec<String> {
        self.definition_map
            .names_for_type(target, include_non_singletons)
    }

    #[inline]
    fn names_for_annotation(&self, annotation: &Annotation) -> Vec<String> {
        self.definition_map.names_for_annotation(annotation)
    }

    fn is_autowire_candidate(&self, name: &str) -> bool {
        self.definition_map
            .component_by_name(name)
            .map(|definition| definition.declaration.is_autowire_candidate)
            .unwrap_or(true)
    }

    fn is_default_candidate(&self, name: &str) -> bool {
        self.definition_map
            .component_by_name(name)
            .map(|definition| definition.declaration.is_default_candidate)
            .unwrap_or(true)
    }

    fn annotations_on(&self, name: &str) -> Vec<Annotation> {
        self.definition_map.annotations_on(name)
    }

    #[inline]
    fn parent(&self) -> Option<ComponentDefinitionRegistryFacadePtr> {
        self.parent.clone()
    }
}

/// Builder running the assembly pass for a [DefaultComponentDefinitionRegistry].
pub struct ComponentDefinitionRegistryBuilder<CF: ContextFactory = SimpleContextFactory> {
    configurations: Vec<ComponentConfiguration>,
    allow_definition_overriding: bool,
    parent: Option<ComponentDefinitionRegistryFacadePtr>,
    context_factory: CF,
}

impl ComponentDefinitionRegistryBuilder {
    /// Creates a new builder with a default configuration: no parent and no definition
    /// overriding.
    pub fn new() -> Self {
        Self {
            configurations: vec![],
            allow_definition_overriding: false,
            parent: None,
            context_factory: SimpleContextFactory,
        }
    }
}

impl Default for ComponentDefinitionRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<CF: ContextFactory> ComponentDefinitionRegistryBuilder<CF> {
    /// Sets a new [ContextFactory] for condition evaluation.
    pub fn with_context_factory<NCF: ContextFactory>(
        self,
        context_factory: NCF,
    ) -> ComponentDefinitionRegistryBuilder<NCF> {
        ComponentDefinitionRegistryBuilder {
            configurations: self.configurations,
            allow_definition_overriding: self.allow_definition_overriding,
            parent: self.parent,
            context_factory,
        }
    }

    pub fn with_parent(mut self, parent: ComponentDefinitionRegistryFacadePtr) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_allow_definition_overriding(mut self, allow_definition_overriding: bool) -> Self {
        self.allow_definition_overriding = allow_definition_overriding;
        self
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

    /// Adds all configurations submitted statically via [internal::submit]. Their relative order
    /// is unspecified, so priorities should be used to order them when conditions depend on each
    /// other.
    pub fn with_static_configurations(mut self) -> Self {
        self.configurations.extend(
            inventory::iter::<ConfigurationRegisterer>
                .into_iter()
                .map(|registerer| (registerer.register)()),
        );
        self
    }

    /// Runs the assembly pass.
    pub fn build(
        self,
    ) -> Result<DefaultComponentDefinitionRegistry, ComponentDefinitionRegistryError> {
        let mut registry =
            DefaultComponentDefinitionRegistry::new(self.allow_definition_overriding, self.parent);

        for configuration in self
            .configurations
            .into_iter()
            .sorted_by_key(|configuration| Reverse(configuration.priority))
        {
            registry.register_configuration(configuration, &self.context_factory)?;
        }

        Ok(registry)
    }
}

mod registry {
    use crate::component::{Annotation, TypeDescriptor, FACTORY_PREFIX};
    use crate::component_registry::ComponentDefinition;
    use crate::error::ComponentDefinitionRegistryError;
    use fxhash::FxHashMap;

    #[derive(Default, Clone, Debug)]
    pub(super) struct NamedComponentDefinitionMap {
        definitions: Vec<ComponentDefinition>,
        names: FxHashMap<String, usize>,
    }

    impl NamedComponentDefinitionMap {
        pub(super) fn component_by_name(&self, name: &str) -> Option<&ComponentDefinition> {
            let (name, factory_only) = match name.strip_prefix(FACTORY_PREFIX) {
                Some(name) => (name, true),
                None => (name, false),
            };

            self.names
                .get(name)
                .and_then(|index| self.definitions.get(*index))
                .filter(|definition| !factory_only || definition.declaration.is_factory())
        }

        pub(super) fn components_by_type(
            &self,
            target: &TypeDescriptor,
        ) -> Vec<ComponentDefinition> {
            self.definitions
                .iter()
                .filter(|definition| {
                    let declaration = &definition.declaration;
                    declaration
                        .produced_type()
                        .map(|produced_type| produced_type.is_assignable_to(target))
                        .unwrap_or(false)
                        || (declaration.is_factory()
                            && declaration
                                .declared_type
                                .as_ref()
                                .map(|declared_type| declared_type.is_assignable_to(target))
                                .unwrap_or(false))
                })
                .cloned()
                .collect()
        }

        pub(super) fn names_for_type(
            &self,
            target: &TypeDescriptor,
            include_non_singletons: bool,
        ) -> Vec<String> {
            self.definitions
                .iter()
                .filter(|definition| {
                    include_non_singletons || definition.declaration.is_singleton()
                })
                .flat_map(|definition| {
                    let declaration = &definition.declaration;

                    let product = declaration
                        .produced_type()
                        .filter(|produced_type| produced_type.is_assignable_to(target))
                        .map(|_| declaration.name.clone());

                    let factory = declaration
                        .declared_type
                        .as_ref()
                        .filter(|declared_type| {
                            declared_type.is_factory() && declared_type.is_assignable_to(target)
                        })
                        .map(|_| format!("{FACTORY_PREFIX}{}", declaration.name));

                    product.into_iter().chain(factory)
                })
                .collect()
        }

        pub(super) fn names_for_annotation(&self, annotation: &Annotation) -> Vec<String> {
            self.definitions
                .iter()
                .filter(|definition| {
                    definition
                        .declaration
                        .all_annotations()
                        .contains(annotation)
                })
                .map(|definition| definition.declaration.name.clone())
                .collect()
        }

        pub(super) fn annotations_on(&self, name: &str) -> Vec<Annotation> {
            match self.component_by_name(name) {
                Some(definition) if name.starts_with(FACTORY_PREFIX) => definition
                    .declaration
                    .declared_type
                    .as_ref()
                    .map(|declared_type| declared_type.annotations().to_vec())
                    .unwrap_or_default(),
                Some(definition) => definition.declaration.all_annotations(),
                None => vec![],
            }
        }

        pub(super) fn try_register_component(
            &mut self,
            definition: ComponentDefinition,
            allow_definition_overriding: bool,
        ) -> Result<(), ComponentDefinitionRegistryError> {
            let name = &definition.declaration.name;
            if name.is_empty() || name.starts_with(FACTORY_PREFIX) {
                return Err(ComponentDefinitionRegistryError::InvalidComponentName(
                    name.clone(),
                ));
            }

            if let Some(index) = self.names.get(name) {
                if !allow_definition_overriding {
                    return Err(ComponentDefinitionRegistryError::DuplicateComponentName(
                        name.clone(),
                    ));
                }

                self.definitions[*index] = definition;
            } else {
                self.names.insert(name.clone(), self.definitions.len());
                self.definitions.push(definition);
            }

            Ok(())
        }

        #[inline]
        pub(super) fn is_name_registered(&self, name: &str) -> bool {
            self.component_by_name(name).is_some()
        }

        #[inline]
        pub(super) fn definitions(&self) -> &[ComponentDefinition] {
            &self.definitions
        }
    }

    #[cfg(test)]
    mod tests {
        use crate::component::{Annotation, ComponentDeclaration, TypeDescriptor, PROTOTYPE};
        use crate::component_registry::registry::NamedComponentDefinitionMap;
        use crate::component_registry::ComponentDefinition;
        use crate::error::ComponentDefinitionRegistryError;

        fn example_bean() -> TypeDescriptor {
            TypeDescriptor::new("ExampleBean").annotated_with(Annotation::new("TestAnnotation"))
        }

        fn create_definition(declaration: ComponentDeclaration) -> ComponentDefinition {
            ComponentDefinition {
                declaration,
                source: None,
            }
        }

        #[test]
        fn should_register_definition() {
            let definition =
                create_definition(ComponentDeclaration::new("name", example_bean()));

            let mut registry = NamedComponentDefinitionMap::default();
            registry
                .try_register_component(definition.clone(), false)
                .unwrap();

            assert_eq!(registry.component_by_name("name"), Some(&definition));
            assert_eq!(registry.components_by_type(&example_bean()), vec![definition]);
            assert!(registry.is_name_registered("name"));
            assert!(!registry.is_name_registered("&name"));
        }

        #[test]
        fn should_not_register_duplicate_name() {
            let definition =
                create_definition(ComponentDeclaration::new("name", example_bean()));

            let mut registry = NamedComponentDefinitionMap::default();
            registry
                .try_register_component(definition.clone(), false)
                .unwrap();

            assert_eq!(
                registry
                    .try_register_component(definition, false)
                    .unwrap_err(),
                ComponentDefinitionRegistryError::DuplicateComponentName("name".to_string())
            );
        }

        #[test]
        fn should_override_duplicate_name() {
            let mut registry = NamedComponentDefinitionMap::default();
            registry
                .try_register_component(
                    create_definition(ComponentDeclaration::new("name", example_bean())),
                    true,
                )
                .unwrap();
            registry
                .try_register_component(
                    create_definition(ComponentDeclaration::new(
                        "name",
                        TypeDescriptor::new("Other"),
                    )),
                    true,
                )
                .unwrap();

            assert_eq!(registry.definitions().len(), 1);
            assert!(registry.names_for_type(&example_bean(), true).is_empty());
        }

        #[test]
        fn should_reject_invalid_names() {
            let mut registry = NamedComponentDefinitionMap::default();

            assert!(matches!(
                registry
                    .try_register_component(
                        create_definition(ComponentDeclaration::untyped("")),
                        false
                    )
                    .unwrap_err(),
                ComponentDefinitionRegistryError::InvalidComponentName(..)
            ));
            assert!(matches!(
                registry
                    .try_register_component(
                        create_definition(ComponentDeclaration::untyped("&factory")),
                        false
                    )
                    .unwrap_err(),
                ComponentDefinitionRegistryError::InvalidComponentName(..)
            ));
        }

        #[test]
        fn should_expose_factories_under_both_names() {
            let factory_type = TypeDescriptor::new("ExampleFactoryBean")
                .implementing("FactoryBean")
                .into_factory(Some(example_bean()));

            let mut registry = NamedComponentDefinitionMap::default();
            registry
                .try_register_component(
                    create_definition(ComponentDeclaration::new("factory", factory_type.clone())),
                    false,
                )
                .unwrap();

            assert_eq!(
                registry.names_for_type(&example_bean(), true),
                vec!["factory".to_string()]
            );
            assert_eq!(
                registry.names_for_type(&factory_type, true),
                vec!["&factory".to_string()]
            );
            assert_eq!(
                registry.names_for_type(&TypeDescriptor::new("FactoryBean"), true),
                vec!["&factory".to_string()]
            );
            assert!(registry.is_name_registered("&factory"));
            assert_eq!(
                registry.names_for_annotation(&Annotation::new("TestAnnotation")),
                vec!["factory".to_string()]
            );
            assert_eq!(
                registry.annotations_on("factory"),
                vec![Annotation::new("TestAnnotation")]
            );
            assert!(registry.annotations_on("&factory").is_empty());
        }

        #[test]
        fn should_filter_non_singletons() {
            let mut registry = NamedComponentDefinitionMap::default();
            registry
                .try_register_component(
                    create_definition(
                        ComponentDeclaration::new("prototype", example_bean())
                            .with_scope(PROTOTYPE),
                    ),
                    false,
                )
                .unwrap();

            assert!(registry.names_for_type(&example_bean(), false).is_empty());
            assert_eq!(
                registry.names_for_type(&example_bean(), true),
                vec!["prototype".to_string()]
            );
        }
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::component_registry::ComponentConfiguration;
    use inventory::collect;
    pub use inventory::submit;

    pub struct ConfigurationRegisterer {
        pub register: fn() -> ComponentConfiguration,
    }

    collect!(ConfigurationRegisterer);
}
