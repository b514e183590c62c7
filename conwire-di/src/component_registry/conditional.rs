//! Conditional component definition registration support.
//!
//! Each [ComponentRegistration](super::ComponentRegistration) and
//! [ComponentConfiguration](super::ComponentConfiguration) can be guarded by a list of
//! [Condition]s, which all need to pass for the declaration to be registered. Conditions are
//! evaluated during registry assembly, against the definitions registered so far, which means
//! the order of configurations matters.
//!
//! The most useful conditions are [OnComponent](on_component::OnComponent) and
//! [OnMissingComponent](on_component::OnMissingComponent), which check for components already
//! present in the registry hierarchy. Any function taking a [Context] and [ConditionMetadata] can
//! also be used as a condition:
//!
//! ```
//! use conwire_di::component::{ComponentDeclaration, TypeDescriptor};
//! use conwire_di::component_registry::conditional::{ConditionMetadata, ConditionPtr, Context};
//! use conwire_di::component_registry::{ComponentRegistration, SharedPtr};
//!
//! fn never(_context: &dyn Context, _metadata: ConditionMetadata) -> bool {
//!     false
//! }
//!
//! let registration = ComponentRegistration::new(ComponentDeclaration::new(
//!     "disabled",
//!     TypeDescriptor::new("Disabled"),
//! ))
//! .with_condition(SharedPtr::new(never) as ConditionPtr);
//! ```

pub mod on_component;
mod report;

pub use report::{ConditionAndOutcome, ConditionEvaluationReport};

use crate::component::{Annotation, ComponentDeclaration, TypeDescriptor};
use crate::component_registry::SharedPtr;
#[cfg(test)]
use mockall::automock;

#[cfg(not(feature = "threadsafe"))]
pub type ComponentDefinitionRegistryFacadePtr = SharedPtr<dyn ComponentDefinitionRegistryFacade>;
#[cfg(feature = "threadsafe")]
pub type ComponentDefinitionRegistryFacadePtr =
    SharedPtr<dyn ComponentDefinitionRegistryFacade + Send + Sync>;

#[cfg(not(feature = "threadsafe"))]
pub type ConditionPtr = SharedPtr<dyn Condition>;
#[cfg(feature = "threadsafe")]
pub type ConditionPtr = SharedPtr<dyn Condition + Send + Sync>;

/// A read-only facade of a single level of a
/// [ComponentDefinitionRegistry](super::ComponentDefinitionRegistry) hierarchy, safe to use in
/// registration conditions. Queries only consider the given level - ancestors are reachable via
/// [parent](ComponentDefinitionRegistryFacade::parent).
#[cfg_attr(test, automock)]
pub trait ComponentDefinitionRegistryFacade {
    /// Checks if there's a definition with given name. Factory names prefixed with `&` refer to
    /// the factory definition itself.
    fn is_name_registered(&self, name: &str) -> bool;

    /// Returns names of definitions assignable to given type, in registration order. Factories
    /// are matched on their product type under their name, and on their own type under the name
    /// prefixed with `&`.
    fn names_for_type(&self, target: &TypeDescriptor, include_non_singletons: bool)
        -> Vec<String>;

    /// Returns names of definitions annotated with given annotation, either directly or on their
    /// produced type.
    fn names_for_annotation(&self, annotation: &Annotation) -> Vec<String>;

    /// Can a definition with given name be selected by type. Unknown names are candidates.
    fn is_autowire_candidate(&self, name: &str) -> bool;

    /// Is a definition with given name selected by default. Unknown names are candidates.
    fn is_default_candidate(&self, name: &str) -> bool;

    /// Returns all annotations of a definition with given name.
    fn annotations_on(&self, name: &str) -> Vec<Annotation>;

    /// Returns the parent registry, if any.
    fn parent(&self) -> Option<ComponentDefinitionRegistryFacadePtr>;
}

/// Context information for use by condition implementations.
pub trait Context {
    /// Returns the registry for which the conditional evaluation is taking place.
    fn registry(&self) -> &dyn ComponentDefinitionRegistryFacade;
}

/// Factory for contexts for conditional component registration.
pub trait ContextFactory {
    /// Creates a new context when starting evaluation.
    fn create_context<'a>(
        &self,
        registry: &'a dyn ComponentDefinitionRegistryFacade,
    ) -> Box<dyn Context + 'a>;
}

/// Metadata for the entity which is currently evaluated for registration.
#[derive(Clone, Debug, Copy)]
pub enum ConditionMetadata<'a> {
    Component(&'a ComponentDeclaration),
    /// Declaration of a configuration guarding all of its components.
    Configuration(&'a ComponentDeclaration),
}

impl<'a> ConditionMetadata<'a> {
    #[inline]
    pub fn declaration(&self) -> &'a ComponentDeclaration {
        match self {
            ConditionMetadata::Component(declaration) => declaration,
            ConditionMetadata::Configuration(declaration) => declaration,
        }
    }
}

/// Result of evaluating a [Condition].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ConditionOutcome {
    /// Should the guarded declaration be registered.
    pub is_match: bool,
    /// Human-readable description of the outcome.
    pub message: String,
}

impl ConditionOutcome {
    pub fn new<T: ToString>(is_match: bool, message: T) -> Self {
        Self {
            is_match,
            message: message.to_string(),
        }
    }

    pub fn matched<T: ToString>(message: T) -> Self {
        Self::new(true, message)
    }

    pub fn no_match<T: ToString>(message: T) -> Self {
        Self::new(false, message)
    }
}

/// Registration condition which should pass to let given [ConditionMetadata] be registered.
pub trait Condition {
    /// Name of the condition, used in the [ConditionEvaluationReport].
    fn name(&self) -> &'static str {
        "CustomCondition"
    }

    fn evaluate(&self, context: &dyn Context, metadata: ConditionMetadata) -> ConditionOutcome;
}

impl<F> Condition for F
where
    F: Fn(&dyn Context, ConditionMetadata) -> bool,
{
    fn evaluate(&self, context: &dyn Context, metadata: ConditionMetadata) -> ConditionOutcome {
        if self(context, metadata) {
            ConditionOutcome::matched("custom condition passed")
        } else {
            ConditionOutcome::no_match("custom condition did not pass")
        }
    }
}

struct SimpleContext<'a> {
    registry: &'a dyn ComponentDefinitionRegistryFacade,
}

impl Context for SimpleContext<'_> {
    fn registry(&self) -> &dyn ComponentDefinitionRegistryFacade {
        self.registry
    }
}

/// Factory producing contexts containing only the necessary data and nothing more.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
pub struct SimpleContextFactory;

impl ContextFactory for SimpleContextFactory {
    fn create_context<'a>(
        &self,
        registry: &'a dyn ComponentDefinitionRegistryFacade,
    ) -> Box<dyn Context + 'a> {
        Box::new(SimpleContext { registry })
    }
}

#[cfg(test)]
mod tests {
    use crate::component::{ComponentDeclaration, TypeDescriptor};
    use crate::component_registry::conditional::{
        Condition, ConditionMetadata, Context, ContextFactory,
        MockComponentDefinitionRegistryFacade, SimpleContextFactory,
    };
    use mockall::predicate::*;
    use mockall::Sequence;

    fn requires_foo(context: &dyn Context, _metadata: ConditionMetadata) -> bool {
        context.registry().is_name_registered("foo")
    }

    #[test]
    fn should_evaluate_function_conditions() {
        let mut seq = Sequence::new();

        let mut registry = MockComponentDefinitionRegistryFacade::new();
        registry
            .expect_is_name_registered()
            .with(eq("foo"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(true);
        registry
            .expect_is_name_registered()
            .with(eq("foo"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);

        let declaration = ComponentDeclaration::new("bar", TypeDescriptor::new("Bar"));
        let context = SimpleContextFactory.create_context(&registry);

        let outcome = requires_foo.evaluate(
            context.as_ref(),
            ConditionMetadata::Component(&declaration),
        );
        assert!(outcome.is_match);
        assert_eq!(requires_foo.name(), "CustomCondition");

        let outcome = requires_foo.evaluate(
            context.as_ref(),
            ConditionMetadata::Component(&declaration),
        );
        assert!(!outcome.is_match);
    }

    #[test]
    fn should_expose_guarded_declaration() {
        let declaration = ComponentDeclaration::new("bar", TypeDescriptor::new("Bar"));

        assert_eq!(
            ConditionMetadata::Configuration(&declaration)
                .declaration()
                .name,
            "bar"
        );
    }
}
