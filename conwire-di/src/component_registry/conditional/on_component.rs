//! Conditions checking for components already present in a registry hierarchy.
//!
//! A [RegistrationCondition] describes which components to look for - by name, type, annotation
//! or generic container element type - and where to look for them. Criteria are combined with a
//! logical OR: the condition finds existing components if any of the criteria finds one. A
//! condition without any criteria looks for components of the type produced by the guarded
//! declaration.
//!
//! ```
//! use conwire_di::component::{ComponentDeclaration, TypeDescriptor};
//! use conwire_di::component_registry::conditional::on_component::{
//!     OnMissingComponent, RegistrationCondition, SearchStrategy,
//! };
//! use conwire_di::component_registry::{
//!     ComponentConfiguration, ComponentDefinitionRegistry, ComponentDefinitionRegistryBuilder,
//!     ComponentRegistration,
//! };
//!
//! let registry = ComponentDefinitionRegistryBuilder::new()
//!     .with_configuration(
//!         ComponentConfiguration::new(ComponentDeclaration::new(
//!             "defaults",
//!             TypeDescriptor::new("Defaults"),
//!         ))
//!         .with_component(
//!             ComponentRegistration::new(ComponentDeclaration::new(
//!                 "defaultClient",
//!                 TypeDescriptor::new("Client"),
//!             ))
//!             // implied type: register only if there's no other Client
//!             .with_condition(
//!                 OnMissingComponent(
//!                     RegistrationCondition::new().with_search_strategy(SearchStrategy::Current),
//!                 )
//!                 .into_condition(),
//!             ),
//!         ),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert!(registry.is_name_registered("defaultClient"));
//! ```

use crate::component::{Annotation, TypeDescriptor, FACTORY_PREFIX};
use crate::component_registry::conditional::{
    ComponentDefinitionRegistryFacade, ComponentDefinitionRegistryFacadePtr, Condition,
    ConditionMetadata, ConditionOutcome, ConditionPtr, Context,
};
use crate::component_registry::SharedPtr;
use fxhash::FxHashSet;
use itertools::Itertools;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::iter;
use tracing::warn;

/// Maximum number of ancestor registries searched.
pub const MAX_HIERARCHY_DEPTH: usize = 64;

/// Which registries in the hierarchy should be searched.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum SearchStrategy {
    /// Search only the registry the declaration is being registered into.
    Current,
    /// Search all ancestors, but not the current registry.
    Ancestors,
    /// Search the entire hierarchy.
    #[default]
    All,
}

impl Display for SearchStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SearchStrategy::Current => "current",
            SearchStrategy::Ancestors => "ancestors",
            SearchStrategy::All => "all",
        })
    }
}

/// Criteria for finding existing components.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegistrationCondition {
    /// Names of components to find.
    pub names: Vec<String>,
    /// Types of components to find.
    pub types: Vec<TypeDescriptor>,
    /// Annotations of components to find.
    pub annotations: Vec<Annotation>,
    /// Types of components which are not counted as found.
    pub ignored_types: Vec<TypeDescriptor>,
    /// Generic container type; when present, searching for type `T` also finds containers of `T`.
    pub parameterized_container: Option<TypeDescriptor>,
    pub search_strategy: SearchStrategy,
}

impl RegistrationCondition {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_name<T: ToString>(mut self, name: T) -> Self {
        self.names.push(name.to_string());
        self
    }

    pub fn with_type(mut self, target: TypeDescriptor) -> Self {
        self.types.push(target);
        self
    }

    pub fn with_type_named<T: Into<Cow<'static, str>>>(self, name: T) -> Self {
        self.with_type(TypeDescriptor::new(name))
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn ignoring_type(mut self, ignored: TypeDescriptor) -> Self {
        self.ignored_types.push(ignored);
        self
    }

    pub fn ignoring_type_named<T: Into<Cow<'static, str>>>(self, name: T) -> Self {
        self.ignoring_type(TypeDescriptor::new(name))
    }

    pub fn with_parameterized_container(mut self, container: TypeDescriptor) -> Self {
        self.parameterized_container = Some(container);
        self
    }

    pub fn with_search_strategy(mut self, search_strategy: SearchStrategy) -> Self {
        self.search_strategy = search_strategy;
        self
    }

    /// Checks if any names, types or annotations were given explicitly.
    #[inline]
    pub fn has_criteria(&self) -> bool {
        !self.names.is_empty() || !self.types.is_empty() || !self.annotations.is_empty()
    }
}

impl Display for RegistrationCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec![];
        if !self.names.is_empty() {
            parts.push(format!("names: {}", self.names.iter().join(", ")));
        }
        if !self.types.is_empty() {
            parts.push(format!("types: {}", self.types.iter().join(", ")));
        }
        if !self.annotations.is_empty() {
            parts.push(format!("annotations: {}", self.annotations.iter().join(", ")));
        }
        if !self.ignored_types.is_empty() {
            parts.push(format!("ignored: {}", self.ignored_types.iter().join(", ")));
        }
        if let Some(container) = &self.parameterized_container {
            parts.push(format!("parameterized container: {container}"));
        }
        parts.push(format!("search: {}", self.search_strategy));

        write!(f, "({})", parts.join("; "))
    }
}

/// Result of searching for components described by a [RegistrationCondition].
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct MatchOutcome {
    /// Were any components found.
    pub matched: bool,
    /// Names of found components, without duplicates.
    pub matched_names: Vec<String>,
    /// Human-readable description of the search and its result.
    pub reason: String,
}

/// Searches for components described by `condition`, in the hierarchy starting at `registry`.
/// Type and annotation matches only consider autowire and default candidates, while name matches
/// consider all components. Components of ignored types are never counted.
pub fn evaluate(
    metadata: ConditionMetadata,
    condition: &RegistrationCondition,
    registry: &dyn ComponentDefinitionRegistryFacade,
) -> MatchOutcome {
    let condition = if condition.has_criteria() {
        Cow::Borrowed(condition)
    } else {
        match deduce_type(metadata, condition.parameterized_container.as_ref()) {
            Some(target) => Cow::Owned(condition.clone().with_type(target)),
            None => {
                return MatchOutcome {
                    matched: false,
                    matched_names: vec![],
                    reason: format!("{condition} unable to deduce component type"),
                }
            }
        }
    };

    let ancestors = if condition.search_strategy == SearchStrategy::Current {
        vec![]
    } else {
        collect_ancestors(registry)
    };

    let levels = match condition.search_strategy {
        SearchStrategy::Current => vec![registry],
        SearchStrategy::Ancestors => ancestors
            .iter()
            .map(|ancestor| &**ancestor as &dyn ComponentDefinitionRegistryFacade)
            .collect(),
        SearchStrategy::All => iter::once(registry)
            .chain(
                ancestors
                    .iter()
                    .map(|ancestor| &**ancestor as &dyn ComponentDefinitionRegistryFacade),
            )
            .collect(),
    };

    let scope = SearchScope { levels };
    let container = condition.parameterized_container.as_ref();

    let ignored: FxHashSet<String> = condition
        .ignored_types
        .iter()
        .flat_map(|ignored| scope.names_for_type(ignored, container))
        .map(|found| found.name)
        .collect();

    let mut matched_names: Vec<String> = vec![];
    let mut findings = vec![];

    for target in &condition.types {
        let names = scope.candidate_names(scope.names_for_type(target, container), &ignored);
        if !names.is_empty() {
            findings.push(format!(
                "found components of type '{target}' {}",
                names.iter().join(", ")
            ));
            merge_names(&mut matched_names, names);
        }
    }

    for annotation in &condition.annotations {
        let names = scope.candidate_names(scope.names_for_annotation(annotation), &ignored);
        if !names.is_empty() {
            findings.push(format!(
                "found components annotated with '{annotation}' {}",
                names.iter().join(", ")
            ));
            merge_names(&mut matched_names, names);
        }
    }

    let names = condition
        .names
        .iter()
        .filter(|name| !ignored.contains(name.as_str()) && scope.contains(name))
        .cloned()
        .collect_vec();
    if !names.is_empty() {
        findings.push(format!(
            "found components named {}",
            names.iter().join(", ")
        ));
        merge_names(&mut matched_names, names);
    }

    let reason = if findings.is_empty() {
        format!("{condition} did not find any components")
    } else {
        format!("{condition} {}", findings.join("; "))
    };

    MatchOutcome {
        matched: !matched_names.is_empty(),
        matched_names,
        reason,
    }
}

/// Condition passing when components described by the [RegistrationCondition] exist.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OnComponent(pub RegistrationCondition);

impl OnComponent {
    pub fn into_condition(self) -> ConditionPtr {
        SharedPtr::new(self) as ConditionPtr
    }
}

impl Condition for OnComponent {
    fn name(&self) -> &'static str {
        "OnComponent"
    }

    fn evaluate(&self, context: &dyn Context, metadata: ConditionMetadata) -> ConditionOutcome {
        let outcome = evaluate(metadata, &self.0, context.registry());
        ConditionOutcome::new(outcome.matched, outcome.reason)
    }
}

/// Condition passing when no components described by the [RegistrationCondition] exist.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OnMissingComponent(pub RegistrationCondition);

impl OnMissingComponent {
    pub fn into_condition(self) -> ConditionPtr {
        SharedPtr::new(self) as ConditionPtr
    }
}

impl Condition for OnMissingComponent {
    fn name(&self) -> &'static str {
        "OnMissingComponent"
    }

    fn evaluate(&self, context: &dyn Context, metadata: ConditionMetadata) -> ConditionOutcome {
        let outcome = evaluate(metadata, &self.0, context.registry());
        ConditionOutcome::new(!outcome.matched, outcome.reason)
    }
}

fn deduce_type(
    metadata: ConditionMetadata,
    container: Option<&TypeDescriptor>,
) -> Option<TypeDescriptor> {
    let produced_type = match metadata {
        ConditionMetadata::Component(declaration) => declaration.produced_type()?,
        ConditionMetadata::Configuration(_) => return None,
    };

    match (container, produced_type.element_type()) {
        (Some(container), Some(element)) if produced_type.is_assignable_to(container) => {
            Some(element.clone())
        }
        _ => Some(produced_type.clone()),
    }
}

fn collect_ancestors(
    registry: &dyn ComponentDefinitionRegistryFacade,
) -> Vec<ComponentDefinitionRegistryFacadePtr> {
    let mut ancestors: Vec<ComponentDefinitionRegistryFacadePtr> = vec![];
    let mut next = registry.parent();

    while let Some(parent) = next {
        if ancestors.len() == MAX_HIERARCHY_DEPTH {
            warn!(
                "Registry hierarchy deeper than {} levels - ignoring remaining ancestors.",
                MAX_HIERARCHY_DEPTH
            );
            break;
        }

        next = parent.parent();
        ancestors.push(parent);
    }

    ancestors
}

fn merge_names(target: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !target.contains(&name) {
            target.push(name);
        }
    }
}

#[inline]
fn local_name(name: &str) -> &str {
    name.strip_prefix(FACTORY_PREFIX).unwrap_or(name)
}

struct FoundName {
    name: String,
    level: usize,
}

struct SearchScope<'a> {
    // ordered from the closest registry
    levels: Vec<&'a dyn ComponentDefinitionRegistryFacade>,
}

impl SearchScope<'_> {
    fn contains(&self, name: &str) -> bool {
        self.levels
            .iter()
            .any(|level| level.is_name_registered(name))
    }

    fn names_for_type(
        &self,
        target: &TypeDescriptor,
        container: Option<&TypeDescriptor>,
    ) -> Vec<FoundName> {
        let mut names = self.collect(|level| level.names_for_type(target, true));

        if let Some(container) = container {
            let target = container.clone().parameterized_with(target.clone());
            for found in self.collect(|level| level.names_for_type(&target, true)) {
                if !names.iter().any(|existing| existing.name == found.name) {
                    names.push(found);
                }
            }
        }

        names
    }

    fn names_for_annotation(&self, annotation: &Annotation) -> Vec<FoundName> {
        self.collect(|level| level.names_for_annotation(annotation))
    }

    fn candidate_names(&self, found: Vec<FoundName>, ignored: &FxHashSet<String>) -> Vec<String> {
        found
            .into_iter()
            .filter(|found| !ignored.contains(&found.name) && self.is_candidate(found))
            .map(|found| found.name)
            .collect()
    }

    fn is_candidate(&self, found: &FoundName) -> bool {
        let level = self.levels[found.level];
        let name = local_name(&found.name);
        level.is_autowire_candidate(name) && level.is_default_candidate(name)
    }

    // names registered closer to the current registry shadow the same names in ancestors
    fn collect<F>(&self, query: F) -> Vec<FoundName>
    where
        F: Fn(&dyn ComponentDefinitionRegistryFacade) -> Vec<String>,
    {
        let mut result: Vec<FoundName> = vec![];

        for (index, level) in self.levels.iter().enumerate() {
            for name in query(*level) {
                let shadowed = self.levels[..index]
                    .iter()
                    .any(|closer| closer.is_name_registered(local_name(&name)));

                if !shadowed && !result.iter().any(|found| found.name == name) {
                    result.push(FoundName { name, level: index });
                }
            }
        }

        result
    }
}
