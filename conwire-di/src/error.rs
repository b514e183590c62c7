use thiserror::Error;

/// Error related to component registries.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ComponentDefinitionRegistryError {
    #[error("Attempted to register a duplicated component with name: {0}")]
    DuplicateComponentName(String),
    #[error("Invalid component name: '{0}' - names cannot be empty or start with the factory prefix.")]
    InvalidComponentName(String),
}
