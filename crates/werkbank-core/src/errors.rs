/// Domain errors for the module roster.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("module name must not be empty")]
    EmptyModuleName,
}
