use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("io error reading {0}: {1}")]
    Io(String, String),
    #[error("{0} is not under template root {1}")]
    NotUnderRoot(String, String),
    #[error("invalid meta.yaml at {0}: {1}")]
    Meta(String, String),
    #[error("template prefix {0:?} already registered")]
    DuplicatePrefix(String),
    #[error("directory {0} has no invoker config")]
    MissingInvokerConfig(String),
    #[error("directory {0} declares invoker pool_size 0")]
    EmptyInvokerPool(String),
    #[error(transparent)]
    Invoker(#[from] genie_core::invoker::InvokerError),
    #[error(transparent)]
    Template(#[from] minijinja::Error),
}

impl From<AdapterError> for genie_core::CoreError {
    fn from(error: AdapterError) -> Self {
        genie_core::CoreError::TemplateError(error.to_string())
    }
}
