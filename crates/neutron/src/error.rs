use thiserror::Error;

/// Errors that can occur while resolving a pod's network.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Failed to look up pod {name} in namespace {namespace}")]
    PodLookupFailed { namespace: String, name: String },
    #[error("Failed to fetch subnet {subnet_id}")]
    SubnetLookupFailed { subnet_id: String },
    #[error("Failed to fetch network {network_id}")]
    NetworkLookupFailed { network_id: String },
}

/// Normalized failure of a remote provider call.
///
/// A provider response carrying a non-empty error message is reported as
/// [`Operation`](ProviderError::Operation); both variants are handled
/// identically by callers.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Transport failure talking to network provider: {message}")]
    Transport { message: String },
    #[error("Network provider rejected the operation: {message}")]
    Operation { message: String },
}
