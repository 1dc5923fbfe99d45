//! Seams where an external collaborator is plugged in: credential
//! verification, session-token issuance, configuration loading, and DNS
//! resolution. Default implementations live in `infrastructure`.

pub mod config_source;
pub mod credential_verifier;
pub mod dns_lookup;
pub mod flow_revoker;
pub mod token_issuer;

pub use config_source::{ConfigSnapshot, ConfigSource};
pub use credential_verifier::CredentialVerifier;
pub use dns_lookup::DnsLookup;
pub use flow_revoker::FlowRevoker;
pub use token_issuer::SessionTokenIssuer;
