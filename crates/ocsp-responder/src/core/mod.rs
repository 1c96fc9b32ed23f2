//! Request verification and response construction

pub mod builder;
pub mod identity;
pub mod verifier;

pub use builder::{resolve_status, BuildError, BuiltResponse, ResponseBuilder, CACHE_CONTROL};
pub use identity::IdentityHandle;
pub use verifier::{decode_get_path, verify_issuer, RequestSource, RequestVerifier, VerifyError};
