//! This module holds typed parameters for endpoint inputs.
//!
//! Each parameter set is validated here, before it reaches application logic.
pub(crate) mod subscribe;
