//! This module provides protection mechanisms for the resources served by the web application.
//!
//! Each submodule holds the middleware guarding one family of routes, so that only
//! verified subscribers reach the handlers behind it.

pub(crate) mod subscribe;
