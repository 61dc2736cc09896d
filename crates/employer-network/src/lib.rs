//! Employer partner directory with role-gated staff administration.
//!
//! The crate owns the authorization and workflow rules: which role may see or mutate which
//! employer records, the two-state employer lifecycle, and the provisioning flows that bind
//! identity-provider accounts to staff profiles. Storage, identity, notification and
//! geocoding are collaborators expressed as traits.

pub mod access;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
