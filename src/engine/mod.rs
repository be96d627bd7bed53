//! Engine - component registry and tree bookkeeping.

pub mod registry;
