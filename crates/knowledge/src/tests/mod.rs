//! Cross-module tests for retrieval and answering.

pub(crate) mod support;

mod retrieval;
