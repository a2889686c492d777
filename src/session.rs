//! Export sessions: the sequence driver, the status surface and the manager that keeps at most
//! one export recording at a time.

pub(crate) mod manager;
pub(crate) mod model;
pub(crate) mod sequence;
pub(crate) mod status;
