//! Error conversion helpers shared across crate boundaries.

mod boundary;
