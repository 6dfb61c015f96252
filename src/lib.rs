//! glint instruments Go source so that statements left uncovered by a test
//! run abort loudly when executed, turning a coverage-guided fuzzer into a
//! detector for inputs that reach untested code.
//!
//! The pipeline: read a cover profile, merge each file's zero-hit blocks into
//! an uncovered-range set, parse the file, wrap every fully-uncovered
//! non-binding statement in `{ sentinel(...); stmt }`, and print the result
//! into a mirror tree.

pub mod application;
pub mod domain;
pub mod infrastructure;
