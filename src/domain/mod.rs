// Pure model and algorithms: positions, uncovered ranges, the syntax tree,
// and the rewrite pass. No I/O in this layer.

pub mod ast;
pub mod position;
pub mod ranges;
pub mod rewrite;
