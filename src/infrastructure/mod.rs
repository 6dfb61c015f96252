// Everything that touches the outside world: files, the profile format, the
// Go front end and printer, and the thread pool.

pub mod concurrency;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod printer;
pub mod profile;
