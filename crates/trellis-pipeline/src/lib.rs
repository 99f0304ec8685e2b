mod assembler;
pub mod cast;
mod driver;
mod error;
pub mod filter;
mod level;
mod resolver;
pub mod sort;

pub use assembler::Assembler;
pub use driver::Driver;
pub use error::PipelineError;
pub use resolver::Resolver;
