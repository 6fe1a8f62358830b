//! The symbolic variable factory and constraint encoder (spec §2
//! components 3 and 4, §4.2-§4.3).

pub mod encoder;
pub mod vars;

pub use encoder::Encoder;
pub use vars::VariableFactory;
