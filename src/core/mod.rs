//! Script parsing, line selection, placeholder resolution and the engine
//! that ties them together.

pub mod config;
pub mod context;
pub mod engine;
pub mod registry;
pub mod resolver;
pub mod script;
pub mod selector;
pub mod template;
pub mod voice;
