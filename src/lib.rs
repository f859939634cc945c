pub mod cli;
pub mod collect;
pub mod error;
pub mod fetch;
pub mod model;
pub mod snapshot;
pub mod table;
pub mod util;
