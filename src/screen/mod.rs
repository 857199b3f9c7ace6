pub mod context;
pub mod launch;
pub mod orientation;
