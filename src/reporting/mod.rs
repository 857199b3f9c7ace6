pub mod ad_params;
pub mod event;
pub mod event_reporter;
pub mod memory_collector;
pub mod traits;
