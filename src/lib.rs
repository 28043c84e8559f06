pub mod archive;
pub mod config;
pub mod constants;
pub mod geodesy;
pub mod listing;
pub mod logging;
pub mod pipeline;
pub mod products;
pub mod reconcile;
pub mod sinex;
pub mod snxroster_errors;
pub mod station;
pub mod store;
pub mod time;
