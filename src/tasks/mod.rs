pub mod poller;
pub mod reconcile;
