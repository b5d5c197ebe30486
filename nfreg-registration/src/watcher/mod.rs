//! Sources of configuration snapshots

pub mod plmn_poller;

pub use plmn_poller::{PlmnConfigPoller, PlmnPollerConfig};
