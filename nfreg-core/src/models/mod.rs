pub mod plmn;
pub mod profile;

pub use plmn::{ConfigurationSnapshot, PlmnId};
pub use profile::{NfProfile, PatchItem, PatchOperation, ProblemDetails, NF_STATUS_REGISTERED};
