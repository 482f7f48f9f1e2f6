pub mod accumulate;
pub mod cache;
pub mod client;
pub mod envelope;
pub mod error;
pub mod normalize;

pub use accumulate::{accumulate, Accumulation};
pub use cache::CompanyCache;
pub use client::CrmClient;
pub use envelope::{to_record, to_records};
pub use error::CrmError;
pub use normalize::{map_buyer, normalize_email, normalize_phone};
