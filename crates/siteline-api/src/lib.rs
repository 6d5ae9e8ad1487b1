// siteline-api: Async Rust client for SharePoint tenant endpoints
// (site search + license validation)

pub mod deadline;
pub mod error;
pub mod licensing;
pub mod search;
pub mod transport;

pub use deadline::{DEFAULT_TIMEOUT, deadline};
pub use error::Error;
pub use licensing::{LicenseReason, LicenseStatus, LicensingClient};
pub use search::{SearchCell, SearchClient, SearchRequest, SearchRow};
pub use transport::TransportConfig;
