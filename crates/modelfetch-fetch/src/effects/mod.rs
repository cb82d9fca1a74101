//! I/O: the transport seam, the download loop, and the catalog driver.

mod fallback;
mod fetcher;
mod http;

pub use fallback::CatalogReport;
pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient};

#[cfg(feature = "reqwest")]
pub use http::{ClientSettings, ReqwestClient};
