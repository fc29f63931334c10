mod http;
mod traits;

pub use http::HttpClient;
pub use traits::{AddonRegistry, ExpressionEngine, HttpFetcher, ParseContext, StaticRegistry};
