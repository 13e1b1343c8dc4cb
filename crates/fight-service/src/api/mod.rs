mod extractors;
pub(crate) mod routes;

pub use extractors::*;
pub use routes::*;
