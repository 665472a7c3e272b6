pub mod anchored;
pub mod bacen;
pub mod ecb;
pub mod router;
pub mod util;

#[cfg(test)]
pub(crate) mod fake;

pub use anchored::{AnchoredRateProvider, Quotation, RateFeed};
pub use bacen::{BacenFeed, BacenRateProvider};
pub use ecb::{EcbFeed, EcbRateProvider};
pub use router::{ConversionRouter, RateSource};
