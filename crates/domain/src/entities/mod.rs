pub mod candle;
pub mod observation;
pub mod pool;

// Re-export for easier access
pub use candle::{Candle, CandleRecord};
pub use observation::PriceObservation;
pub use pool::Pool;
