pub mod interval;
pub mod price;

pub use interval::CandleInterval;
pub use price::Price;
