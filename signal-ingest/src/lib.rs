// Signal Normalizer (Layer 1)
// Maps raw per-source records into canonical (date, ticker) keyed vectors

pub mod attention;
pub mod price;
pub mod source;

pub use attention::{AttentionSource, RawAttentionRecord};
pub use price::{parse_price_batch, PriceBatch, PriceSource, RawPriceRecord};
pub use source::{normalize_batch, NormalizeOutcome, SignalSource};
