//! Send-rate limiting.
//!
//! Campaign sends are paced with a fixed post-send delay derived from the
//! configured sends-per-minute. Rows are processed strictly in order, so the
//! pacer needs no shared state.

mod pacer;

pub use pacer::SendPacer;
