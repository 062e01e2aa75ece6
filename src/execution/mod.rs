// Candle storage and the hand-off between feed and consumers
pub mod candle_buffer;
pub mod handle;
pub mod update_queue;

pub use candle_buffer::{CandleBuffer, DEFAULT_CAPACITY};
pub use handle::StrategyHandle;
pub use update_queue::{update_queue, UpdateReceiver, UpdateSender};
