pub mod clock;
pub mod store;
pub mod sweep;
pub mod transition;
pub mod types;

pub use store::SlotLedger;
pub use transition::Transition;
pub use types::{Caller, HistoryOutcome, HistoryRecord, Role, Slot, SlotStatus};
