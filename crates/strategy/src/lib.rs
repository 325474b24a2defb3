pub mod allocation;
pub mod buy_and_hold;

pub use allocation::{Allocation, AllocationError, AllocationInput, ALLOCATION_TOLERANCE};
pub use buy_and_hold::{compute_value, position_value, ValuationError};
