pub mod cart;
pub mod event;
pub mod user;

pub use cart::CartLineItem;
pub use event::{Event, EventRecord, NewEvent, NewEventError, TicketTier, STANDARD_TIER_NAME};
pub use user::TicketHolding;
