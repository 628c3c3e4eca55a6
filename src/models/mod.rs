pub mod booking;
pub mod chat;
pub mod intent;
pub mod user;

pub use booking::{Booking, NewBooking};
pub use chat::{BookingDetails, ChatRequest, ChatResponse, Message, MessageContent, Sender};
pub use intent::{ActionType, BookingAction};
pub use user::{Credentials, TokenResponse, User};
