//! Chat client core: talks to the booking service over HTTP, keeps the
//! in-memory conversation log and renders replies.

pub mod api;
pub mod conversation;
pub mod gate;
pub mod render;
pub mod session;

pub use api::{BookingApi, ClientError, HttpBookingApi};
pub use conversation::{ChatFeatures, Conversation, ConversationLog, SubmitOutcome};
pub use gate::{AuthGate, BookingsView, Navigation, Notice, Route};
pub use session::{CookieSession, MemorySession, SessionStore, Token};
