//! gs-messages
//!
//! User-facing acknowledgement templates for guildspace, plus the builder
//! and `msg!` macro that render them.

pub mod builder;
pub mod macros;
pub mod messages;

pub use builder::MessageBuilder;
pub use messages::{Messages, MESSAGES};
