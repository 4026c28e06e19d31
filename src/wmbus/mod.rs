//! # Wireless M-Bus (wM-Bus) Module
//!
//! Link layer descriptors the drivers are matched and fed with: link modes,
//! security modes, the bus handle and the decoded telegram.

pub mod handle;
pub mod link_mode;
pub mod security;
pub mod telegram;

pub use handle::WMBusHandle;
pub use link_mode::{LinkMode, LinkModeSet};
pub use security::SecurityMode;
pub use telegram::{Explanations, Telegram, TelegramAnnotator, TelegramHeader};
