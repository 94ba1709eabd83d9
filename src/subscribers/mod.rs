//! # Event subscribers.
//!
//! [`Subscribe`] is the trait; [`SubscriberSet`] fans events out to every
//! subscriber on isolated workers. Two subscribers ship with the launcher:
//!
//! - [`LogWriter`] turns events into tagged `tracing` lines;
//! - [`AlertWriter`] posts failures to the webhook through an [`Alerter`](crate::Alerter).
//!
//! ```text
//! Supervisor ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                                   ├──► LogWriter
//!                                                                   └──► AlertWriter
//! ```

mod alert;
mod log;
mod set;
mod subscriber;

pub use alert::AlertWriter;
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
