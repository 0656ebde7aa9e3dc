//! watchbell: ship's bell chimes and repeating watch alerts.
//!
//! A tick source calls [`dispatcher::AlertDispatcher::on_tick`] on every
//! boundary; the dispatcher asks the [`alert`] policy what should sound and
//! queues it on the [`queue::SoundQueue`], whose single consumer plays
//! requests one at a time through the [`player::PlaybackEngine`].

pub mod alert;
pub mod bells;
pub mod config;
pub mod dispatcher;
pub mod effects;
pub mod errors;
pub mod notifier;
pub mod player;
pub mod queue;
pub mod service;
pub mod sound;
pub mod speech;
pub mod ticker;
