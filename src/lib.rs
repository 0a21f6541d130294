//! Shadow Practice: listen to a sentence, repeat it, get a pronunciation
//! score, move on.
//!
//! * [`session`] sequences playback, recording, evaluation and navigation.
//! * [`audio`] owns the speaker and microphone and turns captures into WAV.
//! * [`services`] talks to the remote model that writes scripts, speaks
//!   sentences, scores attempts and reviews the session.
//! * [`report`] and [`app`] present the results.

pub mod app;
pub mod audio;
pub mod config;
pub mod model;
pub mod report;
pub mod services;
pub mod session;
