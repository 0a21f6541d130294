//! Practice-session orchestration.
//!
//! This module provides:
//! * [`Session`]: the state machine driving one script end to end.
//! * [`SessionState`] / [`Action`]: states and the requests they gate.
//! * [`PlaybackController`]: synthesized speech with progress and pre-emption.
//! * [`CaptureController`]: microphone capture finalized into a [`Recording`].
//! * [`EvaluationPipeline`]: background scoring keyed by [`EvaluationTicket`].
//! * [`PerformanceLog`]: one optional record per sentence.
//! * [`SessionError`]: user-facing failures.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//! use shadow_practice::audio::{AudioResourceManager, DeviceBackend};
//! use shadow_practice::config::AppConfig;
//! use shadow_practice::model::ProcessedContent;
//! use shadow_practice::services::GeminiClient;
//! use shadow_practice::session::{Session, SessionServices};
//!
//! # fn script() -> ProcessedContent { unimplemented!() }
//! let config = AppConfig::default();
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let client = Arc::new(GeminiClient::from_config(&config));
//! let services = SessionServices { synthesizer: client.clone(), scorer: client };
//! let resources = AudioResourceManager::new(Box::new(DeviceBackend), config.audio.monitor_samples);
//!
//! let mut session =
//!     Session::new(script(), resources, services, &config.audio, runtime.handle().clone()).unwrap();
//! session.play().unwrap();
//! loop {
//!     session.on_frame(Instant::now()); // once per rendered frame
//! #   break;
//! }
//! ```
//!
//! [`Recording`]: crate::model::Recording

pub mod capture;
pub mod error;
pub mod evaluation;
pub mod events;
pub mod playback;
pub mod records;
pub mod runner;
pub mod state;

pub use capture::{CaptureController, CaptureSession};
pub use error::SessionError;
pub use evaluation::{EvaluationPipeline, EvaluationTicket};
pub use events::SessionEvent;
pub use playback::{PlaybackController, PlaybackHandle, PlaybackTicket};
pub use records::PerformanceLog;
pub use runner::{Advance, CompletedSession, Session, SessionServices};
pub use state::{Action, SessionState};
