//! Shadowing practice window: egui/eframe application.
//!
//! # Architecture
//!
//! [`ShadowingApp`] is the top-level [`eframe::App`].  It owns the running
//! [`Session`] while the user practises and a [`ResultsView`] once the
//! script is finished.  Every frame it calls [`Session::on_frame`], which
//! applies finished background work and advances playback progress, then
//! renders the current screen.  Button presses are collected while drawing
//! and applied afterwards, so the session is never borrowed by two widgets.
//!
//! # Screens
//!
//! | Screen | Contents |
//! |--------|----------|
//! | `Practice` | Playlist, sentence card, progress bar, controls, waveform, score panel |
//! | `Results` | Average score, per-sentence scores, narrative review |
//! | `Closed` | Nothing; the viewport is closing |

use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::audio::{AudioResourceManager, DeviceBackend, VisualizationFeed, WaveformData};
use crate::config::AudioConfig;
use crate::model::{ProcessedContent, ScoreBand, SessionReview};
use crate::report::SessionReport;
use crate::services::{ServiceError, SessionReviewer};
use crate::session::{
    Action, Advance, CompletedSession, Session, SessionError, SessionServices, SessionState,
};

/// Repaint cadence while a session is open.  Playback progress is advanced
/// once per frame, so this is also the progress resolution.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

const ACCENT: egui::Color32 = egui::Color32::from_rgb(68, 136, 255);
const RECORDING: egui::Color32 = egui::Color32::from_rgb(255, 68, 68);
const DIM: egui::Color32 = egui::Color32::from_rgb(140, 140, 140);
const ERROR: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);

/// Results screen button that restarts the same script from sentence one.
const RESTART_LABEL: &str = "Practice This Script Again";

// ---------------------------------------------------------------------------
// UI actions
// ---------------------------------------------------------------------------

/// A button press collected during drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiAction {
    Play,
    Record,
    Stop,
    Next,
    Jump(usize),
    Exit,
    DismissError,
}

/// What the practice screen turns into after an action.
enum Flow {
    Stay,
    Finished(CompletedSession),
    Exit,
}

enum Screen {
    Practice(Box<Session>),
    Results(ResultsView),
    Closed,
}

// ---------------------------------------------------------------------------
// ResultsView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum ReviewStatus {
    Pending,
    Ready(SessionReview),
    Unavailable,
}

/// Results screen state: the report plus the narrative review, which
/// arrives from a background task.
struct ResultsView {
    report: SessionReport,
    review: ReviewStatus,
    review_rx: Option<oneshot::Receiver<Result<SessionReview, ServiceError>>>,
}

impl ResultsView {
    /// Build the report and request the review.  Nothing is requested when
    /// no sentence was evaluated.
    fn new(done: &CompletedSession, reviewer: Arc<dyn SessionReviewer>, runtime: &Handle) -> Self {
        let report = SessionReport::from_completed(done);
        let history = report.review_history();

        if history.is_empty() {
            log::info!("ui: no evaluated sentences, review skipped");
            return Self {
                report,
                review: ReviewStatus::Unavailable,
                review_rx: None,
            };
        }

        let (tx, rx) = oneshot::channel();
        runtime.spawn(async move {
            let _ = tx.send(reviewer.review(&history).await);
        });

        Self {
            report,
            review: ReviewStatus::Pending,
            review_rx: Some(rx),
        }
    }

    /// Pick up the review if it has arrived (non-blocking).
    fn poll(&mut self) {
        let Some(rx) = self.review_rx.as_mut() else {
            return;
        };
        self.review = match rx.try_recv() {
            Ok(Ok(review)) => ReviewStatus::Ready(review),
            Ok(Err(e)) => {
                log::warn!("ui: session review failed: {e}");
                ReviewStatus::Unavailable
            }
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => ReviewStatus::Unavailable,
        };
        self.review_rx = None;
    }
}

// ---------------------------------------------------------------------------
// ShadowingApp
// ---------------------------------------------------------------------------

pub struct ShadowingApp {
    screen: Screen,

    // ── Restart material ─────────────────────────────────────────────────
    /// The ingested script, kept so the user can practise it again.
    content: ProcessedContent,
    services: SessionServices,
    reviewer: Arc<dyn SessionReviewer>,
    audio: AudioConfig,
    runtime: Handle,

    // ── Waveform ─────────────────────────────────────────────────────────
    feed: Option<VisualizationFeed>,
    waveform: WaveformData,

    /// Last failure shown in the banner until dismissed.
    banner: Option<String>,
}

impl ShadowingApp {
    /// Create the app and start a session over `content`.
    ///
    /// # Errors
    ///
    /// Whatever [`Session::new`] rejects, e.g. a script without sentences.
    pub fn new(
        content: ProcessedContent,
        services: SessionServices,
        reviewer: Arc<dyn SessionReviewer>,
        audio: AudioConfig,
        runtime: Handle,
    ) -> Result<Self, SessionError> {
        let mut app = Self {
            screen: Screen::Closed,
            content,
            services,
            reviewer,
            waveform: WaveformData::silent(audio.waveform_bars),
            audio,
            runtime,
            feed: None,
            banner: None,
        };
        app.screen = Screen::Practice(Box::new(app.start_session()?));
        Ok(app)
    }

    fn start_session(&self) -> Result<Session, SessionError> {
        let resources =
            AudioResourceManager::new(Box::new(DeviceBackend), self.audio.monitor_samples);
        Session::new(
            self.content.clone(),
            resources,
            self.services.clone(),
            &self.audio,
            self.runtime.clone(),
        )
    }

    // ── Per-frame bookkeeping ────────────────────────────────────────────

    fn absorb_errors(&mut self, session: &mut Session) {
        if let Some(err) = session.take_error() {
            self.banner = Some(err.to_string());
        }
    }

    /// Pull one waveform frame while recording.
    fn pump_waveform(&mut self, session: &Session) {
        if !matches!(session.state(), SessionState::Recording(_)) {
            self.feed = None;
            self.waveform = WaveformData::silent(self.audio.waveform_bars);
            return;
        }
        if self.feed.is_none() {
            self.feed = session.visualization_feed();
        }
        if let Some(feed) = self.feed.as_mut() {
            match feed.next() {
                Some(frame) => self.waveform = frame,
                None => self.feed = None,
            }
        }
    }

    fn apply(&mut self, session: &mut Session, action: UiAction) -> Flow {
        let result = match action {
            UiAction::Play => session.play(),
            UiAction::Record => session.start_recording(),
            UiAction::Stop => session.stop_recording(),
            UiAction::Jump(index) => session.jump_to(index),
            UiAction::Next => match session.next() {
                Ok(Advance::Completed(done)) => return Flow::Finished(done),
                Ok(Advance::Moved(_)) => Ok(()),
                Err(e) => Err(e),
            },
            UiAction::Exit => return Flow::Exit,
            UiAction::DismissError => {
                self.banner = None;
                Ok(())
            }
        };

        if let Err(err) = result {
            log::warn!("ui: {err}");
            self.banner = Some(err.to_string());
        }
        Flow::Stay
    }

    // ── Practice screen ──────────────────────────────────────────────────

    fn draw_playlist(&self, ui: &mut egui::Ui, session: &Session) -> Option<UiAction> {
        let mut action = None;
        let navigable = session.state().allows(Action::Navigate);

        ui.label(egui::RichText::new(session.title()).strong());
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (i, sentence) in session.sentences().iter().enumerate() {
                let score = session
                    .score(i)
                    .map_or_else(|| "--".to_string(), |s| s.to_string());
                let text = egui::RichText::new(format!("{:>2}. {}  [{score}]", i + 1, sentence.text))
                    .color(session.score(i).map_or(DIM, |s| band_color(ScoreBand::for_score(s))));

                let selected = session.cursor() == Some(i);
                let response = ui.add_enabled(navigable, egui::SelectableLabel::new(selected, text));
                if response.clicked() && !selected {
                    action = Some(UiAction::Jump(i));
                }
            }
        });
        action
    }

    fn draw_practice(&self, ui: &mut egui::Ui, session: &Session, now: Instant) -> Option<UiAction> {
        let mut action = None;
        let state = session.state();

        // --- Error banner ----------------------------------------------------
        if let Some(msg) = &self.banner {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(msg.as_str()).color(ERROR));
                if ui.small_button("Dismiss").clicked() {
                    action = Some(UiAction::DismissError);
                }
            });
            ui.separator();
        }

        // --- Sentence card ---------------------------------------------------
        let Some(sentence) = session.current_sentence() else {
            return action;
        };
        let index = session.cursor().unwrap_or(0);

        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(format!("Track {} / {}", index + 1, session.sentences().len()))
                    .color(DIM),
            );
            ui.label(egui::RichText::new(sentence.difficulty.label()).color(ACCENT));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(state.label()).color(state_color(state)));
            });
        });
        ui.add_space(8.0);
        ui.label(egui::RichText::new(sentence.text.as_str()).size(22.0));
        ui.label(egui::RichText::new(sentence.translation.as_str()).color(DIM));
        ui.add_space(8.0);

        ui.add(egui::ProgressBar::new(session.progress() / 100.0).desired_height(6.0));
        ui.add_space(8.0);

        // --- Controls --------------------------------------------------------
        ui.horizontal(|ui| {
            let play_label = if matches!(state, SessionState::AgentSpeaking(_)) {
                "Replay"
            } else {
                "Play"
            };
            if ui
                .add_enabled(state.allows(Action::Play), egui::Button::new(play_label))
                .clicked()
            {
                action = Some(UiAction::Play);
            }

            if matches!(state, SessionState::Recording(_)) {
                let stop = egui::Button::new(egui::RichText::new("Stop").color(RECORDING));
                if ui.add(stop).clicked() {
                    action = Some(UiAction::Stop);
                }
            } else if ui
                .add_enabled(
                    state.allows(Action::StartRecording),
                    egui::Button::new("Record"),
                )
                .clicked()
            {
                action = Some(UiAction::Record);
            }

            let next_label = if session.is_last() { "Finish Session" } else { "Next" };
            if ui
                .add_enabled(
                    state.allows(Action::Navigate),
                    egui::Button::new(next_label),
                )
                .clicked()
            {
                action = Some(UiAction::Next);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Exit").clicked() {
                    action = Some(UiAction::Exit);
                }
            });
        });
        ui.add_space(8.0);

        // --- Recording / evaluating status ----------------------------------
        match state {
            SessionState::Recording(_) => {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("Recording").color(RECORDING));
                    if let Some(elapsed) = session.recording_elapsed(now) {
                        ui.label(
                            egui::RichText::new(format!("{:.1}s", elapsed.as_secs_f32()))
                                .color(egui::Color32::from_rgb(255, 140, 140)),
                        );
                    }
                });
                self.draw_waveform(ui);
            }
            SessionState::Evaluating(_) => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new("Scoring your attempt...").color(ACCENT));
                });
            }
            _ => {}
        }

        // --- Score panel -----------------------------------------------------
        if let Some(evaluation) = session.current_result().and_then(|r| r.evaluation.as_ref()) {
            let color = band_color(ScoreBand::for_score(evaluation.score));
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.label(egui::RichText::new(format!("Score: {}", evaluation.score)).size(18.0).color(color));
                ui.label(evaluation.feedback.as_str());
                if !evaluation.pronunciation_tips.is_empty() {
                    ui.label(
                        egui::RichText::new(format!("Tip: {}", evaluation.pronunciation_tips))
                            .color(DIM),
                    );
                }
            });
        }

        action
    }

    /// Draw the amplitude bar chart used while recording.
    fn draw_waveform(&self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), 40.0),
            egui::Sense::hover(),
        );

        let painter = ui.painter();
        let num_bars = self.waveform.len().max(1);
        let bar_width = rect.width() / num_bars as f32;

        for (i, &amplitude) in self.waveform.bars.iter().enumerate() {
            let x = rect.left() + i as f32 * bar_width;
            let bar_height = (amplitude * rect.height()).max(2.0);

            painter.rect_filled(
                egui::Rect::from_center_size(
                    egui::pos2(x + bar_width / 2.0, rect.center().y),
                    egui::vec2((bar_width * 0.65).max(1.0), bar_height),
                ),
                1.0,
                RECORDING,
            );
        }
    }

    // ── Results screen ───────────────────────────────────────────────────

    /// Returns `true` when the user asked to practise again, `false` to close.
    fn draw_results(&self, ui: &mut egui::Ui, results: &ResultsView) -> Option<bool> {
        let mut choice = None;
        let report = &results.report;

        ui.heading(report.title.as_str());
        ui.add_space(8.0);
        ui.label(
            egui::RichText::new(format!("Average score: {}", report.average))
                .size(28.0)
                .color(band_color(report.band())),
        );
        ui.label(
            egui::RichText::new(format!(
                "{} of {} sentences evaluated",
                report.rows.len(),
                report.total_sentences
            ))
            .color(DIM),
        );
        ui.separator();

        egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
            for row in &report.rows {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(format!("{:>3}", row.score)).color(band_color(row.band)));
                    ui.label(format!("{}. {}", row.index + 1, row.text));
                });
            }
        });
        ui.separator();

        match &results.review {
            ReviewStatus::Pending => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new("Preparing your review...").color(ACCENT));
                });
            }
            ReviewStatus::Ready(review) => {
                ui.label(egui::RichText::new("Strengths").strong());
                ui.label(review.strengths.as_str());
                ui.label(egui::RichText::new("To improve").strong());
                ui.label(review.improvements.as_str());
                ui.add_space(4.0);
                ui.label(egui::RichText::new(review.motivational_message.as_str()).italics());
            }
            ReviewStatus::Unavailable => {
                ui.label(egui::RichText::new("No review available.").color(DIM));
            }
        }

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button(RESTART_LABEL).clicked() {
                choice = Some(true);
            }
            if ui.button("Close").clicked() {
                choice = Some(false);
            }
        });
        choice
    }
}

// ---------------------------------------------------------------------------
// Colours
// ---------------------------------------------------------------------------

fn band_color(band: ScoreBand) -> egui::Color32 {
    match band {
        ScoreBand::Good => egui::Color32::from_rgb(80, 200, 120),
        ScoreBand::Fair => egui::Color32::from_rgb(240, 190, 60),
        ScoreBand::Poor => egui::Color32::from_rgb(255, 100, 100),
    }
}

fn state_color(state: SessionState) -> egui::Color32 {
    match state {
        SessionState::Idle(_) | SessionState::Complete => DIM,
        SessionState::AgentSpeaking(_) | SessionState::Evaluating(_) => ACCENT,
        SessionState::Recording(_) => RECORDING,
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for ShadowingApp {
    /// Called every frame by eframe.  Ticks the session, renders the current
    /// screen, then applies whatever the user clicked.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgb(30, 30, 30))
            .inner_margin(egui::Margin::same(12));

        let screen = std::mem::replace(&mut self.screen, Screen::Closed);
        let next = match screen {
            Screen::Practice(mut session) => {
                session.on_frame(now);
                self.absorb_errors(&mut session);
                self.pump_waveform(&session);
                ctx.request_repaint_after(FRAME_INTERVAL);

                let mut action = None;
                egui::SidePanel::left("playlist")
                    .resizable(false)
                    .default_width(240.0)
                    .show(ctx, |ui| {
                        if let Some(a) = self.draw_playlist(ui, &session) {
                            action = Some(a);
                        }
                    });
                egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
                    if let Some(a) = self.draw_practice(ui, &session, now) {
                        action = Some(a);
                    }
                });

                match action.map_or(Flow::Stay, |a| self.apply(&mut session, a)) {
                    Flow::Stay => Screen::Practice(session),
                    Flow::Finished(done) => {
                        self.feed = None;
                        self.banner = None;
                        Screen::Results(ResultsView::new(&done, Arc::clone(&self.reviewer), &self.runtime))
                    }
                    Flow::Exit => {
                        session.exit();
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        Screen::Closed
                    }
                }
            }

            Screen::Results(mut results) => {
                results.poll();
                if results.review == ReviewStatus::Pending {
                    ctx.request_repaint_after(Duration::from_millis(100));
                }

                let mut choice = None;
                egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
                    choice = self.draw_results(ui, &results);
                });

                match choice {
                    Some(true) => match self.start_session() {
                        Ok(session) => Screen::Practice(Box::new(session)),
                        Err(err) => {
                            log::error!("ui: could not restart session: {err}");
                            Screen::Results(results)
                        }
                    },
                    Some(false) => {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        Screen::Closed
                    }
                    None => Screen::Results(results),
                }
            }

            Screen::Closed => Screen::Closed,
        };
        self.screen = next;
    }

    /// Release all audio hardware before the window goes away.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Screen::Practice(session) = std::mem::replace(&mut self.screen, Screen::Closed) {
            session.exit();
        }
        log::info!("shadow practice window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
