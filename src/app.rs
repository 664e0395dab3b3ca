use std::time::Instant;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::celebration::Explosion;
use crate::config::Config;
use crate::hint::HintArt;
use crate::input::{self, Intent, KeyContext, TapEvent, TapRecognizer};
use crate::lock::{LockAction, LockController, LockEffect};
use crate::notify::{self, Notifier};
use crate::presentation::{Cue, Stage, Timings};
use crate::runtime::GameEvent;
use crate::store::{self, CompletionRecord, FlagStore, MemoryFlagStore, SqliteFlagStore};
use crate::ui::layout::{self, KeypadKey, MainLayout};
use crate::viewer::{ImageViewer, Point, ViewerInput, ZoomBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Which overlays are up. Nothing stops two being set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modals {
    pub hint: bool,
    pub success: bool,
    pub failure: bool,
}

impl Modals {
    pub fn result_open(&self) -> bool {
        self.success || self.failure
    }
}

pub struct App {
    pub config: Config,
    pub lock: LockController,
    pub viewer: ImageViewer,
    pub hint: HintArt,
    pub modals: Modals,
    pub chest_open: bool,
    pub shaking: bool,
    pub pressed: Option<KeypadKey>,
    pub explosion: Explosion,
    pub previous: Option<CompletionRecord>,
    /// Tick counter, drives the shake animation.
    pub frame: u64,
    stage: Stage,
    timings: Timings,
    taps: TapRecognizer,
    store: Box<dyn FlagStore>,
    notifier: Box<dyn Notifier>,
    viewport: Rect,
    last_tick: Instant,
}

impl App {
    pub fn new(
        config: Config,
        store: Box<dyn FlagStore>,
        notifier: Box<dyn Notifier>,
        now: Instant,
    ) -> Self {
        let previous = match store::load_completion(store.as_ref()) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(%err, "could not read previous completion");
                None
            }
        };
        if let Some(record) = &previous {
            tracing::info!(%record, "found previous completion");
        }

        Self {
            lock: LockController::new(
                config.code.clone(),
                config.short_submit,
                config.track_attempts,
                now,
            ),
            viewer: ImageViewer::new(
                ZoomBounds::new(config.min_scale, config.max_scale),
                config.snap_offsets_at_unit_scale,
            ),
            hint: HintArt::load_or_bundled(config.hint_path.as_deref()),
            modals: Modals::default(),
            chest_open: false,
            shaking: false,
            pressed: None,
            explosion: Explosion::new(),
            previous,
            frame: 0,
            stage: Stage::new(),
            timings: Timings::from(&config),
            taps: TapRecognizer::new(),
            store,
            notifier,
            viewport: Rect::new(0, 0, 80, 24),
            last_tick: now,
            config,
        }
    }

    /// Wires up the on-disk store and the configured notifier.
    pub fn from_config(config: Config, now: Instant) -> Self {
        let store: Box<dyn FlagStore> = match SqliteFlagStore::open_default() {
            Ok(store) => Box::new(store),
            Err(err) => {
                tracing::warn!(%err, "flag store unavailable, keeping flags in memory");
                Box::new(MemoryFlagStore::default())
            }
        };
        let notifier = notify::from_url(config.notify_url.as_deref());
        Self::new(config, store, notifier, now)
    }

    pub fn store(&self) -> &dyn FlagStore {
        self.store.as_ref()
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = Rect::new(0, 0, width, height);
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn key_context(&self) -> KeyContext {
        KeyContext {
            hint_open: self.modals.hint,
            hint_fullscreen: self.viewer.is_fullscreen(),
            result_open: self.modals.result_open(),
        }
    }

    pub fn handle_event(&mut self, event: GameEvent, now: Instant) -> Control {
        match event {
            GameEvent::Key(key) => match input::key_intent(&key, self.key_context()) {
                Some(intent) => self.apply_intent(intent, now),
                None => Control::Continue,
            },
            GameEvent::Mouse(mouse) => {
                self.on_mouse(&mouse, now);
                Control::Continue
            }
            GameEvent::Resize(width, height) => {
                self.set_viewport(width, height);
                Control::Continue
            }
            GameEvent::Tick => {
                self.on_tick(now);
                Control::Continue
            }
        }
    }

    pub fn apply_intent(&mut self, intent: Intent, now: Instant) -> Control {
        match intent {
            Intent::Lock(action) => self.press(action, now),
            Intent::Viewer(input) => {
                if self.modals.hint {
                    self.viewer.handle(input);
                }
            }
            Intent::ToggleHint => {
                if self.modals.hint {
                    self.close_hint();
                } else {
                    self.open_hint();
                }
            }
            Intent::CloseTop => self.close_top(),
            Intent::Quit => return Control::Quit,
        }
        Control::Continue
    }

    fn press(&mut self, action: LockAction, now: Instant) {
        if let Some(key) = KeypadKey::for_action(action) {
            self.pressed = Some(key);
            self.stage
                .reschedule(Cue::KeyRelease, now + self.timings.key_feedback);
        }
        let effects = self.lock.apply(action, now);
        self.dispatch(effects, now);
    }

    /// Carries out controller effects in order: IO first, then presentation.
    pub fn dispatch(&mut self, effects: Vec<LockEffect>, now: Instant) {
        for effect in effects {
            match effect {
                LockEffect::BufferChanged => {}
                LockEffect::Notify(event) => self.notifier.notify(&event),
                LockEffect::PersistCompletion(record) => {
                    match store::persist_completion(self.store.as_mut(), &record) {
                        Ok(()) => self.previous = Some(record),
                        Err(err) => tracing::warn!(%err, "could not persist completion"),
                    }
                }
                LockEffect::Success { .. } => {
                    self.chest_open = true;
                    self.shaking = false;
                    self.modals.failure = false;
                    self.stage.cancel(Cue::ShakeEnd);
                    self.stage.success(now, &self.timings);
                }
                LockEffect::Failure { attempts } => {
                    tracing::debug!(?attempts, "showing failure");
                    self.shaking = true;
                    self.stage.failure(now, &self.timings);
                    if self.config.failure_modal {
                        self.modals.failure = true;
                    }
                }
                LockEffect::ClearCompletion => {
                    match store::clear_completion(self.store.as_mut()) {
                        Ok(()) => self.previous = None,
                        Err(err) => tracing::warn!(%err, "could not clear completion"),
                    }
                }
                LockEffect::ClockRestarted => {
                    self.stage.cancel_all();
                    self.explosion.stop();
                    self.chest_open = false;
                    self.shaking = false;
                    self.pressed = None;
                    self.modals.success = false;
                    self.modals.failure = false;
                }
            }
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.frame = self.frame.wrapping_add(1);
        let dt = now.saturating_duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;

        self.lock.on_tick(now);

        for cue in self.stage.due(now) {
            match cue {
                Cue::Reveal => {
                    let chest = MainLayout::new(self.viewport).chest;
                    let origin = (chest.x + chest.width / 2, chest.y + chest.height / 2);
                    self.explosion
                        .start(origin, self.viewport.width, self.viewport.height, now);
                }
                Cue::Summary => {
                    self.modals.failure = false;
                    self.modals.success = true;
                }
                Cue::ShakeEnd => self.shaking = false,
                Cue::KeyRelease => self.pressed = None,
            }
        }

        if self.modals.hint && self.taps.poll(now) == Some(TapEvent::Tap) {
            self.viewer.handle(ViewerInput::Tap);
        }

        self.explosion.update(now, dt);
    }

    pub fn open_hint(&mut self) {
        self.modals.hint = true;
        self.taps.clear();
        self.viewer.handle(ViewerInput::Open);
    }

    pub fn close_hint(&mut self) {
        self.modals.hint = false;
        self.taps.clear();
        self.viewer.handle(ViewerInput::Close);
    }

    fn close_results(&mut self) {
        self.modals.success = false;
        self.modals.failure = false;
    }

    fn close_top(&mut self) {
        if self.modals.hint {
            self.close_hint();
        } else {
            self.close_results();
        }
    }

    fn on_mouse(&mut self, ev: &MouseEvent, now: Instant) {
        let pos = Position::new(ev.column, ev.row);
        let clicked = matches!(ev.kind, MouseEventKind::Down(MouseButton::Left));

        if self.modals.hint {
            let fullscreen = self.viewer.is_fullscreen();
            if clicked && !layout::hint_frame(self.viewport, fullscreen).contains(pos) {
                self.close_hint();
                return;
            }
            let view = layout::hint_view(self.viewport, fullscreen);
            let anchor = Point::new(
                view.x as f64 + view.width as f64 / 2.0,
                view.y as f64 + view.height as f64 / 2.0,
            );
            for input in input::mouse_to_viewer(ev, anchor) {
                self.viewer.handle(input);
            }
            match self.taps.feed(ev, now) {
                Some(TapEvent::Tap) => {
                    self.viewer.handle(ViewerInput::Tap);
                }
                Some(TapEvent::DoubleTap) => {
                    self.viewer.handle(ViewerInput::DoubleTap);
                }
                None => {}
            }
            return;
        }

        if !clicked {
            return;
        }

        if self.modals.result_open() {
            if !layout::result_frame(self.viewport).contains(pos) {
                self.close_results();
            }
            return;
        }

        let main = MainLayout::new(self.viewport);
        if main.hint_button.contains(pos) {
            self.open_hint();
        } else if let Some(key) = layout::key_at(main.keypad, ev.column, ev.row) {
            self.press(key.action(), now);
        }
    }
}
