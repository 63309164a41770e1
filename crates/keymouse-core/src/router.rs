// Keymouse Event Router
// Turns key events into mode changes, motion updates and immediate output

use crate::config::{EngineConfig, ModeKeys};
use crate::input::{InputError, InputSource, KeyEvent};
use crate::output::{OutputError, OutputSink};
use crate::{
    Binding, BindingTable, DualRoleKey, KeyId, ModifierTracker, SharedMotion, Transition,
    Velocity,
};

/// Errors that end the event loop abnormally
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

/// Why the router stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// An exit key was released
    ExitKey,
    /// The shared running flag was cleared
    Interrupted,
    /// The input source has no more events
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Mouse,
    Arrow,
}

/// Single-threaded dispatcher fed by an [`InputSource`].
///
/// Owns the modifier tracker and both dual-role keys; shares only the
/// [`SharedMotion`] handle (and the sink) with the integrator.
pub struct EventRouter<I, O> {
    input: I,
    sink: O,
    keys: ModeKeys,
    bindings: BindingTable,
    exit_keys: Vec<KeyId>,
    default_speed: u32,
    scroll_nudge: bool,
    modifiers: ModifierTracker,
    mouse_key: DualRoleKey,
    arrow_key: DualRoleKey,
    motion: SharedMotion,
    shut_down: bool,
}

impl<I: InputSource, O: OutputSink> EventRouter<I, O> {
    pub fn new(input: I, sink: O, config: &EngineConfig, motion: SharedMotion) -> Self {
        Self {
            input,
            sink,
            keys: config.keys,
            bindings: config.bindings.clone(),
            exit_keys: config.exit_keys.clone(),
            default_speed: config.default_speed,
            scroll_nudge: config.scroll_nudge,
            modifiers: ModifierTracker::new(config.keys.control, config.keys.shift),
            mouse_key: DualRoleKey::new(),
            arrow_key: DualRoleKey::new(),
            motion,
            shut_down: false,
        }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }

    pub fn motion(&self) -> &SharedMotion {
        &self.motion
    }

    pub fn modifiers(&self) -> &ModifierTracker {
        &self.modifiers
    }

    pub fn mouse_mode_key(&self) -> &DualRoleKey {
        &self.mouse_key
    }

    pub fn arrow_mode_key(&self) -> &DualRoleKey {
        &self.arrow_key
    }

    /// Register the keys the router always needs and replay keys that were
    /// already down, so a mode key held at launch enters its mode.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.input.listen(self.keys.mouse_mode);
        self.input.listen(self.keys.arrow_mode);
        for &key in &self.exit_keys {
            self.input.listen(key);
        }

        let held = self.input.initial_held_keys()?;
        if !held.is_empty() {
            log::info!("Replaying {} key(s) held at startup", held.len());
        }
        for key in held {
            if key.name().is_none() {
                log::warn!("Held key {} has no known name", key);
            }
            // Presses never terminate the router.
            self.handle(KeyEvent::press(key))?;
        }
        Ok(())
    }

    /// Route one event. Returns the exit reason when the event ends the loop.
    pub fn handle(&mut self, event: KeyEvent) -> Result<Option<ExitReason>, EngineError> {
        let KeyEvent { key, pressed } = event;
        log::trace!("Routing {}", event);

        self.modifiers.on_key_event(key, pressed);

        let transition = self.mouse_key.update(key, self.keys.mouse_mode, pressed);
        self.apply_transition(Mode::Mouse, transition)?;

        if pressed && self.arrow_key.is_active() {
            if let Some(arrow) = self.keys.arrows.arrow_for(key) {
                self.remap_arrow(arrow)?;
            }
        }

        let mouse_mode = self.mouse_key.is_active();
        // Inside mouse mode the arrow-mode key is just another binding.
        if !(mouse_mode && pressed && key == self.keys.arrow_mode) {
            let transition = self.arrow_key.update(key, self.keys.arrow_mode, pressed);
            self.apply_transition(Mode::Arrow, transition)?;
        }

        if mouse_mode {
            self.dispatch(key, pressed)?;
        }

        if !pressed && self.exit_keys.contains(&key) {
            log::info!("Exit key {} released", key);
            self.shutdown()?;
            return Ok(Some(ExitReason::ExitKey));
        }
        Ok(None)
    }

    /// Read and route events until an exit key, an interrupt, or a fatal error.
    pub fn run(&mut self) -> Result<ExitReason, EngineError> {
        if let Err(e) = self.start() {
            self.abort();
            return Err(e);
        }
        log::info!("Event router running");

        loop {
            let event = match self.input.next_event() {
                Ok(event) => event,
                Err(InputError::Interrupted) => {
                    log::info!("Interrupted, shutting down");
                    self.shutdown()?;
                    return Ok(ExitReason::Interrupted);
                }
                Err(InputError::Closed) => {
                    log::info!("Input closed, shutting down");
                    self.shutdown()?;
                    return Ok(ExitReason::InputClosed);
                }
                Err(e) => {
                    log::error!("Input failed: {}", e);
                    self.abort();
                    return Err(e.into());
                }
            };

            match self.handle(event) {
                Ok(Some(reason)) => return Ok(reason),
                Ok(None) => {}
                Err(e) => {
                    log::error!("Fatal error while handling {}: {}", event, e);
                    self.abort();
                    return Err(e);
                }
            }
        }
    }

    fn apply_transition(&mut self, mode: Mode, transition: Transition) -> Result<(), EngineError> {
        let target = match mode {
            Mode::Mouse => self.keys.mouse_mode,
            Mode::Arrow => self.keys.arrow_mode,
        };

        match transition {
            Transition::Unchanged => {}
            Transition::Entered => {
                log::debug!("{:?} mode on", mode);
                for key in self.modifiers.keys() {
                    self.input.listen(key);
                }
                if mode == Mode::Mouse {
                    self.motion.lock().set_mouse_mode(true);
                }
            }
            Transition::Left { tap } => {
                if tap {
                    log::debug!("{} tapped", target);
                    // Listening would swallow our own synthetic tap.
                    self.input.stop_listen(target);
                    self.sink.key_tap(target)?;
                    self.input.listen(target);
                }
                self.modifiers.clear();
                for key in self.modifiers.keys() {
                    self.input.stop_listen(key);
                }
                if mode == Mode::Mouse {
                    let mut motion = self.motion.lock();
                    motion.set_mouse_mode(false);
                    motion.stop();
                }
                log::debug!("{:?} mode off", mode);
            }
        }
        Ok(())
    }

    /// Emit `arrow` with whatever modifiers are held, while keeping the
    /// arrow-mode key logically down.
    fn remap_arrow(&mut self, arrow: KeyId) -> Result<(), EngineError> {
        let mode_key = self.keys.arrow_mode;
        let held = self.modifiers.held_keys();
        log::debug!("Arrow {} with {} modifier(s)", arrow, held.len());

        self.input.stop_listen(mode_key);
        self.sink.key_event(mode_key, false)?;

        for &modifier in &held {
            self.input.stop_listen(modifier);
            self.sink.key_event(modifier, false)?;
            self.sink.key_event(modifier, true)?;
        }

        self.sink.key_tap(arrow)?;

        for &modifier in &held {
            self.sink.key_event(modifier, false)?;
        }
        for key in self.modifiers.keys() {
            self.input.listen(key);
        }

        self.input.listen(mode_key);
        self.sink.key_event(mode_key, true)?;
        Ok(())
    }

    /// Apply every binding of `key`: moves, clicks, scrolls, then speeds.
    fn dispatch(&mut self, key: KeyId, pressed: bool) -> Result<(), EngineError> {
        for binding in self.bindings.lookup(key) {
            match *binding {
                Binding::Move { dx, dy, .. } => {
                    self.motion
                        .lock()
                        .apply_move(Velocity::from_units(dx, dy), pressed);
                }
                Binding::Click { button, .. } => {
                    log::debug!("Button {} {}", button, if pressed { "down" } else { "up" });
                    self.sink.button_event(button, pressed)?;
                }
                Binding::Scroll { dx, dy, .. } => {
                    let mut motion = self.motion.lock();
                    motion.apply_scroll(Velocity::from_units(dx, dy), pressed);
                    if self.scroll_nudge {
                        motion.request_scroll_nudge();
                    }
                }
                Binding::Speed { speed, .. } => {
                    // Any release restores the default, even with another
                    // speed key still down.
                    let speed = if pressed { speed } else { self.default_speed };
                    log::debug!("Speed {}", speed);
                    self.motion.lock().set_speed(speed);
                }
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        {
            let mut motion = self.motion.lock();
            motion.set_mouse_mode(false);
            motion.stop();
        }
        self.input.shutdown();
        self.sink.shutdown()?;
        log::info!("Router shut down");
        Ok(())
    }

    /// Shutdown on an error path; the first error is the one reported.
    fn abort(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("Shutdown after failure also failed: {}", e);
        }
    }
}
