//! Turns the stream of tag values reported by the chip into press, release
//! and key callbacks on widgets.

use crate::tags::{Target, TagRegistry, WidgetArena, WidgetId};

/// Capacity of the queue of tag events waiting to be dispatched.
pub const EVENT_QUEUE_LEN: usize = 16;

/// A tag value reported by the chip, and when it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEvent {
    pub tag: u8,
    pub at_ms: u64,
}

impl TagEvent {
    pub const fn new(tag: u8, at_ms: u64) -> Self {
        Self {
            tag: tag,
            at_ms: at_ms,
        }
    }
}

/// What the finger is currently pressing, as far as the dispatcher knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    Idle,
    Widget(WidgetId),
    Key(u8),
}

/// The press/release state machine.
///
/// Each call returns `true` if the event changed what's pressed, in which
/// case the screen should be repainted to show it.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: PressState,
    last_event_at: Option<u64>,
    pending_release: Option<u64>,
    screen_changed: bool,
    min_interval_ms: u64,
}

impl Dispatcher {
    /// Creates a dispatcher that defers releases arriving sooner than
    /// `min_interval_ms` after the previous event.
    pub const fn new(min_interval_ms: u64) -> Self {
        Self {
            state: PressState::Idle,
            last_event_at: None,
            pending_release: None,
            screen_changed: false,
            min_interval_ms: min_interval_ms,
        }
    }

    pub fn state(&self) -> PressState {
        self.state
    }

    /// When a deferred release is due, if there is one.
    pub fn pending_release(&self) -> Option<u64> {
        self.pending_release
    }

    /// Tells the dispatcher that a different screen is now showing.
    ///
    /// If a finger is still resting on the glass, the next event is ignored
    /// unless it's a release, so that the finger doesn't press whatever now
    /// occupies its tag. Whatever it was pressing stays pressed until it
    /// lifts, and then gets its release as usual. With no finger down the
    /// next touch is a fresh press and is delivered normally.
    pub fn set_screen_changed(&mut self) {
        self.screen_changed = self.touch_in_progress();
    }

    // A deferred release means the finger already lifted.
    fn touch_in_progress(&self) -> bool {
        self.state != PressState::Idle && self.pending_release.is_none()
    }

    pub fn handle<A>(&mut self, registry: &TagRegistry, widgets: &mut A, event: TagEvent) -> bool
    where
        A: WidgetArena + ?Sized,
    {
        let previous = self.last_event_at.replace(event.at_ms);
        let target = registry.resolve(event.tag);

        if self.screen_changed {
            self.screen_changed = false;
            if target != Target::Release {
                log::debug!("ignoring tag {} carried over from the previous screen", event.tag);
                return false;
            }
        }

        match target {
            Target::Release => {
                let soon = match previous {
                    Some(at) => event.at_ms.saturating_sub(at) < self.min_interval_ms,
                    None => false,
                };
                if soon && self.state != PressState::Idle {
                    if self.pending_release.is_none() {
                        let due = event.at_ms + self.min_interval_ms;
                        log::trace!("deferring release (tag {}) until {}", event.tag, due);
                        self.pending_release = Some(due);
                    }
                    return false;
                }
                self.pending_release = None;
                self.release(widgets)
            }
            Target::Widget(id) => {
                self.pending_release = None;
                if self.state == PressState::Widget(id) {
                    return false;
                }
                self.leave(registry, widgets);
                log::debug!("widget {} pressed", id.0);
                if let Some(w) = widgets.widget_mut(id) {
                    w.on_press();
                }
                self.state = PressState::Widget(id);
                true
            }
            Target::Key(code) => {
                self.pending_release = None;
                if self.state == PressState::Key(code) {
                    return false;
                }
                self.leave(registry, widgets);
                self.state = PressState::Key(code);
                true
            }
        }
    }

    /// Fires a deferred release once it's due.
    pub fn poll<A>(&mut self, widgets: &mut A, now_ms: u64) -> bool
    where
        A: WidgetArena + ?Sized,
    {
        match self.pending_release {
            Some(due) if now_ms >= due => {
                self.pending_release = None;
                log::trace!("deferred release due at {} fired at {}", due, now_ms);
                self.release(widgets)
            }
            _ => false,
        }
    }

    // The finger lifted, or moved onto something that doesn't respond to
    // touch. Keys only report on moving to another target, not on lifting.
    fn release<A>(&mut self, widgets: &mut A) -> bool
    where
        A: WidgetArena + ?Sized,
    {
        match core::mem::replace(&mut self.state, PressState::Idle) {
            PressState::Widget(id) => {
                log::debug!("widget {} released", id.0);
                if let Some(w) = widgets.widget_mut(id) {
                    w.on_release();
                }
                true
            }
            PressState::Key(_) => true,
            PressState::Idle => false,
        }
    }

    // The finger moved directly from one target to another.
    fn leave<A>(&mut self, registry: &TagRegistry, widgets: &mut A)
    where
        A: WidgetArena + ?Sized,
    {
        match core::mem::replace(&mut self.state, PressState::Idle) {
            PressState::Widget(id) => {
                log::debug!("widget {} released", id.0);
                if let Some(w) = widgets.widget_mut(id) {
                    w.on_release();
                }
            }
            PressState::Key(code) => match registry.key_target() {
                Some(id) => {
                    log::debug!("key {:#04x} sent to widget {}", code, id.0);
                    if let Some(w) = widgets.widget_mut(id) {
                        w.on_key(code);
                    }
                }
                None => log::debug!("key {:#04x} has no target", code),
            },
            PressState::Idle => {}
        }
    }
}
