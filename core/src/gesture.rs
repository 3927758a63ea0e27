//! Turns raw mouse, pointer and touch events into at most one reveal or flag per gesture.
//!
//! The recognizer never owns a timer. Pressing a cell yields a [`HoldTimer`] for the host to
//! schedule (a browser timeout, an event loop deadline, a [`TimerQueue`]); when it elapses the
//! host hands it back through [`GestureRecognizer::on_hold_elapsed`]. Each timer carries a
//! [`CancelToken`] that is cancelled the moment the gesture leaves its pending phase, so a
//! timer that fires late is inert no matter how the host cleared it.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use smallvec::SmallVec;

use crate::*;

/// Host identifier of a pointer, stable from its press to its release.
pub type PointerId = i32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Other,
}

impl MouseButton {
    /// Maps a DOM style button index (`0` primary, `2` secondary).
    pub const fn from_index(index: i16) -> Self {
        match index {
            0 => Self::Primary,
            2 => Self::Secondary,
            _ => Self::Other,
        }
    }
}

/// Gestures reported by a pan/zoom viewport that wraps the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewportGesture {
    Pan,
    Pinch,
    Zoom,
    Wheel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    MouseDown { cell: Coord2, button: MouseButton },
    /// The button that counts is the one recorded on the matching press.
    MouseUp { cell: Coord2 },
    PointerDown {
        id: PointerId,
        cell: Coord2,
        kind: PointerKind,
    },
    PointerUp {
        id: PointerId,
        cell: Coord2,
        kind: PointerKind,
    },
    PointerCancel {
        id: PointerId,
        kind: PointerKind,
    },
    /// `touches` is the number of touch points active including the new one.
    TouchStart { cell: Coord2, touches: u8 },
    TouchMove,
    /// `touches` is the number of touch points still active.
    TouchEnd { cell: Coord2, touches: u8 },
    Viewport(ViewportGesture),
}

/// What a gesture resolved to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Reveal(Coord2),
    Flag(Coord2),
}

impl Intent {
    pub const fn coords(self) -> Coord2 {
        match self {
            Self::Reveal(coords) | Self::Flag(coords) => coords,
        }
    }
}

/// Shared flag between a gesture and the timer scheduled for it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Request to call [`GestureRecognizer::on_hold_elapsed`] after `delay`.
#[derive(Clone, Debug)]
pub struct HoldTimer {
    pub cell: Coord2,
    pub delay: Duration,
    pub token: CancelToken,
}

#[derive(Clone, Debug)]
pub enum Reaction {
    Ignore,
    Schedule(HoldTimer),
    Resolve(Intent),
}

impl Reaction {
    pub fn intent(&self) -> Option<Intent> {
        match self {
            Self::Resolve(intent) => Some(*intent),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PressSource {
    Mouse(MouseButton),
    Pointer,
}

#[derive(Clone, Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Pending {
        cell: Coord2,
        source: PressSource,
        token: CancelToken,
    },
    Resolved,
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct GestureRecognizer {
    hold: HoldDuration,
    phase: Phase,
    active_pointers: SmallVec<[PointerId; 4]>,
}

impl GestureRecognizer {
    pub fn new(hold: HoldDuration) -> Self {
        Self {
            hold,
            phase: Phase::Idle,
            active_pointers: SmallVec::new(),
        }
    }

    pub fn hold_duration(&self) -> HoldDuration {
        self.hold
    }

    /// Applies to presses made after the call.
    pub fn set_hold_duration(&mut self, hold: HoldDuration) {
        self.hold = hold;
    }

    /// Cell currently held down, if a gesture is still undecided.
    pub fn pending_cell(&self) -> Option<Coord2> {
        match &self.phase {
            Phase::Pending { cell, .. } => Some(*cell),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.phase, Phase::Cancelled)
    }

    pub fn handle(&mut self, event: InputEvent) -> Reaction {
        use InputEvent::*;

        log::trace!("gesture event {:?} in {:?}", event, self.phase);
        match event {
            MouseDown { cell, button } => self.press(cell, PressSource::Mouse(button)),
            MouseUp { cell } => self.release(cell),
            PointerDown {
                kind: PointerKind::Mouse,
                ..
            }
            | PointerUp {
                kind: PointerKind::Mouse,
                ..
            }
            | PointerCancel {
                kind: PointerKind::Mouse,
                ..
            } => Reaction::Ignore,
            PointerDown { id, cell, .. } => self.pointer_down(id, cell),
            PointerUp { id, cell, .. } => {
                if self.forget_pointer(id) {
                    self.release(cell)
                } else {
                    log::trace!("release of untracked pointer {}", id);
                    Reaction::Ignore
                }
            }
            PointerCancel { id, .. } => {
                self.forget_pointer(id);
                self.cancel("pointer cancelled");
                Reaction::Ignore
            }
            TouchStart { touches, .. } if touches > 1 => {
                self.cancel("multiple touches");
                Reaction::Ignore
            }
            TouchStart { cell, .. } => self.press(cell, PressSource::Pointer),
            TouchMove => {
                self.cancel("touch moved");
                Reaction::Ignore
            }
            TouchEnd { cell, touches } => {
                if touches == 0 {
                    self.active_pointers.clear();
                }
                self.release(cell)
            }
            Viewport(gesture) => {
                self.cancel(match gesture {
                    ViewportGesture::Pan => "viewport pan",
                    ViewportGesture::Pinch => "viewport pinch",
                    ViewportGesture::Zoom => "viewport zoom",
                    ViewportGesture::Wheel => "viewport wheel",
                });
                Reaction::Ignore
            }
        }
    }

    /// Resolves the hold into a flag, unless the gesture moved on since `timer` was issued.
    pub fn on_hold_elapsed(&mut self, timer: &HoldTimer) -> Option<Intent> {
        if timer.token.is_cancelled() {
            log::trace!("stale hold timer for {:?}", timer.cell);
            return None;
        }

        match &self.phase {
            Phase::Pending { cell, token, .. } if token.same_as(&timer.token) => {
                let cell = *cell;
                token.cancel();
                self.phase = Phase::Resolved;
                log::debug!("hold to flag at {:?}", cell);
                Some(Intent::Flag(cell))
            }
            _ => {
                timer.token.cancel();
                None
            }
        }
    }

    /// Drops any gesture in flight, e.g. when the game is reset.
    pub fn reset(&mut self) {
        self.end_pending();
        self.phase = Phase::Idle;
        self.active_pointers.clear();
    }

    /// Pointers still recorded when no gesture is pending lost their release somewhere off the
    /// board, so they are dropped instead of turning this press into a multi-touch.
    fn pointer_down(&mut self, id: PointerId, cell: Coord2) -> Reaction {
        if !matches!(self.phase, Phase::Pending { .. }) && !self.active_pointers.is_empty() {
            log::trace!("dropping stale pointers {:?}", self.active_pointers);
            self.active_pointers.clear();
        }
        if !self.active_pointers.contains(&id) {
            self.active_pointers.push(id);
        }

        if self.active_pointers.len() > 1 {
            self.cancel("second pointer");
            Reaction::Ignore
        } else {
            self.press(cell, PressSource::Pointer)
        }
    }

    fn forget_pointer(&mut self, id: PointerId) -> bool {
        match self.active_pointers.iter().position(|&active| active == id) {
            Some(index) => {
                self.active_pointers.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn press(&mut self, cell: Coord2, source: PressSource) -> Reaction {
        if let Phase::Pending {
            cell: pending_cell,
            source: pending_source,
            ..
        } = &mut self.phase
        {
            if *pending_cell == cell {
                // same physical press reported twice (pointer-down then touch-start)
                if let PressSource::Mouse(_) = source {
                    *pending_source = source;
                }
                return Reaction::Ignore;
            }
        }

        self.end_pending();
        let token = CancelToken::new();
        self.phase = Phase::Pending {
            cell,
            source,
            token: token.clone(),
        };
        Reaction::Schedule(HoldTimer {
            cell,
            delay: self.hold.as_duration(),
            token,
        })
    }

    fn release(&mut self, cell: Coord2) -> Reaction {
        match core::mem::take(&mut self.phase) {
            Phase::Pending {
                cell: pressed,
                source,
                token,
            } => {
                token.cancel();
                match source {
                    PressSource::Mouse(MouseButton::Secondary) => {
                        Reaction::Resolve(Intent::Flag(cell))
                    }
                    PressSource::Mouse(MouseButton::Other) => Reaction::Ignore,
                    _ if pressed == cell => Reaction::Resolve(Intent::Reveal(cell)),
                    _ => {
                        log::trace!("released on {:?} after pressing {:?}", cell, pressed);
                        Reaction::Ignore
                    }
                }
            }
            Phase::Cancelled if !self.active_pointers.is_empty() => {
                self.phase = Phase::Cancelled;
                Reaction::Ignore
            }
            Phase::Idle | Phase::Resolved | Phase::Cancelled => Reaction::Ignore,
        }
    }

    fn cancel(&mut self, reason: &str) {
        if matches!(self.phase, Phase::Pending { .. }) {
            log::trace!("gesture cancelled: {}", reason);
            self.end_pending();
            self.phase = Phase::Cancelled;
        }
    }

    fn end_pending(&mut self) {
        if let Phase::Pending { token, .. } = &self.phase {
            token.cancel();
        }
    }
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new(HoldDuration::default())
    }
}
