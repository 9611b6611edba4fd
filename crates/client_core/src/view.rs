//! Headless view model: what each control and message area shows.

use std::collections::HashMap;

use crate::controller::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlState {
    Enabled,
    /// Disabled with a spinner while its own request is in flight.
    Busy,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTarget {
    /// Rendered next to a form field.
    Field(&'static str),
    /// Rendered inside the open dialog.
    Dialog,
    /// Blocking alert over the page.
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub target: NoticeTarget,
    pub text: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, target: NoticeTarget, text: impl Into<String>) -> Self {
        Self {
            level,
            target,
            text: text.into(),
        }
    }

    pub fn field_error(field: &'static str, text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, NoticeTarget::Field(field), text)
    }

    pub fn dialog(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self::new(level, NoticeTarget::Dialog, text)
    }

    pub fn alert(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self::new(level, NoticeTarget::Alert, text)
    }
}

/// Body of a read-only dialog that loads its content once when opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<T> {
    Loading,
    /// Loaded, nothing to list.
    Empty,
    Ready(T),
    Failed(Notice),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Enabled/busy state of the triggering control of each action.
#[derive(Debug, Clone)]
pub struct Controls {
    states: HashMap<ActionKind, ControlState>,
}

impl Controls {
    pub fn new(initial: &[(ActionKind, ControlState)]) -> Self {
        Self {
            states: initial.iter().copied().collect(),
        }
    }

    pub fn state(&self, kind: ActionKind) -> ControlState {
        self.states
            .get(&kind)
            .copied()
            .unwrap_or(ControlState::Enabled)
    }

    pub fn is_busy(&self, kind: ActionKind) -> bool {
        self.state(kind) == ControlState::Busy
    }

    /// Marks the control busy. Returns `false` when it already was, which is
    /// how repeated activations of one control are serialized.
    pub fn begin(&mut self, kind: ActionKind) -> bool {
        if self.is_busy(kind) {
            return false;
        }
        self.states.insert(kind, ControlState::Busy);
        true
    }

    pub fn enable(&mut self, kind: ActionKind) {
        self.states.insert(kind, ControlState::Enabled);
    }

    pub fn disable(&mut self, kind: ActionKind) {
        self.states.insert(kind, ControlState::Disabled);
    }
}
