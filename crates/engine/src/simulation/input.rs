//! Input sampling for the hub simulation.
//!
//! Presentation pushes raw events as they happen; the world polls once per tick.
//! Held movement keys are level-triggered, everything else is an edge that is
//! consumed by the sample that sees it.

use glam::Vec2;

/// Movement keys the hub understands (WASD / arrows map onto these).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
}

/// Raw input from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(MoveKey),
    KeyUp(MoveKey),
    Jump,
    /// The "enter portal" key
    Interact,
    /// Accept the pending portal prompt
    Confirm,
    /// Dismiss the pending portal prompt
    Cancel,
    /// Pointer pick on a portal, by index in the hub portal list
    ClickPortal(usize),
    /// Pointer pick on an NPC, by index in the hub NPC list
    ClickNpc(usize),
    /// Camera orbit around the avatar, radians
    CameraYaw(f32),
}

/// Everything the world needs from one tick of input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    /// x: right positive, y: forward positive. Each axis in {-1, 0, 1}.
    pub intent: Vec2,
    pub jump: bool,
    pub interact: bool,
    pub confirm: bool,
    pub cancel: bool,
    pub clicked_portal: Option<usize>,
    pub clicked_npc: Option<usize>,
    pub camera_yaw: Option<f32>,
}

impl InputFrame {
    pub fn is_idle(&self) -> bool {
        self.intent == Vec2::ZERO
            && !self.jump
            && !self.interact
            && !self.confirm
            && !self.cancel
            && self.clicked_portal.is_none()
            && self.clicked_npc.is_none()
    }
}

#[derive(Debug, Default)]
struct HeldKeys {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
}

impl HeldKeys {
    fn set(&mut self, key: MoveKey, down: bool) {
        match key {
            MoveKey::Forward => self.forward = down,
            MoveKey::Back => self.back = down,
            MoveKey::Left => self.left = down,
            MoveKey::Right => self.right = down,
        }
    }

    /// Opposing keys cancel out.
    fn intent(&self) -> Vec2 {
        let axis = |pos: bool, neg: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        Vec2::new(axis(self.right, self.left), axis(self.forward, self.back))
    }
}

/// Queue of raw input events plus the current held-key state.
#[derive(Debug, Default)]
pub struct InputSampler {
    held: HeldKeys,
    events: Vec<InputEvent>,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain pending events into a frame. Held keys persist across samples.
    pub fn sample(&mut self) -> InputFrame {
        let mut frame = InputFrame::default();
        for event in std::mem::take(&mut self.events) {
            match event {
                InputEvent::KeyDown(key) => self.held.set(key, true),
                InputEvent::KeyUp(key) => self.held.set(key, false),
                InputEvent::Jump => frame.jump = true,
                InputEvent::Interact => frame.interact = true,
                InputEvent::Confirm => frame.confirm = true,
                InputEvent::Cancel => frame.cancel = true,
                InputEvent::ClickPortal(index) => frame.clicked_portal = Some(index),
                InputEvent::ClickNpc(index) => frame.clicked_npc = Some(index),
                InputEvent::CameraYaw(yaw) => frame.camera_yaw = Some(yaw),
            }
        }
        frame.intent = self.held.intent();
        frame
    }

    /// Release every key and drop pending events.
    pub fn reset(&mut self) {
        self.held = HeldKeys::default();
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_persist_and_edges_are_consumed() {
        let mut input = InputSampler::new();
        input.push(InputEvent::KeyDown(MoveKey::Forward));
        input.push(InputEvent::Jump);

        let first = input.sample();
        assert_eq!(first.intent, Vec2::new(0.0, 1.0));
        assert!(first.jump);

        let second = input.sample();
        assert_eq!(second.intent, Vec2::new(0.0, 1.0));
        assert!(!second.jump);
        assert!(input.is_empty());
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut input = InputSampler::new();
        input.push(InputEvent::KeyDown(MoveKey::Forward));
        input.push(InputEvent::KeyDown(MoveKey::Back));
        input.push(InputEvent::KeyDown(MoveKey::Left));
        assert_eq!(input.sample().intent, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn key_up_releases() {
        let mut input = InputSampler::new();
        input.push(InputEvent::KeyDown(MoveKey::Right));
        input.push(InputEvent::KeyUp(MoveKey::Right));
        let frame = input.sample();
        assert_eq!(frame.intent, Vec2::ZERO);
        assert!(frame.is_idle());
    }

    #[test]
    fn reset_drops_everything() {
        let mut input = InputSampler::new();
        input.push(InputEvent::KeyDown(MoveKey::Forward));
        input.sample();
        input.push(InputEvent::Interact);
        input.reset();
        assert!(input.sample().is_idle());
    }
}
