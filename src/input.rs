use crate::interact::PlayerAction;
use crate::model::{Controls, Scene};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

/// Terminals rarely report key releases, so a press keeps a direction held
/// for a short while and auto-repeat refreshes it.
const HOLD: Duration = Duration::from_millis(180);

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

#[derive(Clone, Debug, Default)]
pub(crate) struct HeldKeys {
    up: Option<Instant>,
    down: Option<Instant>,
    left: Option<Instant>,
    right: Option<Instant>,
    sprint: Option<Instant>,
    jump: bool,
    dodge: bool,
    punch: bool,
}

impl HeldKeys {
    /// Returns true when the key was a movement or combat key.
    pub(crate) fn feed(&mut self, ev: &InputEvent, at: Instant) -> bool {
        let until = Some(at + HOLD);
        let shifted = ev.mods.contains(KeyModifiers::SHIFT)
            || matches!(ev.key, KeyCode::Char(c) if c.is_ascii_uppercase());
        let slot = match ev.key {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => &mut self.up,
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => &mut self.down,
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => &mut self.left,
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => &mut self.right,
            KeyCode::Char(' ') => {
                self.jump = true;
                return true;
            }
            KeyCode::Char('k') => {
                self.dodge = true;
                return true;
            }
            KeyCode::Char('j') => {
                self.punch = true;
                return true;
            }
            _ => return false,
        };
        *slot = until;
        if shifted {
            self.sprint = until;
        }
        true
    }

    /// Held directions for this frame; one-shot actions are consumed.
    pub(crate) fn controls(&mut self, at: Instant) -> Controls {
        let held = |t: Option<Instant>| t.is_some_and(|t| t > at);
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        let c = Controls {
            dx: axis(held(self.left), held(self.right)),
            dy: axis(held(self.up), held(self.down)),
            sprint: held(self.sprint),
            jump: self.jump,
            dodge: self.dodge,
            punch: self.punch,
        };
        self.jump = false;
        self.dodge = false;
        self.punch = false;
        c
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

pub(crate) fn map_event_to_action(scene: Scene, ev: &InputEvent) -> Option<PlayerAction> {
    if matches!(ev.key, KeyCode::Char('c')) && ev.mods.contains(KeyModifiers::CONTROL) {
        return Some(PlayerAction::Quit);
    }
    match (scene, ev.key) {
        (_, KeyCode::Char('q')) | (_, KeyCode::Esc) => Some(PlayerAction::Quit),
        (Scene::Menu, KeyCode::Char('n')) => Some(PlayerAction::NewGame),
        (Scene::Menu, KeyCode::Char('c')) | (Scene::Menu, KeyCode::Enter) => {
            Some(PlayerAction::Continue)
        }
        (Scene::Menu, KeyCode::Tab) => Some(PlayerAction::CycleRole),
        (Scene::Play, KeyCode::Char('e')) | (Scene::Play, KeyCode::Enter) => {
            Some(PlayerAction::Interact)
        }
        (Scene::Play, KeyCode::Char('r')) => Some(PlayerAction::InteractAlt),
        (Scene::Play, KeyCode::Char('p')) => Some(PlayerAction::Phone),
        (Scene::Play, KeyCode::Char('b')) => Some(PlayerAction::Respawn),
        (Scene::Play, KeyCode::Char('o')) | (Scene::Play, KeyCode::Tab) => {
            Some(PlayerAction::ToggleOverlay)
        }
        _ => None,
    }
}
