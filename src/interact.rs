use crate::clock::Now;
use crate::error::Rejection;
use crate::sim::Game;
use crate::world::{LandmarkKind, NpcKind, NpcRegistry, World};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PlayerAction {
    Interact,
    InteractAlt,
    Phone,
    Respawn,
    ToggleOverlay,
    NewGame,
    Continue,
    CycleRole,
    Quit,
}

impl Game {
    /// Context-sensitive use key. NPCs in talking range win over landmarks.
    pub(crate) fn interact(
        &mut self,
        alt: bool,
        now: &Now,
        world: &dyn World,
        npcs: &dyn NpcRegistry,
    ) -> Result<(), Rejection> {
        self.ensure_alive()?;
        let (x, y) = (self.player.x, self.player.y);

        if let Some(npc) = npcs.nearest(x, y, self.rules.talk_radius) {
            return match npc.kind {
                NpcKind::Agent => self.talk_to_agent(),
                NpcKind::Townie => {
                    self.talk_to(npc, npcs);
                    Ok(())
                }
            };
        }

        let Some(landmark) = world.nearest_landmark(x, y, self.rules.landmark_radius) else {
            return Err(Rejection::NothingHere);
        };
        match (landmark.kind, alt) {
            (LandmarkKind::Vault, false) => self.vault_deposit(now),
            (LandmarkKind::Vault, true) => self.vault_withdraw(now),
            (LandmarkKind::Studio, _) if self.player.job_active() => self.collect_job(now),
            (LandmarkKind::Studio, _) => self.start_job(now),
            (LandmarkKind::Stage, _) => self.play_show(now),
            (LandmarkKind::Diner, _) => self.eat_meal(),
            (LandmarkKind::Home, false) => self.sleep_at_home(),
            (LandmarkKind::Home, true) => self.shower(),
            (LandmarkKind::Gym, _) => self.work_out(),
            (LandmarkKind::Park, _) => {
                self.toast("Kids chase pigeons around the fountain.");
                Ok(())
            }
        }
    }

    pub(crate) fn prompt(&self, now: &Now, world: &dyn World, npcs: &dyn NpcRegistry) -> String {
        if self.is_dead() {
            return String::new();
        }
        let (x, y) = (self.player.x, self.player.y);
        if let Some(npc) = npcs.nearest(x, y, self.rules.talk_radius) {
            return format!("[E] talk to {}", npc.name);
        }
        let Some(landmark) = world.nearest_landmark(x, y, self.rules.landmark_radius) else {
            return String::new();
        };
        match landmark.kind {
            LandmarkKind::Vault if self.can_use_vault(now) => {
                "[E] deposit $50  [R] withdraw $50".to_string()
            }
            LandmarkKind::Vault => "Vault used today".to_string(),
            LandmarkKind::Studio if self.player.job_active() => "[E] collect content job".to_string(),
            LandmarkKind::Studio => "[E] start a content job".to_string(),
            LandmarkKind::Stage if self.show_open(now) => "[E] perform the 8PM show".to_string(),
            LandmarkKind::Stage => format!("Stage: show {}", self.show_status(now)),
            LandmarkKind::Diner => format!("[E] eat (${})", self.rules.services.meal_cost),
            LandmarkKind::Home if self.player.evicted => "Home: locked out".to_string(),
            LandmarkKind::Home => "[E] sleep  [R] shower".to_string(),
            LandmarkKind::Gym => "[E] work out".to_string(),
            LandmarkKind::Park => format!("[E] look around {}", landmark.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::Now;
    use crate::error::Rejection;
    use crate::model::FlyersStage;
    use crate::sim::tests::{game_at, T0};
    use crate::world::{Town, Townsfolk};

    #[test]
    fn agent_dialogue_accepts_the_gig() {
        let town = Town::standard();
        let folk = Townsfolk::standard();
        let mut g = game_at(668.0, 222.0);
        assert!(g.prompt(&Now::at(T0), &town, &folk).contains("Rita"));
        g.interact(false, &Now::at(T0), &town, &folk).unwrap();
        assert_eq!(g.player.quests.flyers(), FlyersStage::InProgress);
    }

    #[test]
    fn townie_opens_dialogue() {
        let town = Town::standard();
        let folk = Townsfolk::standard();
        let mut g = game_at(240.0, 210.0);
        g.interact(false, &Now::at(T0), &town, &folk).unwrap();
        let d = g.session.dialogue.as_ref().map(|d| d.name.clone());
        assert_eq!(d.as_deref(), Some("Sal"));
    }

    #[test]
    fn vault_keys_pick_direction() {
        let town = Town::standard();
        let folk = Townsfolk::standard();
        let now = Now::at(T0);
        let mut g = game_at(100.0, 150.0);
        g.player.money = 100;
        g.interact(false, &now, &town, &folk).unwrap();
        assert_eq!(g.player.vault.cash, 50);
        assert_eq!(
            g.interact(true, &now, &town, &folk),
            Err(Rejection::VaultUsedToday)
        );
        assert_eq!(g.prompt(&now, &town, &folk), "Vault used today");
    }

    #[test]
    fn open_field_has_nothing() {
        let town = Town::standard();
        let folk = Townsfolk::standard();
        let mut g = game_at(480.0, 320.0);
        assert_eq!(
            g.interact(false, &Now::at(T0), &town, &folk),
            Err(Rejection::NothingHere)
        );
        assert!(g.prompt(&Now::at(T0), &town, &folk).is_empty());
    }
}
