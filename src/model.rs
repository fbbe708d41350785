use crate::clock::DAY_MS;
use crate::world::Spawn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub(crate) const SAVE_VERSION: u32 = 2;

/// Upper bound for any stored amount of cash.
pub(crate) const MONEY_CAP: i64 = 1_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Menu,
    Play,
    Dead,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    #[default]
    Actor,
    Thug,
    Police,
}

impl Role {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Role::Actor => "actor",
            Role::Thug => "thug",
            Role::Police => "police",
        }
    }

    pub(crate) fn next(self) -> Self {
        match self {
            Role::Actor => Role::Thug,
            Role::Thug => Role::Police,
            Role::Police => Role::Actor,
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "actor" => Ok(Role::Actor),
            "thug" => Ok(Role::Thug),
            "police" => Ok(Role::Police),
            other => Err(format!("unknown role `{other}` (actor, thug, police)")),
        }
    }
}

/// Action timers in seconds. All of them count down to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Timers {
    pub(crate) jump: f32,
    pub(crate) dodge: f32,
    pub(crate) dodge_cd: f32,
    pub(crate) punch: f32,
    pub(crate) punch_cd: f32,
    pub(crate) iframes: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Needs {
    pub(crate) hunger: f32,
    pub(crate) sleep: f32,
    pub(crate) hygiene: f32,
    pub(crate) fitness: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 80.0,
            sleep: 80.0,
            hygiene: 80.0,
            fitness: 60.0,
        }
    }
}

impl Needs {
    pub(crate) fn clamp(&mut self) {
        self.hunger = self.hunger.clamp(0.0, 100.0);
        self.sleep = self.sleep.clamp(0.0, 100.0);
        self.hygiene = self.hygiene.clamp(0.0, 100.0);
        self.fitness = self.fitness.clamp(0.0, 100.0);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Vault {
    pub(crate) cash: i64,
    /// Day key of the last deposit or withdrawal.
    pub(crate) last_day: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Quests {
    pub(crate) flyers_accepted: bool,
    pub(crate) flyers_done: bool,
    pub(crate) show_done_day: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlyersStage {
    NotAccepted,
    InProgress,
    Done,
}

impl Quests {
    pub(crate) fn flyers(&self) -> FlyersStage {
        if self.flyers_done {
            FlyersStage::Done
        } else if self.flyers_accepted {
            FlyersStage::InProgress
        } else {
            FlyersStage::NotAccepted
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PlayerState {
    pub(crate) role: Role,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) facing: (f32, f32),
    pub(crate) area: String,
    pub(crate) timers: Timers,
    pub(crate) stamina: f32,
    pub(crate) stamina_max: f32,
    pub(crate) needs: Needs,
    pub(crate) health: f32,
    pub(crate) health_max: f32,
    pub(crate) money: i64,
    pub(crate) rent_due_at: i64,
    pub(crate) rent_debt: i64,
    pub(crate) evicted: bool,
    pub(crate) vault: Vault,
    pub(crate) content_job_ends_at: i64,
    pub(crate) content_job_reward: i64,
    pub(crate) quests: Quests,
}

impl PlayerState {
    pub(crate) fn fresh(role: Role, spawn: &Spawn, now_ms: i64, rules: &Rules) -> Self {
        Self {
            role,
            x: spawn.x,
            y: spawn.y,
            facing: (0.0, 1.0),
            area: spawn.area.clone().unwrap_or_default(),
            timers: Timers::default(),
            stamina: 100.0,
            stamina_max: 100.0,
            needs: Needs::default(),
            health: 100.0,
            health_max: 100.0,
            money: 120,
            rent_due_at: now_ms + rules.rent.period_days * DAY_MS,
            rent_debt: 0,
            evicted: false,
            vault: Vault::default(),
            content_job_ends_at: 0,
            content_job_reward: rules.job.reward,
            quests: Quests::default(),
        }
    }

    pub(crate) fn job_active(&self) -> bool {
        self.content_job_ends_at > 0
    }
}

/// Short-lived visual effect left behind by an action.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Fx {
    pub(crate) kind: FxKind,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) ttl: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FxKind {
    Dust,
    Swing,
    Hop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Dialogue {
    pub(crate) npc_id: u32,
    pub(crate) name: String,
    pub(crate) lines: Vec<String>,
}

/// Per-run state that is never persisted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Session {
    pub(crate) fx: Vec<Fx>,
    pub(crate) dialogue: Option<Dialogue>,
    pub(crate) flyers_delivered: bool,
    pub(crate) dead: bool,
    pub(crate) death_timer: f32,
    pub(crate) hurt_toast_t: f32,
    pub(crate) autosave_t: f32,
    pub(crate) near_job_spot: bool,
    pub(crate) speed_mul: f32,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            fx: Vec::new(),
            dialogue: None,
            flyers_delivered: false,
            dead: false,
            death_timer: 0.0,
            hurt_toast_t: 0.0,
            autosave_t: 0.0,
            near_job_spot: false,
            speed_mul: 1.0,
        }
    }
}

/// Things the engine wants the outside world to do or show. Drained every frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Toast(String),
    Save,
    ClearSave,
    Died,
    ReturnToMenu,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DecayRates {
    pub(crate) hunger: f32,
    pub(crate) sleep: f32,
    pub(crate) hygiene: f32,
    pub(crate) fitness: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Debuff {
    pub(crate) speed: f32,
    pub(crate) stamina: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NeedRules {
    pub(crate) decay: DecayRates,
    pub(crate) low_at: f32,
    pub(crate) hunger_low: Debuff,
    pub(crate) sleep_low: Debuff,
    pub(crate) hygiene_low: Debuff,
    pub(crate) fitness_low: Debuff,
    pub(crate) stamina_floor: f32,
    /// Health lost per second while the need sits at zero.
    pub(crate) hunger_dmg: f32,
    pub(crate) sleep_dmg: f32,
    pub(crate) hygiene_dmg: f32,
    pub(crate) hurt_toast_every: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MoveRules {
    pub(crate) speed: f32,
    pub(crate) sprint_mul: f32,
    pub(crate) sprint_drain: f32,
    pub(crate) stamina_regen: f32,
    pub(crate) step_px: f32,
    pub(crate) half_size: f32,
    pub(crate) dodge_secs: f32,
    pub(crate) dodge_cd: f32,
    pub(crate) dodge_cost: f32,
    pub(crate) dodge_mul: f32,
    pub(crate) jump_secs: f32,
    pub(crate) punch_secs: f32,
    pub(crate) punch_cd: f32,
    pub(crate) punch_cost: f32,
    pub(crate) fx_ttl: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RentRules {
    pub(crate) period_days: i64,
    pub(crate) per_day: i64,
    /// Overdue time after which the player is evicted.
    pub(crate) evict_after_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VaultRules {
    pub(crate) step: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct JobRules {
    pub(crate) duration_ms: i64,
    pub(crate) reward: i64,
    pub(crate) spot_radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct QuestRules {
    pub(crate) flyers_pay: i64,
    pub(crate) tip_min: i64,
    pub(crate) tip_max: i64,
    pub(crate) show_at_minutes: u32,
    pub(crate) show_window_minutes: u32,
    pub(crate) show_tip_min: i64,
    pub(crate) show_tip_max: i64,
    pub(crate) show_hunger_cost: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ServiceRules {
    pub(crate) meal_cost: i64,
    pub(crate) meal_hunger: f32,
    pub(crate) bed_sleep: f32,
    pub(crate) shower_hygiene: f32,
    pub(crate) gym_stamina: f32,
    pub(crate) gym_hunger: f32,
    pub(crate) gym_fitness: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OfflineRules {
    pub(crate) max_secs: i64,
    pub(crate) health_per_sec: f32,
    pub(crate) health_cap: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Rules {
    pub(crate) needs: NeedRules,
    pub(crate) movement: MoveRules,
    pub(crate) rent: RentRules,
    pub(crate) vault: VaultRules,
    pub(crate) job: JobRules,
    pub(crate) quest: QuestRules,
    pub(crate) services: ServiceRules,
    pub(crate) offline: OfflineRules,
    pub(crate) autosave_every: f32,
    pub(crate) death_delay: f32,
    pub(crate) max_dt: f32,
    pub(crate) talk_radius: f32,
    pub(crate) landmark_radius: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            needs: NeedRules {
                decay: DecayRates {
                    hunger: 0.12,
                    sleep: 0.08,
                    hygiene: 0.06,
                    fitness: 0.04,
                },
                low_at: 20.0,
                hunger_low: Debuff {
                    speed: 0.80,
                    stamina: 0.70,
                },
                sleep_low: Debuff {
                    speed: 0.85,
                    stamina: 0.75,
                },
                hygiene_low: Debuff {
                    speed: 0.93,
                    stamina: 1.0,
                },
                fitness_low: Debuff {
                    speed: 0.90,
                    stamina: 1.0,
                },
                stamina_floor: 40.0,
                hunger_dmg: 6.0,
                sleep_dmg: 4.0,
                hygiene_dmg: 2.0,
                hurt_toast_every: 3.5,
            },
            movement: MoveRules {
                speed: 140.0,
                sprint_mul: 1.6,
                sprint_drain: 25.0,
                stamina_regen: 18.0,
                step_px: 4.0,
                half_size: 6.0,
                dodge_secs: 0.25,
                dodge_cd: 0.8,
                dodge_cost: 20.0,
                dodge_mul: 2.0,
                jump_secs: 0.45,
                punch_secs: 0.2,
                punch_cd: 0.45,
                punch_cost: 8.0,
                fx_ttl: 0.4,
            },
            rent: RentRules {
                period_days: 3,
                per_day: 45,
                evict_after_ms: DAY_MS * 3 / 2,
            },
            vault: VaultRules { step: 50 },
            job: JobRules {
                duration_ms: 60_000,
                reward: 120,
                spot_radius: 70.0,
            },
            quest: QuestRules {
                flyers_pay: 60,
                tip_min: 15,
                tip_max: 40,
                show_at_minutes: 20 * 60,
                show_window_minutes: 60,
                show_tip_min: 60,
                show_tip_max: 140,
                show_hunger_cost: 8.0,
            },
            services: ServiceRules {
                meal_cost: 12,
                meal_hunger: 40.0,
                bed_sleep: 45.0,
                shower_hygiene: 50.0,
                gym_stamina: 30.0,
                gym_hunger: 4.0,
                gym_fitness: 20.0,
            },
            offline: OfflineRules {
                max_secs: 7 * 24 * 3600,
                health_per_sec: 0.02,
                health_cap: 50.0,
            },
            autosave_every: 1.5,
            death_delay: 2.5,
            max_dt: 0.033,
            talk_radius: 48.0,
            landmark_radius: 70.0,
        }
    }
}

/// Held input for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Controls {
    pub(crate) dx: f32,
    pub(crate) dy: f32,
    pub(crate) sprint: bool,
    pub(crate) jump: bool,
    pub(crate) dodge: bool,
    pub(crate) punch: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CatchupSummary {
    pub(crate) elapsed_secs: i64,
    pub(crate) capped: bool,
    pub(crate) health_lost: f32,
}

impl CatchupSummary {
    pub(crate) fn has_anything(&self) -> bool {
        self.elapsed_secs >= 60 || self.health_lost > 0.0
    }
}

/// Snapshot handed to the HUD each frame.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Hud {
    pub(crate) role: Role,
    pub(crate) area: String,
    pub(crate) money: i64,
    pub(crate) stamina: f32,
    pub(crate) stamina_max: f32,
    pub(crate) needs: Needs,
    pub(crate) health: f32,
    pub(crate) health_max: f32,
    pub(crate) rent: String,
    pub(crate) vault: String,
    pub(crate) show: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct QuestLine {
    pub(crate) title: &'static str,
    pub(crate) status: String,
    pub(crate) done: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Overlay {
    pub(crate) vault: String,
    pub(crate) phone: String,
    pub(crate) quests: Vec<QuestLine>,
    pub(crate) dialogue: Option<Dialogue>,
}
