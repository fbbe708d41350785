use crate::clock::plausible_ms;
use crate::config::atomic_rename;
use crate::model::{
    Needs, PlayerState, Quests, Role, Rules, Timers, Vault, MONEY_CAP, SAVE_VERSION,
};
use crate::world::World;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fs, path::PathBuf};
use tracing::warn;

/// A field that fails to parse is treated as missing rather than failing the save.
fn lenient<'de, D, T>(d: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(d)?;
    Ok(serde_json::from_value(v).ok())
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub(crate) struct Meta {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) last_seen_at: Option<i64>,
}

impl Meta {
    /// Last time the run was seen alive, if the stored value is usable.
    pub(crate) fn last_seen(&self, now_ms: i64) -> Option<i64> {
        self.last_seen_at.filter(|t| plausible_ms(*t, now_ms))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub(crate) struct VaultSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) cash: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) last_day: Option<String>,
}

/// Every field optional: older or hand-edited saves load with defaults filled in.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub(crate) struct PlayerSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) role: Option<Role>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) x: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) y: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) money: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) area: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) stamina: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) stamina_max: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) facing: Option<[f32; 2]>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) health: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) health_max: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) hunger: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) sleep: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) hygiene: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) fitness: Option<f32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) rent_due_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) rent_debt: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) evicted: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) vault: Option<VaultSnapshot>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) content_job_ends_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) content_job_reward: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) q_flyers_accepted: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) q_flyers_done: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) q_show_done_day: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub(crate) struct SaveFile {
    #[serde(default)]
    pub(crate) version: u32,
    #[serde(default, deserialize_with = "lenient_meta")]
    pub(crate) meta: Meta,
    #[serde(default, deserialize_with = "lenient_player")]
    pub(crate) player: PlayerSnapshot,
}

fn lenient_meta<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Meta, D::Error> {
    Ok(lenient(d)?.unwrap_or_default())
}

fn lenient_player<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<PlayerSnapshot, D::Error> {
    Ok(lenient(d)?.unwrap_or_default())
}

impl SaveFile {
    pub(crate) fn capture(player: &PlayerState, now_ms: i64) -> Self {
        Self {
            version: SAVE_VERSION,
            meta: Meta {
                last_seen_at: Some(now_ms),
            },
            player: PlayerSnapshot::from(player),
        }
    }
}

impl From<&PlayerState> for PlayerSnapshot {
    fn from(p: &PlayerState) -> Self {
        Self {
            role: Some(p.role),
            x: Some(p.x),
            y: Some(p.y),
            money: Some(p.money),
            area: Some(p.area.clone()),
            stamina: Some(p.stamina),
            stamina_max: Some(p.stamina_max),
            facing: Some([p.facing.0, p.facing.1]),
            health: Some(p.health),
            health_max: Some(p.health_max),
            hunger: Some(p.needs.hunger),
            sleep: Some(p.needs.sleep),
            hygiene: Some(p.needs.hygiene),
            fitness: Some(p.needs.fitness),
            rent_due_at: Some(p.rent_due_at),
            rent_debt: Some(p.rent_debt),
            evicted: Some(p.evicted),
            vault: Some(VaultSnapshot {
                cash: Some(p.vault.cash),
                last_day: Some(p.vault.last_day.clone()),
            }),
            content_job_ends_at: Some(p.content_job_ends_at),
            content_job_reward: Some(p.content_job_reward),
            q_flyers_accepted: Some(p.quests.flyers_accepted),
            q_flyers_done: Some(p.quests.flyers_done),
            q_show_done_day: Some(p.quests.show_done_day.clone()),
        }
    }
}

fn finite(v: Option<f32>) -> Option<f32> {
    v.filter(|v| v.is_finite())
}

impl PlayerSnapshot {
    /// Overlay this snapshot on a fresh player and restore every invariant.
    pub(crate) fn into_state(self, now_ms: i64, world: &dyn World, rules: &Rules) -> PlayerState {
        let role = self.role.unwrap_or_default();
        let base = PlayerState::fresh(role, &world.spawn(role), now_ms, rules);

        let health_max = finite(self.health_max)
            .filter(|m| *m > 0.0)
            .unwrap_or(base.health_max);
        let stamina_max = finite(self.stamina_max)
            .filter(|m| *m > 0.0)
            .unwrap_or(base.stamina_max);
        let mut needs = Needs {
            hunger: finite(self.hunger).unwrap_or(base.needs.hunger),
            sleep: finite(self.sleep).unwrap_or(base.needs.sleep),
            hygiene: finite(self.hygiene).unwrap_or(base.needs.hygiene),
            fitness: finite(self.fitness).unwrap_or(base.needs.fitness),
        };
        needs.clamp();
        let facing = self
            .facing
            .filter(|f| f.iter().all(|v| v.is_finite()) && (f[0] != 0.0 || f[1] != 0.0))
            .map(|f| (f[0], f[1]))
            .unwrap_or(base.facing);
        let vault = self.vault.unwrap_or_default();
        let content_job_ends_at = self
            .content_job_ends_at
            .filter(|t| plausible_ms(*t, now_ms))
            .unwrap_or(0);
        let amount = |v: Option<i64>| v.unwrap_or(0).clamp(0, MONEY_CAP);
        let flyers_done = self.q_flyers_done.unwrap_or(false);

        PlayerState {
            role,
            x: finite(self.x).unwrap_or(base.x),
            y: finite(self.y).unwrap_or(base.y),
            facing,
            area: self.area.unwrap_or(base.area),
            timers: Timers::default(),
            stamina: finite(self.stamina)
                .unwrap_or(stamina_max)
                .clamp(0.0, stamina_max),
            stamina_max,
            needs,
            health: finite(self.health)
                .unwrap_or(health_max)
                .clamp(0.0, health_max),
            health_max,
            money: self
                .money
                .filter(|m| (0..=MONEY_CAP).contains(m))
                .unwrap_or(base.money),
            rent_due_at: self
                .rent_due_at
                .filter(|t| plausible_ms(*t, now_ms))
                .unwrap_or(base.rent_due_at),
            rent_debt: amount(self.rent_debt),
            evicted: self.evicted.unwrap_or(false),
            vault: Vault {
                cash: amount(vault.cash),
                last_day: vault.last_day.unwrap_or_default(),
            },
            content_job_ends_at,
            content_job_reward: self
                .content_job_reward
                .filter(|r| (1..=MONEY_CAP).contains(r))
                .unwrap_or(base.content_job_reward),
            quests: Quests {
                flyers_accepted: self.q_flyers_accepted.unwrap_or(false) || flyers_done,
                flyers_done,
                show_done_day: self.q_show_done_day.unwrap_or_default(),
            },
        }
    }
}

/// Where the one save slot lives.
pub(crate) trait SaveStore {
    fn load(&self) -> Result<Option<SaveFile>>;
    fn write(&mut self, save: &SaveFile) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

pub(crate) struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SaveStore for JsonFileStore {
    fn load(&self) -> Result<Option<SaveFile>> {
        let s = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        match serde_json::from_str::<SaveFile>(&s) {
            Ok(save) => Ok(Some(save)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable save ignored");
                Ok(None)
            }
        }
    }

    fn write(&mut self, save: &SaveFile) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(save)?;
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        atomic_rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) slot: Option<SaveFile>,
}

#[cfg(test)]
impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<SaveFile>> {
        Ok(self.slot.clone())
    }

    fn write(&mut self, save: &SaveFile) -> Result<()> {
        self.slot = Some(save.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}
