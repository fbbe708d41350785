use crate::clock::{fmt_countdown, Now, SECOND_MS};
use crate::error::Rejection;
use crate::sim::Game;
use tracing::info;

fn ms_until_midnight(now: &Now) -> i64 {
    let left_minutes = (24 * 60 - now.minutes as i64).max(0);
    left_minutes * 60 * SECOND_MS - now.ms.rem_euclid(60 * SECOND_MS)
}

impl Game {
    pub(crate) fn can_use_vault(&self, now: &Now) -> bool {
        self.player.vault.last_day != now.day
    }

    pub(crate) fn vault_status(&self, now: &Now) -> String {
        if self.can_use_vault(now) {
            "open".to_string()
        } else {
            format!("reopens in {}", fmt_countdown(ms_until_midnight(now)))
        }
    }

    pub(crate) fn vault_deposit(&mut self, now: &Now) -> Result<(), Rejection> {
        self.ensure_alive()?;
        if !self.can_use_vault(now) {
            return Err(Rejection::VaultUsedToday);
        }
        let step = self.rules.vault.step;
        if self.player.money < step {
            return Err(Rejection::NotEnoughToDeposit { needed: step });
        }
        self.player.money -= step;
        self.player.vault.cash += step;
        self.player.vault.last_day = now.day.clone();
        let msg = format!("Deposited ${step}. Vault holds ${}.", self.player.vault.cash);
        self.toast(msg);
        Ok(())
    }

    /// Withdrawing from an empty vault still uses up today's visit.
    pub(crate) fn vault_withdraw(&mut self, now: &Now) -> Result<(), Rejection> {
        self.ensure_alive()?;
        if !self.can_use_vault(now) {
            return Err(Rejection::VaultUsedToday);
        }
        self.player.vault.last_day = now.day.clone();
        let amount = self.rules.vault.step.min(self.player.vault.cash);
        if amount <= 0 {
            self.toast("The vault is empty.");
            return Ok(());
        }
        self.player.vault.cash -= amount;
        self.player.money += amount;
        let msg = format!("Withdrew ${amount}. Vault holds ${}.", self.player.vault.cash);
        self.toast(msg);
        Ok(())
    }

    pub(crate) fn job_status(&self, now: &Now) -> String {
        let p = &self.player;
        if !p.job_active() {
            if self.session.near_job_spot {
                "Phone: studio is free, start a content job".to_string()
            } else {
                "Phone: no job running".to_string()
            }
        } else if now.ms < p.content_job_ends_at {
            format!(
                "Phone: job rendering, {} left",
                fmt_countdown(p.content_job_ends_at - now.ms)
            )
        } else {
            format!("Phone: job done, collect ${}", p.content_job_reward)
        }
    }

    pub(crate) fn start_job(&mut self, now: &Now) -> Result<(), Rejection> {
        self.ensure_alive()?;
        if self.player.job_active() {
            return Err(Rejection::JobAlreadyRunning);
        }
        if !self.session.near_job_spot {
            return Err(Rejection::NotAtStudio);
        }
        self.player.content_job_ends_at = now.ms + self.rules.job.duration_ms;
        info!(ends_at = self.player.content_job_ends_at, "content job started");
        let msg = format!(
            "Content job started. Ready in {}.",
            fmt_countdown(self.rules.job.duration_ms)
        );
        self.toast(msg);
        Ok(())
    }

    pub(crate) fn collect_job(&mut self, now: &Now) -> Result<(), Rejection> {
        self.ensure_alive()?;
        let ends_at = self.player.content_job_ends_at;
        if ends_at <= 0 {
            return Err(Rejection::NoJobRunning);
        }
        if now.ms < ends_at {
            return Err(Rejection::JobNotReady {
                remaining: fmt_countdown(ends_at - now.ms),
            });
        }
        let reward = self.player.content_job_reward;
        self.player.money += reward;
        self.player.content_job_ends_at = 0;
        self.toast(format!("Job paid out ${reward}."));
        Ok(())
    }

    pub(crate) fn eat_meal(&mut self) -> Result<(), Rejection> {
        self.ensure_alive()?;
        let s = &self.rules.services;
        if self.player.money < s.meal_cost {
            return Err(Rejection::NotEnoughMoney {
                needed: s.meal_cost,
            });
        }
        self.player.money -= s.meal_cost;
        self.player.needs.hunger += s.meal_hunger;
        self.player.needs.clamp();
        self.toast("Hot plate. Hunger restored.");
        Ok(())
    }

    pub(crate) fn sleep_at_home(&mut self) -> Result<(), Rejection> {
        self.ensure_alive()?;
        if self.player.evicted {
            return Err(Rejection::Evicted);
        }
        self.player.needs.sleep += self.rules.services.bed_sleep;
        self.player.needs.clamp();
        self.toast("You nap for a while. Rested.");
        Ok(())
    }

    pub(crate) fn shower(&mut self) -> Result<(), Rejection> {
        self.ensure_alive()?;
        if self.player.evicted {
            return Err(Rejection::Evicted);
        }
        self.player.needs.hygiene += self.rules.services.shower_hygiene;
        self.player.needs.clamp();
        self.toast("Fresh and clean.");
        Ok(())
    }

    pub(crate) fn work_out(&mut self) -> Result<(), Rejection> {
        self.ensure_alive()?;
        let s = &self.rules.services;
        if self.player.stamina < s.gym_stamina {
            return Err(Rejection::NotEnoughStamina {
                needed: s.gym_stamina as i64,
            });
        }
        self.player.stamina -= s.gym_stamina;
        self.player.needs.hunger -= s.gym_hunger;
        self.player.needs.fitness += s.gym_fitness;
        self.player.needs.clamp();
        self.apply_debuffs();
        self.toast("Good session. Fitness up.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::{Now, DAY_MS};
    use crate::error::Rejection;
    use crate::sim::tests::{game, T0};

    #[test]
    fn vault_round_trip_same_day() {
        let mut g = game();
        g.player.money = 100;
        g.player.vault.cash = 0;
        let now = Now::at(T0);

        g.vault_deposit(&now).unwrap();
        assert_eq!(g.player.money, 50);
        assert_eq!(g.player.vault.cash, 50);
        assert!(!g.can_use_vault(&now));

        assert_eq!(g.vault_withdraw(&now), Err(Rejection::VaultUsedToday));
        assert_eq!(g.player.money, 50);
        assert_eq!(g.player.vault.cash, 50);
    }

    #[test]
    fn vault_single_use_any_combination() {
        let now = Now::at(T0);
        type Op = fn(&mut crate::sim::Game, &Now) -> Result<(), Rejection>;
        let ops: [Op; 2] = [
            |g: &mut crate::sim::Game, n: &Now| g.vault_deposit(n),
            |g: &mut crate::sim::Game, n: &Now| g.vault_withdraw(n),
        ];
        for first in ops {
            for second in ops {
                let mut g = game();
                g.player.money = 500;
                g.player.vault.cash = 200;
                first(&mut g, &now).unwrap();
                let (money, cash) = (g.player.money, g.player.vault.cash);
                assert_eq!(second(&mut g, &now), Err(Rejection::VaultUsedToday));
                assert_eq!((g.player.money, g.player.vault.cash), (money, cash));
            }
        }
    }

    #[test]
    fn empty_withdraw_still_locks_the_day() {
        let mut g = game();
        let now = Now::at(T0);
        g.vault_withdraw(&now).unwrap();
        assert_eq!(g.player.vault.last_day, now.day);
        assert_eq!(g.vault_deposit(&now), Err(Rejection::VaultUsedToday));
        assert!(g.can_use_vault(&now.later(DAY_MS)));
    }

    #[test]
    fn withdraw_caps_at_step_and_balance() {
        let mut g = game();
        g.player.money = 0;
        g.player.vault.cash = 30;
        g.vault_withdraw(&Now::at(T0)).unwrap();
        assert_eq!((g.player.money, g.player.vault.cash), (30, 0));

        g.player.vault.cash = 120;
        g.vault_withdraw(&Now::at(T0 + DAY_MS)).unwrap();
        assert_eq!((g.player.money, g.player.vault.cash), (80, 70));
    }

    #[test]
    fn deposit_needs_fifty_on_hand() {
        let mut g = game();
        g.player.money = 49;
        let now = Now::at(T0);
        assert_eq!(
            g.vault_deposit(&now),
            Err(Rejection::NotEnoughToDeposit { needed: 50 })
        );
        assert_eq!(g.player.money, 49);
        assert!(g.can_use_vault(&now));
    }

    #[test]
    fn job_is_exclusive_and_pays_once() {
        let mut g = game();
        g.session.near_job_spot = true;
        let now = Now::at(T0);
        let money = g.player.money;

        g.start_job(&now).unwrap();
        let ends = g.player.content_job_ends_at;
        assert_eq!(ends, T0 + 60_000);

        let later = Now::at(T0 + 10_000);
        assert_eq!(g.start_job(&later), Err(Rejection::JobAlreadyRunning));
        assert_eq!(g.player.content_job_ends_at, ends);

        assert!(matches!(
            g.collect_job(&later),
            Err(Rejection::JobNotReady { .. })
        ));
        assert_eq!(g.player.money, money);

        let done = Now::at(ends);
        g.collect_job(&done).unwrap();
        assert_eq!(g.player.money, money + g.player.content_job_reward);
        assert_eq!(g.player.content_job_ends_at, 0);

        assert_eq!(g.collect_job(&done), Err(Rejection::NoJobRunning));
        assert_eq!(g.player.money, money + g.player.content_job_reward);
    }

    #[test]
    fn job_needs_the_studio() {
        let mut g = game();
        g.session.near_job_spot = false;
        assert_eq!(g.start_job(&Now::at(T0)), Err(Rejection::NotAtStudio));
        assert_eq!(g.player.content_job_ends_at, 0);
    }

    #[test]
    fn services_reject_without_changes() {
        let mut g = game();
        g.player.money = 5;
        let before = g.player.clone();
        assert!(g.eat_meal().is_err());
        assert_eq!(g.player, before);

        g.player.evicted = true;
        let before = g.player.clone();
        assert_eq!(g.sleep_at_home(), Err(Rejection::Evicted));
        assert_eq!(g.shower(), Err(Rejection::Evicted));
        assert_eq!(g.player, before);

        g.player.stamina = 10.0;
        let before = g.player.clone();
        assert!(g.work_out().is_err());
        assert_eq!(g.player, before);
    }

    #[test]
    fn meal_restores_hunger_clamped() {
        let mut g = game();
        g.player.needs.hunger = 90.0;
        g.player.money = 20;
        g.eat_meal().unwrap();
        assert_eq!(g.player.needs.hunger, 100.0);
        assert_eq!(g.player.money, 8);
    }

    #[test]
    fn dead_players_cannot_bank() {
        let mut g = game();
        g.session.dead = true;
        let now = Now::at(T0);
        assert_eq!(g.vault_deposit(&now), Err(Rejection::Dead));
        assert_eq!(g.start_job(&now), Err(Rejection::Dead));
    }
}
