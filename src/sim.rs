use crate::clock::{countdown, fmt_countdown, Now, DAY_MS};
use crate::error::Rejection;
use crate::model::{
    CatchupSummary, Controls, Event, FlyersStage, Fx, FxKind, Hud, Overlay, PlayerState, Role,
    Rules, Session,
};
use crate::storage::SaveFile;
use crate::world::{LandmarkKind, NpcRegistry, Rect, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// The survival/economy engine. Owns the player record exclusively; the
/// outside world only sees it through `hud`, `overlay` and drained events.
pub(crate) struct Game {
    pub(crate) player: PlayerState,
    pub(crate) session: Session,
    pub(crate) rules: Rules,
    pub(crate) rng: StdRng,
    events: Vec<Event>,
}

impl Game {
    pub(crate) fn new_game(role: Role, world: &dyn World, now: &Now, rules: Rules, seed: u64) -> Self {
        let spawn = world.spawn(role);
        let player = PlayerState::fresh(role, &spawn, now.ms, &rules);
        info!(role = role.label(), rent_due_at = player.rent_due_at, "new game");
        let mut game = Self::resume(player, rules, seed);
        game.events.push(Event::Save);
        game
    }

    pub(crate) fn resume(player: PlayerState, rules: Rules, seed: u64) -> Self {
        let mut game = Self {
            player,
            session: Session::default(),
            rules,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        };
        game.apply_debuffs();
        game
    }

    /// Picks a saved run back up: fill in defaults, settle the time spent
    /// away, then resume. A player who starved offline dies on the first tick.
    pub(crate) fn continue_from(
        save: SaveFile,
        now: &Now,
        world: &dyn World,
        rules: Rules,
        seed: u64,
    ) -> Self {
        let last_seen = save.meta.last_seen(now.ms);
        let mut player = save.player.into_state(now.ms, world, &rules);
        let mut away = None;
        if let Some(last_seen) = last_seen {
            let summary = catch_up(&mut player, last_seen, now.ms, &rules);
            info!(
                elapsed_secs = summary.elapsed_secs,
                capped = summary.capped,
                health_lost = summary.health_lost,
                "offline catch-up"
            );
            if summary.has_anything() {
                away = Some(format!(
                    "You were away {}. Health lost: {:.0}.",
                    fmt_countdown(summary.elapsed_secs.saturating_mul(1000)),
                    summary.health_lost
                ));
            }
        }
        info!(version = save.version, role = player.role.label(), "continuing run");

        let mut game = Self::resume(player, rules, seed);
        if let Some(msg) = away {
            game.toast(msg);
        }
        game
    }

    pub(crate) fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn toast(&mut self, msg: impl Into<String>) {
        self.events.push(Event::Toast(msg.into()));
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.session.dead
    }

    /// Every player action is refused once the run is over.
    pub(crate) fn ensure_alive(&self) -> Result<(), Rejection> {
        if self.session.dead {
            Err(Rejection::Dead)
        } else {
            Ok(())
        }
    }

    pub(crate) fn tick(
        &mut self,
        dt: f32,
        controls: &Controls,
        now: &Now,
        world: &dyn World,
        npcs: &dyn NpcRegistry,
    ) {
        let dt = dt.max(0.0);

        if self.session.dead {
            if self.session.death_timer > 0.0 {
                countdown(&mut self.session.death_timer, dt);
                if self.session.death_timer <= 0.0 {
                    self.events.push(Event::ReturnToMenu);
                }
            }
            return;
        }

        self.tick_timers(dt);
        self.tick_movement(dt, controls, world);
        self.tick_needs(dt, now);
        if self.session.dead {
            return;
        }
        self.tick_surroundings(world, npcs);

        self.session.autosave_t += dt;
        if self.session.autosave_t >= self.rules.autosave_every {
            self.session.autosave_t = 0.0;
            self.events.push(Event::Save);
        }
    }

    fn tick_timers(&mut self, dt: f32) {
        let t = &mut self.player.timers;
        for timer in [
            &mut t.jump,
            &mut t.dodge,
            &mut t.dodge_cd,
            &mut t.punch,
            &mut t.punch_cd,
            &mut t.iframes,
        ] {
            countdown(timer, dt);
        }

        for fx in &mut self.session.fx {
            countdown(&mut fx.ttl, dt);
        }
        self.session.fx.retain(|fx| fx.ttl > 0.0);
    }

    fn tick_movement(&mut self, dt: f32, c: &Controls, world: &dyn World) {
        let m = &self.rules.movement;
        let p = &mut self.player;

        let len = (c.dx * c.dx + c.dy * c.dy).sqrt();
        let moving = len > 1e-3;
        let (mut dx, mut dy) = if moving {
            (c.dx / len, c.dy / len)
        } else {
            (0.0, 0.0)
        };
        if moving {
            p.facing = (dx, dy);
        }

        let mut fx = Vec::new();
        if c.dodge && p.timers.dodge_cd <= 0.0 && p.stamina >= m.dodge_cost {
            p.timers.dodge = m.dodge_secs;
            p.timers.dodge_cd = m.dodge_cd;
            p.timers.iframes = m.dodge_secs;
            p.stamina -= m.dodge_cost;
            fx.push(FxKind::Dust);
        }
        if c.jump && p.timers.jump <= 0.0 {
            p.timers.jump = m.jump_secs;
            fx.push(FxKind::Hop);
        }
        if c.punch && p.timers.punch_cd <= 0.0 && p.stamina >= m.punch_cost {
            p.timers.punch = m.punch_secs;
            p.timers.punch_cd = m.punch_cd;
            p.stamina -= m.punch_cost;
            fx.push(FxKind::Swing);
        }

        let mut speed = m.speed * self.session.speed_mul;
        if c.sprint && moving && p.stamina > 0.0 {
            speed *= m.sprint_mul;
            p.stamina -= m.sprint_drain * dt;
        } else {
            p.stamina += m.stamina_regen * dt;
        }
        if p.timers.dodge > 0.0 {
            speed *= m.dodge_mul;
            if !moving {
                (dx, dy) = p.facing;
            }
        }
        p.stamina = p.stamina.clamp(0.0, p.stamina_max);

        for kind in fx {
            let (ox, oy) = match kind {
                FxKind::Swing => (p.facing.0 * 10.0, p.facing.1 * 10.0),
                _ => (0.0, 0.0),
            };
            self.session.fx.push(Fx {
                kind,
                x: p.x + ox,
                y: p.y + oy,
                ttl: m.fx_ttl,
            });
        }

        self.slide(world, dx * speed * dt, dy * speed * dt);
    }

    /// Axis-separated AABB sliding, in sub-steps no longer than `step_px`.
    fn slide(&mut self, world: &dyn World, mx: f32, my: f32) {
        if mx == 0.0 && my == 0.0 {
            return;
        }
        let m = &self.rules.movement;
        let p = &mut self.player;
        let steps = (mx.abs().max(my.abs()) / m.step_px).ceil().max(1.0) as u32;
        let (sx, sy) = (mx / steps as f32, my / steps as f32);
        for _ in 0..steps {
            let nx = p.x + sx;
            if !world.hits_solid(&Rect::centered(nx, p.y, m.half_size)) {
                p.x = nx;
            }
            let ny = p.y + sy;
            if !world.hits_solid(&Rect::centered(p.x, ny, m.half_size)) {
                p.y = ny;
            }
        }
    }

    /// Needs decay, derived debuffs, depletion damage, rent and the death check.
    pub(crate) fn tick_needs(&mut self, dt: f32, now: &Now) {
        if self.session.dead {
            return;
        }
        let dt = dt.max(0.0);
        let decay = self.rules.needs.decay;
        let n = &mut self.player.needs;
        n.hunger -= decay.hunger * dt;
        n.sleep -= decay.sleep * dt;
        n.hygiene -= decay.hygiene * dt;
        n.fitness -= decay.fitness * dt;
        n.clamp();

        self.apply_debuffs();
        self.apply_depletion_damage(dt);
        self.tick_rent(now);
        self.check_death();
    }

    pub(crate) fn apply_debuffs(&mut self) {
        let r = &self.rules.needs;
        let n = self.player.needs;
        let mut speed = 1.0;
        let mut stamina = 1.0;
        for (value, debuff) in [
            (n.hunger, r.hunger_low),
            (n.sleep, r.sleep_low),
            (n.hygiene, r.hygiene_low),
            (n.fitness, r.fitness_low),
        ] {
            if value <= r.low_at {
                speed *= debuff.speed;
                stamina *= debuff.stamina;
            }
        }
        self.session.speed_mul = speed;

        let p = &mut self.player;
        p.stamina_max = (100.0 * stamina).max(r.stamina_floor);
        p.stamina = p.stamina.clamp(0.0, p.stamina_max);
    }

    fn apply_depletion_damage(&mut self, dt: f32) {
        let r = &self.rules.needs;
        let n = self.player.needs;
        let mut dps = 0.0;
        let mut why = Vec::new();
        if n.hunger <= 0.0 {
            dps += r.hunger_dmg;
            why.push("starving");
        }
        if n.sleep <= 0.0 {
            dps += r.sleep_dmg;
            why.push("exhausted");
        }
        if n.hygiene <= 0.0 {
            dps += r.hygiene_dmg;
            why.push("filthy");
        }
        if dps <= 0.0 {
            return;
        }

        let p = &mut self.player;
        p.health = (p.health - dps * dt).clamp(0.0, p.health_max);

        self.session.hurt_toast_t += dt;
        if self.session.hurt_toast_t >= r.hurt_toast_every {
            self.session.hurt_toast_t = 0.0;
            let msg = format!("You're {} and losing health!", why.join(" and "));
            self.toast(msg);
        }
    }

    fn tick_rent(&mut self, now: &Now) {
        let r = &self.rules.rent;
        let p = &mut self.player;
        let overdue_ms = now.ms.saturating_sub(p.rent_due_at);
        if overdue_ms <= 0 {
            return;
        }
        let owed = i128::from(overdue_ms) * i128::from(r.per_day) / i128::from(DAY_MS);
        p.rent_debt = p.rent_debt.max(i64::try_from(owed).unwrap_or(i64::MAX));

        if overdue_ms >= r.evict_after_ms && !p.evicted {
            p.evicted = true;
            info!(rent_debt = p.rent_debt, "player evicted");
            self.toast("Evicted! Rent went unpaid too long. Home is locked.");
        }
    }

    fn check_death(&mut self) {
        if self.session.dead || self.player.health > 0.0 {
            return;
        }
        self.session.dead = true;
        self.session.death_timer = self.rules.death_delay;
        self.session.dialogue = None;
        warn!(area = %self.player.area, money = self.player.money, "player died");
        self.toast("You collapsed. This run is over.");
        self.events.push(Event::Died);
        self.events.push(Event::ClearSave);
    }

    fn tick_surroundings(&mut self, world: &dyn World, npcs: &dyn NpcRegistry) {
        let (x, y) = (self.player.x, self.player.y);
        if let Some(area) = world.area_at(x, y) {
            if area != self.player.area {
                debug!(area, "entered area");
                self.player.area = area.to_string();
            }
        }

        self.session.near_job_spot = world
            .nearest_landmark(x, y, self.rules.job.spot_radius)
            .is_some_and(|l| l.kind == LandmarkKind::Studio);

        let at_park = world
            .nearest_landmark(x, y, self.rules.landmark_radius)
            .is_some_and(|l| l.kind == LandmarkKind::Park);
        if at_park
            && self.player.quests.flyers() == FlyersStage::InProgress
            && !self.session.flyers_delivered
        {
            self.session.flyers_delivered = true;
            self.toast("Flyers handed out. Head back to your agent.");
        }

        if let Some(open_id) = self.session.dialogue.as_ref().map(|d| d.npc_id) {
            let still_near = npcs
                .nearest(x, y, self.rules.talk_radius * 1.5)
                .is_some_and(|n| n.id == open_id);
            if !still_near {
                self.session.dialogue = None;
            }
        }
    }

    /// Manual reset back to the role's spawn point.
    pub(crate) fn respawn(&mut self, world: &dyn World) {
        if self.session.dead {
            return;
        }
        let spawn = world.spawn(self.player.role);
        self.player.x = spawn.x;
        self.player.y = spawn.y;
        if let Some(area) = spawn.area {
            self.player.area = area;
        }
        self.session.dialogue = None;
        self.events.push(Event::Save);
    }

    pub(crate) fn hud(&self, now: &Now) -> Hud {
        let p = &self.player;
        let rent = if p.evicted {
            format!("EVICTED (owe ${})", p.rent_debt)
        } else if now.ms < p.rent_due_at {
            format!("due in {}", fmt_countdown(p.rent_due_at - now.ms))
        } else {
            format!("OVERDUE (owe ${})", p.rent_debt)
        };
        Hud {
            role: p.role,
            area: p.area.clone(),
            money: p.money,
            stamina: p.stamina,
            stamina_max: p.stamina_max,
            needs: p.needs,
            health: p.health,
            health_max: p.health_max,
            rent,
            vault: self.vault_status(now),
            show: self.show_status(now),
        }
    }

    pub(crate) fn overlay(&self, now: &Now) -> Overlay {
        Overlay {
            vault: format!("Vault ${}: {}", self.player.vault.cash, self.vault_status(now)),
            phone: self.job_status(now),
            quests: self.quest_lines(now),
            dialogue: self.session.dialogue.clone(),
        }
    }
}

/// Bulk needs reconciliation for the time the game was closed. Logging off
/// counts as sleeping: hunger and hygiene fall, sleep recovers.
pub(crate) fn catch_up(
    player: &mut PlayerState,
    last_seen_ms: i64,
    now_ms: i64,
    rules: &Rules,
) -> CatchupSummary {
    let raw_secs = (now_ms.saturating_sub(last_seen_ms) / 1000).max(0);
    let secs = raw_secs.min(rules.offline.max_secs.max(0));
    let s = secs as f32;

    let decay = rules.needs.decay;
    let n = &mut player.needs;
    n.hunger -= decay.hunger * s;
    n.hygiene -= decay.hygiene * s;
    n.sleep += decay.sleep * s;
    n.clamp();

    let depleted = [n.hunger, n.hygiene].iter().filter(|v| **v <= 0.0).count();
    let before = player.health;
    if depleted > 0 {
        let penalty =
            (s * rules.offline.health_per_sec * depleted as f32).min(rules.offline.health_cap);
        player.health = (player.health - penalty).clamp(0.0, player.health_max);
    }

    CatchupSummary {
        elapsed_secs: secs,
        capped: raw_secs > secs,
        health_lost: before - player.health,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::{HOUR_MS, SECOND_MS};
    use crate::world::{Town, Townsfolk};

    pub(crate) const T0: i64 = 1_760_000_000_000;

    pub(crate) fn game_at(x: f32, y: f32) -> Game {
        let town = Town::standard();
        let mut g = Game::new_game(Role::Actor, &town, &Now::at(T0), Rules::default(), 7);
        g.player.x = x;
        g.player.y = y;
        g.drain_events();
        g
    }

    pub(crate) fn game() -> Game {
        game_at(300.0, 250.0)
    }

    fn deaths(events: &[Event]) -> usize {
        events.iter().filter(|e| **e == Event::Died).count()
    }

    #[test]
    fn new_game_rent_is_three_days_out_and_saves() {
        let town = Town::standard();
        let mut g = Game::new_game(Role::Police, &town, &Now::at(T0), Rules::default(), 1);
        assert_eq!(g.player.rent_due_at, T0 + 3 * DAY_MS);
        assert_eq!(g.player.area, "Downtown");
        assert_eq!(g.drain_events(), vec![Event::Save]);
    }

    #[test]
    fn needs_stay_clamped_for_any_dt() {
        let now = Now::at(T0);
        for start in [0.0, 0.5, 20.0, 99.9, 100.0] {
            for dt in [0.0, 0.016, 1.0, 500.0, 1e6] {
                let mut g = game();
                g.player.health = 1e9;
                g.player.health_max = 1e9;
                g.player.needs.hunger = start;
                g.player.needs.sleep = start;
                g.player.needs.hygiene = start;
                g.player.needs.fitness = start;
                g.tick_needs(dt, &now);
                let n = g.player.needs;
                for v in [n.hunger, n.sleep, n.hygiene, n.fitness] {
                    assert!((0.0..=100.0).contains(&v), "start={start} dt={dt} v={v}");
                }
            }
        }
    }

    #[test]
    fn decay_order_is_hunger_sleep_hygiene_fitness() {
        let mut g = game();
        g.player.needs = crate::model::Needs {
            hunger: 90.0,
            sleep: 90.0,
            hygiene: 90.0,
            fitness: 90.0,
        };
        g.tick_needs(10.0, &Now::at(T0));
        let n = g.player.needs;
        assert!(n.hunger < n.sleep && n.sleep < n.hygiene && n.hygiene < n.fitness);
    }

    #[test]
    fn stamina_max_never_below_floor() {
        let now = Now::at(T0);
        for mask in 0..16u8 {
            let mut g = game();
            let low = |bit: u8| if mask & bit != 0 { 5.0 } else { 90.0 };
            g.player.needs.hunger = low(1);
            g.player.needs.sleep = low(2);
            g.player.needs.hygiene = low(4);
            g.player.needs.fitness = low(8);
            g.player.stamina = 100.0;
            g.tick_needs(0.016, &now);
            assert!(g.player.stamina_max >= 40.0);
            assert!(g.player.stamina <= g.player.stamina_max);
        }
    }

    #[test]
    fn hunger_and_sleep_debuff_stamina_hygiene_only_speed() {
        let mut g = game();
        g.player.needs.hygiene = 10.0;
        g.player.needs.fitness = 10.0;
        g.tick_needs(0.0, &Now::at(T0));
        assert_eq!(g.player.stamina_max, 100.0);
        assert!(g.session.speed_mul < 1.0);

        g.player.needs.hunger = 10.0;
        g.player.needs.sleep = 10.0;
        g.tick_needs(0.0, &Now::at(T0));
        assert!((g.player.stamina_max - 52.5).abs() < 1e-3);
    }

    #[test]
    fn starvation_kills_once() {
        let mut g = game();
        g.player.needs.hunger = 0.0;
        g.player.needs.sleep = 50.0;
        g.player.needs.hygiene = 50.0;
        g.player.health = 10.0;
        g.player.health_max = 100.0;

        let town = Town::standard();
        let folk = Townsfolk::standard();
        let controls = Controls::default();
        let now = Now::at(T0);
        let mut events = Vec::new();
        let mut elapsed = 0.0;
        while !g.is_dead() && elapsed < 10.0 {
            g.tick(1.0, &controls, &now, &town, &folk);
            elapsed += 1.0;
            events.extend(g.drain_events());
        }
        assert_eq!(elapsed, 2.0);
        assert_eq!(g.player.health, 0.0);
        for _ in 0..5 {
            g.tick(1.0, &controls, &now, &town, &folk);
            events.extend(g.drain_events());
        }
        assert_eq!(deaths(&events), 1);
        assert_eq!(events.iter().filter(|e| **e == Event::ClearSave).count(), 1);
        assert_eq!(events.iter().filter(|e| **e == Event::ReturnToMenu).count(), 1);
    }

    #[test]
    fn dead_player_does_not_recover() {
        let mut g = game();
        g.player.health = 0.0;
        g.tick_needs(0.016, &Now::at(T0));
        assert!(g.is_dead());
        g.player.needs.hunger = 100.0;
        for _ in 0..100 {
            g.tick_needs(1.0, &Now::at(T0 + DAY_MS * 10));
        }
        assert_eq!(g.player.health, 0.0);
        assert_eq!(g.player.needs.hunger, 100.0);
        assert_eq!(g.player.rent_debt, 0);
    }

    #[test]
    fn hurt_warning_is_throttled() {
        let mut g = game();
        g.player.needs.hygiene = 0.0;
        g.player.health = 100.0;
        let now = Now::at(T0);
        for _ in 0..240 {
            g.tick_needs(1.0 / 60.0, &now);
        }
        let toasts = g
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, Event::Toast(_)))
            .count();
        assert_eq!(toasts, 1);
    }

    #[test]
    fn rent_debt_and_eviction_timing() {
        let mut g = game();
        g.player.rent_due_at = T0;

        g.tick_needs(0.0, &Now::at(T0 + DAY_MS * 14 / 10));
        assert!(!g.player.evicted);
        assert_eq!(g.player.rent_debt, 63);

        g.tick_needs(0.0, &Now::at(T0 + DAY_MS * 15 / 10));
        assert!(g.player.evicted);
        let toasts = g.drain_events();
        assert_eq!(toasts.len(), 1);

        g.tick_needs(0.0, &Now::at(T0 + DAY_MS * 2));
        assert!(g.player.evicted);
        assert!(g.drain_events().is_empty());
    }

    #[test]
    fn rent_debt_never_decreases() {
        let mut g = game();
        g.player.rent_due_at = T0;
        let mut last = 0;
        for step in [5, 3, 9, 9, 1, 20] {
            g.tick_needs(0.0, &Now::at(T0 + step * HOUR_MS));
            assert!(g.player.rent_debt >= last);
            last = g.player.rent_debt;
        }
        assert_eq!(last, 20 * 45 / 24);
    }

    #[test]
    fn autosave_every_second_and_a_half() {
        let mut g = game();
        let town = Town::standard();
        let folk = Townsfolk::standard();
        let now = Now::at(T0);
        for _ in 0..100 {
            g.tick(0.033, &Controls::default(), &now, &town, &folk);
        }
        let saves = g
            .drain_events()
            .into_iter()
            .filter(|e| *e == Event::Save)
            .count();
        assert_eq!(saves, 2);
    }

    #[test]
    fn movement_slides_along_walls() {
        let town = Town::standard();
        let folk = Townsfolk::standard();
        // just below the bank, pushing up and right
        let mut g = game_at(100.0, 130.0);
        let now = Now::at(T0);
        let push = Controls {
            dx: 1.0,
            dy: -1.0,
            ..Controls::default()
        };
        for _ in 0..15 {
            g.tick(0.033, &push, &now, &town, &folk);
            let r = Rect::centered(g.player.x, g.player.y, g.rules.movement.half_size);
            assert!(!town.hits_solid(&r));
        }
        assert!(g.player.x > 110.0);
        assert!(g.player.y >= 126.0);
    }

    #[test]
    fn dodge_respects_cooldown_and_stamina() {
        let town = Town::standard();
        let folk = Townsfolk::standard();
        let mut g = game();
        let now = Now::at(T0);
        let dodge = Controls {
            dodge: true,
            ..Controls::default()
        };
        g.tick(0.016, &dodge, &now, &town, &folk);
        assert!(g.player.timers.dodge > 0.0);
        assert!(g.player.timers.iframes > 0.0);
        let after_first = g.player.stamina;
        g.tick(0.016, &dodge, &now, &town, &folk);
        assert!(g.player.stamina > after_first);

        g.player.timers.dodge_cd = 0.0;
        g.player.stamina = 5.0;
        g.player.timers.dodge = 0.0;
        g.tick(0.016, &dodge, &now, &town, &folk);
        assert_eq!(g.player.timers.dodge, 0.0);
    }

    #[test]
    fn park_visit_marks_flyers_only_while_accepted() {
        let town = Town::standard();
        let folk = Townsfolk::standard();
        let now = Now::at(T0);
        let mut g = game_at(736.0, 490.0);
        g.tick(0.016, &Controls::default(), &now, &town, &folk);
        assert!(!g.session.flyers_delivered);

        g.player.quests.flyers_accepted = true;
        g.tick(0.016, &Controls::default(), &now, &town, &folk);
        assert!(g.session.flyers_delivered);
        assert_eq!(g.player.area, "Riverside Park");
    }

    #[test]
    fn offline_catch_up_is_capped_at_a_week() {
        let rules = Rules::default();
        let base = game().player;

        let mut ten_days = base.clone();
        let s10 = catch_up(&mut ten_days, T0 - 10 * DAY_MS, T0, &rules);
        let mut seven_days = base.clone();
        let s7 = catch_up(&mut seven_days, T0 - 7 * DAY_MS, T0, &rules);

        assert_eq!(ten_days, seven_days);
        assert!(s10.capped);
        assert!(!s7.capped);
        assert_eq!(s10.elapsed_secs, 7 * 24 * 3600);
    }

    #[test]
    fn offline_sleep_recovers_and_starvation_costs_capped_health() {
        let rules = Rules::default();
        let mut p = game().player;
        p.needs.sleep = 10.0;
        let s = catch_up(&mut p, T0 - 10 * 60 * SECOND_MS, T0, &rules);
        assert!((p.needs.sleep - 58.0).abs() < 1e-3);
        assert!((p.needs.hunger - 8.0).abs() < 1e-3);
        assert_eq!(s.health_lost, 0.0);

        let mut p = game().player;
        let s = catch_up(&mut p, T0 - 2 * DAY_MS, T0, &rules);
        assert_eq!(p.needs.hunger, 0.0);
        assert_eq!(p.needs.hygiene, 0.0);
        assert_eq!(s.health_lost, 50.0);
        assert_eq!(p.health, 50.0);
    }

    #[test]
    fn catch_up_ignores_clock_going_backwards() {
        let rules = Rules::default();
        let mut p = game().player;
        let before = p.clone();
        let s = catch_up(&mut p, T0 + HOUR_MS, T0, &rules);
        assert_eq!(p, before);
        assert_eq!(s.elapsed_secs, 0);
    }

    #[test]
    fn catch_up_survives_absurd_last_seen() {
        let rules = Rules::default();
        let mut p = game().player;
        let s = catch_up(&mut p, i64::MIN, T0, &rules);
        assert!(s.capped);
        assert_eq!(s.elapsed_secs, rules.offline.max_secs);
    }

    #[test]
    fn rent_from_the_distant_past_saturates() {
        let mut g = game();
        g.player.rent_due_at = -1_000_000_000_000_000_000;
        g.tick(
            0.016,
            &Controls::default(),
            &Now::at(T0),
            &Town::standard(),
            &Townsfolk::standard(),
        );
        assert!(g.player.evicted);
        assert!(g.player.rent_debt > 0);
    }

    #[test]
    fn continue_ignores_garbage_timestamps() {
        let json = r#"{
            "meta": { "last_seen_at": -9223372036854775808 },
            "player": { "rent_due_at": -1000000000000000000 }
        }"#;
        let save: SaveFile = serde_json::from_str(json).unwrap();
        let town = Town::standard();
        let mut g = Game::continue_from(save, &Now::at(T0), &town, Rules::default(), 3);
        assert_eq!(g.player.rent_due_at, T0 + 3 * DAY_MS);
        assert!(g.drain_events().is_empty());

        g.tick(
            0.016,
            &Controls::default(),
            &Now::at(T0),
            &town,
            &Townsfolk::standard(),
        );
        assert!(!g.is_dead());
        assert!(!g.player.evicted);
    }

    #[test]
    fn continue_reports_time_away() {
        let mut p = game().player;
        p.needs.sleep = 10.0;
        let save = SaveFile::capture(&p, T0 - 10 * 60 * SECOND_MS);
        let mut g = Game::continue_from(save, &Now::at(T0), &Town::standard(), Rules::default(), 3);
        assert!((g.player.needs.sleep - 58.0).abs() < 1e-3);
        let events = g.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Toast(m) if m.starts_with("You were away 10:00")));
    }

    #[test]
    fn starving_offline_dies_on_first_tick() {
        let mut p = game().player;
        p.health = 30.0;
        let save = SaveFile::capture(&p, T0 - 2 * DAY_MS);
        let town = Town::standard();
        let mut g = Game::continue_from(save, &Now::at(T0), &town, Rules::default(), 3);
        assert_eq!(g.player.health, 0.0);
        assert!(!g.is_dead());
        g.drain_events();

        g.tick(
            0.016,
            &Controls::default(),
            &Now::at(T0),
            &town,
            &Townsfolk::standard(),
        );
        assert!(g.is_dead());
        let events = g.drain_events();
        assert_eq!(deaths(&events), 1);
        assert_eq!(events.iter().filter(|e| **e == Event::ClearSave).count(), 1);
        assert!(!events.contains(&Event::Save));
    }

    #[test]
    fn dead_player_cannot_interact_or_quest() {
        let town = Town::standard();
        let folk = Townsfolk::standard();
        let now = Now::at(T0);
        let mut g = game_at(668.0, 222.0);
        g.session.dead = true;
        let before = g.player.clone();
        assert_eq!(g.interact(false, &now, &town, &folk), Err(Rejection::Dead));
        assert_eq!(g.talk_to_agent(), Err(Rejection::Dead));
        assert_eq!(g.play_show(&now), Err(Rejection::Dead));
        assert_eq!(g.player, before);
    }
}
