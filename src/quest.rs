use crate::clock::{fmt_countdown, Now, SECOND_MS};
use crate::error::Rejection;
use crate::model::{Dialogue, FlyersStage, QuestLine};
use crate::sim::Game;
use crate::world::{Npc, NpcRegistry};
use rand::Rng;
use tracing::info;

impl Game {
    /// Flyers gig with the agent: accept, hand flyers out at the park, turn in.
    /// Once done, the agent only tips.
    pub(crate) fn talk_to_agent(&mut self) -> Result<(), Rejection> {
        self.ensure_alive()?;
        match self.player.quests.flyers() {
            FlyersStage::NotAccepted => {
                self.player.quests.flyers_accepted = true;
                info!("flyers quest accepted");
                self.toast("Rita: Take these flyers to the park fountain, then come back.");
                Ok(())
            }
            FlyersStage::InProgress => {
                if !self.session.flyers_delivered {
                    return Err(Rejection::FlyersNotDelivered);
                }
                let pay = self.rules.quest.flyers_pay;
                self.player.quests.flyers_done = true;
                self.player.money += pay;
                info!(pay, "flyers quest done");
                self.toast(format!("Rita: Nice hustle. Here's ${pay}."));
                Ok(())
            }
            FlyersStage::Done => {
                let q = &self.rules.quest;
                let tip = self.rng.gen_range(q.tip_min..=q.tip_max);
                self.player.money += tip;
                self.toast(format!("Rita slips you a ${tip} tip."));
                Ok(())
            }
        }
    }

    pub(crate) fn talk_to(&mut self, npc: &Npc, npcs: &dyn NpcRegistry) {
        self.session.dialogue = Some(Dialogue {
            npc_id: npc.id,
            name: npc.name.to_string(),
            lines: npcs.talk_lines(npc),
        });
    }

    pub(crate) fn show_open(&self, now: &Now) -> bool {
        let q = &self.rules.quest;
        now.minutes.abs_diff(q.show_at_minutes) <= q.show_window_minutes
    }

    pub(crate) fn show_status(&self, now: &Now) -> String {
        if self.show_open(now) {
            return "LIVE now".to_string();
        }
        let q = &self.rules.quest;
        let opens_at = (q.show_at_minutes - q.show_window_minutes) as i64;
        let mins = now.minutes as i64;
        let wait_minutes = if mins < opens_at {
            opens_at - mins
        } else {
            24 * 60 - mins + opens_at
        };
        let ms = wait_minutes * 60 * SECOND_MS - now.ms.rem_euclid(60 * SECOND_MS);
        format!("in {}", fmt_countdown(ms))
    }

    /// The day marker only feeds the quest list; repeat shows still pay.
    pub(crate) fn play_show(&mut self, now: &Now) -> Result<(), Rejection> {
        self.ensure_alive()?;
        if !self.show_open(now) {
            return Err(Rejection::ShowClosed);
        }
        let q = &self.rules.quest;
        let tip = self.rng.gen_range(q.show_tip_min..=q.show_tip_max);
        self.player.needs.hunger -= q.show_hunger_cost;
        self.player.needs.clamp();
        self.player.money += tip;
        self.player.quests.show_done_day = now.day.clone();
        info!(tip, day = %now.day, "8PM show performed");
        self.toast(format!("The crowd loved it! +${tip} in tips."));
        Ok(())
    }

    pub(crate) fn quest_lines(&self, now: &Now) -> Vec<QuestLine> {
        let flyers = match self.player.quests.flyers() {
            FlyersStage::NotAccepted => "talk to Rita at the studio".to_string(),
            FlyersStage::InProgress if self.session.flyers_delivered => {
                "flyers delivered, return to Rita".to_string()
            }
            FlyersStage::InProgress => "hand out flyers at the park".to_string(),
            FlyersStage::Done => "done".to_string(),
        };
        let show_done = self.player.quests.show_done_day == now.day;
        let show = if show_done {
            "performed today".to_string()
        } else {
            format!("stage show {}", self.show_status(now))
        };
        vec![
            QuestLine {
                title: "Flyers gig",
                status: flyers,
                done: self.player.quests.flyers_done,
            },
            QuestLine {
                title: "8PM show",
                status: show,
                done: show_done,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::Now;
    use crate::error::Rejection;
    use crate::model::FlyersStage;
    use crate::sim::tests::{game, T0};
    use chrono::{Local, TimeZone};

    fn local_ms(h: u32, m: u32) -> i64 {
        Local
            .with_ymd_and_hms(2026, 3, 2, h, m, 0)
            .earliest()
            .map(|t| t.timestamp_millis())
            .unwrap_or(T0)
    }

    #[test]
    fn flyers_turn_in_requires_park_visit() {
        let mut g = game();
        g.talk_to_agent().unwrap();
        assert_eq!(g.player.quests.flyers(), FlyersStage::InProgress);

        let money = g.player.money;
        assert_eq!(g.talk_to_agent(), Err(Rejection::FlyersNotDelivered));
        assert_eq!(g.player.quests.flyers(), FlyersStage::InProgress);
        assert_eq!(g.player.money, money);

        g.session.flyers_delivered = true;
        g.talk_to_agent().unwrap();
        assert_eq!(g.player.quests.flyers(), FlyersStage::Done);
        assert_eq!(g.player.money, money + 60);
    }

    #[test]
    fn done_flyers_only_tips_and_never_regresses() {
        let mut g = game();
        g.player.quests.flyers_accepted = true;
        g.player.quests.flyers_done = true;
        g.session.flyers_delivered = false;
        for _ in 0..50 {
            let before = g.player.money;
            g.talk_to_agent().unwrap();
            let tip = g.player.money - before;
            assert!((15..=40).contains(&tip), "tip {tip}");
            assert_eq!(g.player.quests.flyers(), FlyersStage::Done);
        }
    }

    #[test]
    fn show_window_is_an_hour_either_side_of_eight() {
        let g = game();
        assert!(g.show_open(&Now::at(local_ms(20, 0))));
        assert!(g.show_open(&Now::at(local_ms(19, 0))));
        assert!(g.show_open(&Now::at(local_ms(21, 0))));
        assert!(!g.show_open(&Now::at(local_ms(18, 59))));
        assert!(!g.show_open(&Now::at(local_ms(21, 1))));
    }

    #[test]
    fn show_pays_marks_day_and_costs_hunger() {
        let mut g = game();
        let now = Now::at(local_ms(20, 30));
        let (money, hunger) = (g.player.money, g.player.needs.hunger);
        g.play_show(&now).unwrap();
        let tip = g.player.money - money;
        assert!((60..=140).contains(&tip));
        assert_eq!(g.player.quests.show_done_day, now.day);
        assert_eq!(g.player.needs.hunger, hunger - 8.0);
        assert!(g.quest_lines(&now)[1].done);

        // not hard-gated per day
        g.play_show(&now).unwrap();
        assert!(g.player.money > money + tip);
    }

    #[test]
    fn show_outside_window_is_rejected() {
        let mut g = game();
        let before = g.player.clone();
        assert_eq!(
            g.play_show(&Now::at(local_ms(9, 0))),
            Err(Rejection::ShowClosed)
        );
        assert_eq!(g.player, before);
        assert_eq!(g.show_status(&Now::at(local_ms(18, 0))), "in 1h 00m");
    }
}
