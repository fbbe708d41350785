use crate::clock::Now;
use crate::config::{load_settings, save_settings_atomic, Paths, Settings};
use crate::input::{collect_input_nonblocking, map_event_to_action, HeldKeys};
use crate::interact::PlayerAction;
use crate::model::{Controls, Event, Rules, Scene};
use crate::render::{
    draw_box, draw_dialogue, draw_footer, draw_hud, draw_menu, draw_overlay, draw_world, Terminal,
};
use crate::sim::Game;
use crate::storage::{JsonFileStore, SaveFile, SaveStore};
use crate::world::{Town, Townsfolk};
use crate::Cli;
use std::time::{Duration, Instant};
use tracing::warn;

const TOAST_SECS: u64 = 4;

pub(crate) struct App {
    settings: Settings,
    rules: Rules,
    paths: Paths,
    store: JsonFileStore,
    town: Town,
    folk: Townsfolk,
    term: Terminal,
    scene: Scene,
    game: Option<Game>,
    held: HeldKeys,
    toasts: Vec<(String, Instant)>,
    has_save: bool,
    show_overlay: bool,
    should_quit: bool,
}

impl App {
    fn init(cli: Cli, paths: Paths) -> anyhow::Result<Self> {
        let mut settings = load_settings(&paths.settings_path);
        if let Some(role) = cli.role {
            settings.role = role;
        }
        if let Some(seed) = cli.seed {
            settings.seed = seed;
        }
        if let Some(fps) = cli.fps {
            settings.fps_cap = fps;
        }
        if cli.mono {
            settings.enable_color = false;
        }

        let store = JsonFileStore::new(cli.save.unwrap_or_else(|| paths.save_path.clone()));
        let has_save = matches!(store.load(), Ok(Some(_)));
        let term = Terminal::begin(settings.enable_color)?;

        let mut app = Self {
            settings,
            rules: Rules::default(),
            paths,
            store,
            town: Town::standard(),
            folk: Townsfolk::standard(),
            term,
            scene: Scene::Menu,
            game: None,
            held: HeldKeys::default(),
            toasts: Vec::new(),
            has_save,
            show_overlay: false,
            should_quit: false,
        };
        if cli.new {
            app.start_new_game();
        }
        Ok(app)
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            self.term.resize_if_needed()?;

            // input
            let pressed_at = Instant::now();
            for ev in collect_input_nonblocking(frame_dt)? {
                if self.scene == Scene::Play && self.held.feed(&ev, pressed_at) {
                    continue;
                }
                if let Some(action) = map_event_to_action(self.scene, &ev) {
                    self.handle(action);
                }
                if self.should_quit {
                    break;
                }
            }

            // one wall-clock read and one clamped dt per frame
            let frame_start = Instant::now();
            let dt = frame_start
                .saturating_duration_since(last_frame)
                .as_secs_f32()
                .min(self.rules.max_dt);
            last_frame = frame_start;
            let now = Now::wall();

            if let Some(game) = self.game.as_mut() {
                let controls = if self.scene == Scene::Play {
                    self.held.controls(frame_start)
                } else {
                    Controls::default()
                };
                game.tick(dt, &controls, &now, &self.town, &self.folk);
            }
            self.pump_events(&now);

            self.toasts
                .retain(|(_, at)| at.elapsed() < Duration::from_secs(TOAST_SECS));
            self.render_frame(&now)?;

            spin_sleep(frame_dt, frame_start);
        }

        self.save_on_exit();
        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    fn push_toast(&mut self, msg: impl Into<String>) {
        self.toasts.push((msg.into(), Instant::now()));
        if self.toasts.len() > 8 {
            self.toasts.remove(0);
        }
    }

    fn handle(&mut self, action: PlayerAction) {
        match action {
            PlayerAction::Quit => {
                self.should_quit = true;
                return;
            }
            PlayerAction::NewGame => return self.start_new_game(),
            PlayerAction::Continue => return self.continue_game(),
            PlayerAction::CycleRole => {
                self.settings.role = self.settings.role.next();
                return;
            }
            PlayerAction::ToggleOverlay => {
                self.show_overlay = !self.show_overlay;
                return;
            }
            _ => {}
        }

        let now = Now::wall();
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let outcome = match action {
            PlayerAction::Interact => game.interact(false, &now, &self.town, &self.folk),
            PlayerAction::InteractAlt => game.interact(true, &now, &self.town, &self.folk),
            PlayerAction::Phone => game.collect_job(&now),
            PlayerAction::Respawn => {
                game.respawn(&self.town);
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(rejection) = outcome {
            self.push_toast(rejection.to_string());
        }
        self.pump_events(&now);
    }

    fn start_new_game(&mut self) {
        let now = Now::wall();
        let seed = self.settings.seed ^ now.ms as u64;
        self.game = Some(Game::new_game(
            self.settings.role,
            &self.town,
            &now,
            self.rules.clone(),
            seed,
        ));
        self.enter_play();
        self.pump_events(&now);
    }

    fn continue_game(&mut self) {
        let save = match self.store.load() {
            Ok(Some(save)) => save,
            Ok(None) => {
                self.has_save = false;
                self.push_toast("No saved run to continue.");
                return;
            }
            Err(e) => {
                warn!(error = %e, "could not read save");
                self.push_toast("Could not read the save file.");
                return;
            }
        };

        let now = Now::wall();
        let seed = self.settings.seed ^ now.ms as u64;
        let game = Game::continue_from(save, &now, &self.town, self.rules.clone(), seed);
        self.game = Some(game);
        self.enter_play();
    }

    fn enter_play(&mut self) {
        self.scene = Scene::Play;
        self.held.clear();
        self.show_overlay = false;
    }

    fn write_save(&mut self, now: &Now) {
        let Some(game) = &self.game else {
            return;
        };
        let save = SaveFile::capture(&game.player, now.ms);
        match self.store.write(&save) {
            Ok(()) => self.has_save = true,
            Err(e) => warn!(error = %e, "save failed"),
        }
    }

    fn pump_events(&mut self, now: &Now) {
        let events = match self.game.as_mut() {
            Some(game) => game.drain_events(),
            None => return,
        };
        for ev in events {
            match ev {
                Event::Toast(msg) => self.push_toast(msg),
                Event::Save => self.write_save(now),
                Event::ClearSave => {
                    if let Err(e) = self.store.clear() {
                        warn!(error = %e, "could not clear save");
                    }
                    self.has_save = false;
                }
                Event::Died => {
                    self.scene = Scene::Dead;
                    self.held.clear();
                    self.show_overlay = false;
                }
                Event::ReturnToMenu => {
                    self.game = None;
                    self.scene = Scene::Menu;
                }
            }
        }
    }

    fn save_on_exit(&mut self) {
        let alive = self.game.as_ref().is_some_and(|g| !g.is_dead());
        if self.scene == Scene::Play && alive {
            self.write_save(&Now::wall());
        }
    }

    fn render_frame(&mut self, now: &Now) -> anyhow::Result<()> {
        self.term.cur.clear();
        let toasts: Vec<String> = self.toasts.iter().map(|(m, _)| m.clone()).collect();
        let buf = &mut self.term.cur;

        match (&self.game, self.scene) {
            (Some(game), Scene::Play | Scene::Dead) => {
                draw_world(buf, game, &self.town, &self.folk);
                draw_hud(buf, &game.hud(now));
                let prompt = game.prompt(now, &self.town, &self.folk);
                draw_footer(buf, &prompt, &toasts);
                let overlay = game.overlay(now);
                if self.show_overlay {
                    draw_overlay(buf, &overlay);
                } else {
                    draw_dialogue(buf, &overlay);
                }
                if self.scene == Scene::Dead {
                    let body = [
                        "Your save has been wiped.".to_string(),
                        "Returning to the menu...".to_string(),
                    ];
                    draw_box(buf, "You collapsed", &body, 40);
                }
            }
            _ => draw_menu(buf, self.settings.role, self.has_save, &toasts),
        }

        self.term.present()
    }
}

pub(crate) fn run(cli: Cli, paths: Paths) -> anyhow::Result<()> {
    let mut app = App::init(cli, paths)?;
    app.run()
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
