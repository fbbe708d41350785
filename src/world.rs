use crate::model::Role;

pub(crate) const MAP_W: f32 = 960.0;
pub(crate) const MAP_H: f32 = 640.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) w: f32,
    pub(crate) h: f32,
}

impl Rect {
    pub(crate) const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub(crate) fn centered(cx: f32, cy: f32, half: f32) -> Self {
        Self::new(cx - half, cy - half, half * 2.0, half * 2.0)
    }

    pub(crate) fn intersects(&self, o: &Rect) -> bool {
        self.x < o.x + o.w && o.x < self.x + self.w && self.y < o.y + o.h && o.y < self.y + self.h
    }

    pub(crate) fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Spawn {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) area: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LandmarkKind {
    Home,
    Diner,
    Vault,
    Studio,
    Stage,
    Gym,
    Park,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Landmark {
    pub(crate) kind: LandmarkKind,
    pub(crate) name: &'static str,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NpcKind {
    Agent,
    Townie,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Npc {
    pub(crate) id: u32,
    pub(crate) kind: NpcKind,
    pub(crate) name: &'static str,
    pub(crate) x: f32,
    pub(crate) y: f32,
    lines: &'static [&'static str],
}

pub(crate) trait World {
    fn spawn(&self, role: Role) -> Spawn;
    fn hits_solid(&self, rect: &Rect) -> bool;
    fn nearest_landmark(&self, x: f32, y: f32, radius: f32) -> Option<&Landmark>;
    fn area_at(&self, x: f32, y: f32) -> Option<&str>;
}

pub(crate) trait NpcRegistry {
    fn nearest(&self, x: f32, y: f32, radius: f32) -> Option<&Npc>;
    fn talk_lines(&self, npc: &Npc) -> Vec<String>;
}

fn dist2(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let (dx, dy) = (ax - bx, ay - by);
    dx * dx + dy * dy
}

/// The one hand-laid town the game ships with.
pub(crate) struct Town {
    pub(crate) solids: Vec<Rect>,
    pub(crate) landmarks: Vec<Landmark>,
    areas: Vec<(&'static str, Rect)>,
}

impl Town {
    pub(crate) fn standard() -> Self {
        let wall = 8.0;
        let solids = vec![
            // border
            Rect::new(0.0, 0.0, MAP_W, wall),
            Rect::new(0.0, MAP_H - wall, MAP_W, wall),
            Rect::new(0.0, 0.0, wall, MAP_H),
            Rect::new(MAP_W - wall, 0.0, wall, MAP_H),
            // buildings
            Rect::new(40.0, 48.0, 120.0, 72.0),  // bank
            Rect::new(200.0, 48.0, 104.0, 64.0), // diner
            Rect::new(560.0, 48.0, 120.0, 72.0), // studio
            Rect::new(760.0, 48.0, 144.0, 48.0), // stage
            Rect::new(40.0, 368.0, 120.0, 80.0), // home
            Rect::new(320.0, 384.0, 104.0, 64.0), // gym
            // park trees
            Rect::new(640.0, 420.0, 16.0, 16.0),
            Rect::new(800.0, 400.0, 16.0, 16.0),
            Rect::new(856.0, 520.0, 16.0, 16.0),
        ];
        let landmarks = vec![
            Landmark {
                kind: LandmarkKind::Vault,
                name: "Bank vault",
                x: 100.0,
                y: 140.0,
            },
            Landmark {
                kind: LandmarkKind::Diner,
                name: "Diner",
                x: 252.0,
                y: 132.0,
            },
            Landmark {
                kind: LandmarkKind::Studio,
                name: "Studio",
                x: 620.0,
                y: 140.0,
            },
            Landmark {
                kind: LandmarkKind::Stage,
                name: "Stage",
                x: 832.0,
                y: 116.0,
            },
            Landmark {
                kind: LandmarkKind::Home,
                name: "Home",
                x: 100.0,
                y: 468.0,
            },
            Landmark {
                kind: LandmarkKind::Gym,
                name: "Gym",
                x: 372.0,
                y: 468.0,
            },
            Landmark {
                kind: LandmarkKind::Park,
                name: "Park fountain",
                x: 736.0,
                y: 480.0,
            },
        ];
        let areas = vec![
            ("Downtown", Rect::new(0.0, 0.0, 480.0, 320.0)),
            ("Midtown", Rect::new(480.0, 0.0, 480.0, 320.0)),
            ("Suburbs", Rect::new(0.0, 320.0, 480.0, 320.0)),
            ("Riverside Park", Rect::new(480.0, 320.0, 480.0, 320.0)),
        ];
        Self {
            solids,
            landmarks,
            areas,
        }
    }
}

impl World for Town {
    fn spawn(&self, role: Role) -> Spawn {
        let (x, y) = match role {
            Role::Actor => (620.0, 200.0),
            Role::Thug => (600.0, 560.0),
            Role::Police => (300.0, 250.0),
        };
        Spawn {
            x,
            y,
            area: self.area_at(x, y).map(str::to_string),
        }
    }

    fn hits_solid(&self, rect: &Rect) -> bool {
        self.solids.iter().any(|s| s.intersects(rect))
    }

    fn nearest_landmark(&self, x: f32, y: f32, radius: f32) -> Option<&Landmark> {
        let r2 = radius * radius;
        self.landmarks
            .iter()
            .map(|l| (dist2(x, y, l.x, l.y), l))
            .filter(|(d, _)| *d <= r2)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, l)| l)
    }

    fn area_at(&self, x: f32, y: f32) -> Option<&str> {
        self.areas
            .iter()
            .find(|(_, r)| r.contains(x, y))
            .map(|(name, _)| *name)
    }
}

pub(crate) struct Townsfolk {
    pub(crate) npcs: Vec<Npc>,
}

impl Townsfolk {
    pub(crate) fn standard() -> Self {
        Self {
            npcs: vec![
                Npc {
                    id: 1,
                    kind: NpcKind::Agent,
                    name: "Rita (agent)",
                    x: 668.0,
                    y: 212.0,
                    lines: &["Kid, you want gigs? Talk to me."],
                },
                Npc {
                    id: 2,
                    kind: NpcKind::Townie,
                    name: "Sal",
                    x: 240.0,
                    y: 200.0,
                    lines: &[
                        "The diner does a decent plate for twelve bucks.",
                        "Don't skip meals. You'll feel it in your legs.",
                    ],
                },
                Npc {
                    id: 3,
                    kind: NpcKind::Townie,
                    name: "Officer Dee",
                    x: 420.0,
                    y: 280.0,
                    lines: &[
                        "Keep your rent paid. Landlords here don't wait.",
                        "Vault's one trip a day. Bank rules.",
                    ],
                },
                Npc {
                    id: 4,
                    kind: NpcKind::Townie,
                    name: "Old Fen",
                    x: 770.0,
                    y: 580.0,
                    lines: &[
                        "Crowds gather by the stage around eight.",
                        "I sleep on that bench when the nights are warm.",
                    ],
                },
            ],
        }
    }
}

impl NpcRegistry for Townsfolk {
    fn nearest(&self, x: f32, y: f32, radius: f32) -> Option<&Npc> {
        let r2 = radius * radius;
        self.npcs
            .iter()
            .map(|n| (dist2(x, y, n.x, n.y), n))
            .filter(|(d, _)| *d <= r2)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, n)| n)
    }

    fn talk_lines(&self, npc: &Npc) -> Vec<String> {
        npc.lines.iter().map(|l| l.to_string()).collect()
    }
}
