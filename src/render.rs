use crate::model::{FxKind, Hud, Overlay, Role};
use crate::sim::Game;
use crate::world::{LandmarkKind, Town, Townsfolk, MAP_H, MAP_W};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

const HUD_ROWS: u16 = 3;
const FOOTER_ROWS: u16 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }
}

pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) color: bool,
}

impl Terminal {
    pub(crate) fn begin(color: bool) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            color,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let mut c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                if !self.color {
                    c.fg = Color::White;
                    c.bg = Color::Black;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x as usize + i;
        if xx >= buf.w as usize {
            break;
        }
        buf.set(xx as u16, y, Cell { ch, fg, bg });
    }
}

fn bar(value01: f32, width: usize) -> String {
    let filled = ((value01.clamp(0.0, 1.0) * width as f32) + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '█' } else { '·' });
    }
    s.push(']');
    s
}

fn need_color(v: f32) -> Color {
    if v <= 0.0 {
        Color::Red
    } else if v <= 20.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub(crate) fn draw_box(buf: &mut CellBuffer, title: &str, body: &[String], width: u16) {
    let (w, h) = (buf.w, buf.h);
    let bw = width.min(w.saturating_sub(2)).max(4);
    let bh = (body.len() as u16 + 4).min(h.saturating_sub(2)).max(3);
    let x0 = (w.saturating_sub(bw)) / 2;
    let y0 = (h.saturating_sub(bh)) / 2;
    let edge = |ch| Cell {
        ch,
        fg: Color::White,
        bg: Color::Black,
    };

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            buf.set(x, y, Cell::default());
        }
    }
    for x in x0..x0 + bw {
        buf.set(x, y0, edge('─'));
        buf.set(x, y0 + bh - 1, edge('─'));
    }
    for y in y0..y0 + bh {
        buf.set(x0, y, edge('│'));
        buf.set(x0 + bw - 1, y, edge('│'));
    }
    buf.set(x0, y0, edge('┌'));
    buf.set(x0 + bw - 1, y0, edge('┐'));
    buf.set(x0, y0 + bh - 1, edge('└'));
    buf.set(x0 + bw - 1, y0 + bh - 1, edge('┘'));

    draw_text(buf, x0 + 2, y0 + 1, title, Color::Yellow, Color::Black);
    for (i, line) in body.iter().enumerate() {
        let yy = y0 + 3 + i as u16;
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, Color::White, Color::Black);
    }
}

/// Maps world pixels onto the cells between the HUD and the footer.
struct MapView {
    cols: u16,
    rows: u16,
}

impl MapView {
    fn new(buf: &CellBuffer) -> Self {
        Self {
            cols: buf.w.max(1),
            rows: buf.h.saturating_sub(HUD_ROWS + FOOTER_ROWS).max(1),
        }
    }

    fn cell(&self, x: f32, y: f32) -> (u16, u16) {
        let cx = (x / MAP_W * self.cols as f32).clamp(0.0, self.cols as f32 - 1.0);
        let cy = (y / MAP_H * self.rows as f32).clamp(0.0, self.rows as f32 - 1.0);
        (cx as u16, HUD_ROWS + cy as u16)
    }

    fn world(&self, cx: u16, cy: u16) -> (f32, f32) {
        (
            (cx as f32 + 0.5) / self.cols as f32 * MAP_W,
            (cy as f32 + 0.5) / self.rows as f32 * MAP_H,
        )
    }
}

pub(crate) fn draw_world(buf: &mut CellBuffer, game: &Game, town: &Town, folk: &Townsfolk) {
    let view = MapView::new(buf);
    let ground = Color::Rgb { r: 24, g: 24, b: 28 };

    for cy in 0..view.rows {
        for cx in 0..view.cols {
            let (wx, wy) = view.world(cx, cy);
            let solid = town.solids.iter().any(|r| r.contains(wx, wy));
            let park = wx >= MAP_W / 2.0 && wy >= MAP_H / 2.0;
            let cell = if solid {
                Cell {
                    ch: '▓',
                    fg: Color::Grey,
                    bg: ground,
                }
            } else {
                Cell {
                    ch: if park { '"' } else { ' ' },
                    fg: Color::DarkGreen,
                    bg: ground,
                }
            };
            buf.set(cx, HUD_ROWS + cy, cell);
        }
    }

    for l in &town.landmarks {
        let (cx, cy) = view.cell(l.x, l.y);
        let ch = match l.kind {
            LandmarkKind::Home => 'H',
            LandmarkKind::Diner => 'F',
            LandmarkKind::Vault => '$',
            LandmarkKind::Studio => 'S',
            LandmarkKind::Stage => '*',
            LandmarkKind::Gym => 'G',
            LandmarkKind::Park => 'o',
        };
        buf.set(
            cx,
            cy,
            Cell {
                ch,
                fg: Color::Cyan,
                bg: ground,
            },
        );
    }

    for n in &folk.npcs {
        let (cx, cy) = view.cell(n.x, n.y);
        buf.set(
            cx,
            cy,
            Cell {
                ch: '&',
                fg: Color::Magenta,
                bg: ground,
            },
        );
    }

    for fx in &game.session.fx {
        let (cx, cy) = view.cell(fx.x, fx.y);
        let ch = match fx.kind {
            FxKind::Dust => '~',
            FxKind::Swing => '×',
            FxKind::Hop => '^',
        };
        buf.set(
            cx,
            cy,
            Cell {
                ch,
                fg: Color::White,
                bg: ground,
            },
        );
    }

    let p = &game.player;
    let (cx, cy) = view.cell(p.x, p.y);
    let fg = match p.role {
        Role::Actor => Color::Yellow,
        Role::Thug => Color::Red,
        Role::Police => Color::Blue,
    };
    let ch = if game.is_dead() {
        'x'
    } else if p.timers.jump > 0.0 {
        'Ô'
    } else {
        '@'
    };
    buf.set(cx, cy, Cell { ch, fg, bg: ground });
}

pub(crate) fn draw_hud(buf: &mut CellBuffer, hud: &Hud) {
    let bg = Color::Black;
    let fg = Color::White;
    let title = format!(
        "{}  |  {}  |  ${}  |  rent {}  |  vault {}  |  show {}",
        hud.role.label(),
        hud.area,
        hud.money,
        hud.rent,
        hud.vault,
        hud.show
    );
    draw_text(buf, 1, 0, &title, fg, bg);

    let meters = [
        ("HP", hud.health / hud.health_max.max(1.0) * 100.0, hud.health),
        ("ST", hud.stamina / hud.stamina_max.max(1.0) * 100.0, hud.stamina),
        ("Food", hud.needs.hunger, hud.needs.hunger),
        ("Sleep", hud.needs.sleep, hud.needs.sleep),
        ("Hyg", hud.needs.hygiene, hud.needs.hygiene),
        ("Fit", hud.needs.fitness, hud.needs.fitness),
    ];
    let mut x = 1u16;
    for (name, pct, value) in meters {
        let s = format!("{name} {} {:>3.0} ", bar(pct / 100.0, 6), value);
        draw_text(buf, x, 1, &s, need_color(pct), bg);
        x += s.chars().count() as u16;
    }
}

pub(crate) fn draw_footer(buf: &mut CellBuffer, prompt: &str, toasts: &[String]) {
    let bg = Color::Black;
    let base = buf.h.saturating_sub(FOOTER_ROWS);
    if let Some(last) = toasts.last() {
        draw_text(buf, 1, base, last, Color::Yellow, bg);
    }
    draw_text(buf, 1, base + 1, prompt, Color::Cyan, bg);
    draw_text(
        buf,
        1,
        base + 2,
        "wasd move (caps sprint) | space jump | k dodge | j punch | e/r use | p phone | o overlay | b spawn | q quit",
        Color::DarkGrey,
        bg,
    );
}

pub(crate) fn draw_overlay(buf: &mut CellBuffer, overlay: &Overlay) {
    let mut body = vec![overlay.vault.clone(), overlay.phone.clone(), String::new()];
    for q in &overlay.quests {
        let mark = if q.done { "[x]" } else { "[ ]" };
        body.push(format!("{mark} {}: {}", q.title, q.status));
    }
    if let Some(d) = &overlay.dialogue {
        body.push(String::new());
        body.push(format!("{}:", d.name));
        body.extend(d.lines.iter().map(|l| format!("  \"{l}\"")));
    }
    draw_box(buf, "Phone", &body, 64);
}

pub(crate) fn draw_dialogue(buf: &mut CellBuffer, overlay: &Overlay) {
    let Some(d) = &overlay.dialogue else {
        return;
    };
    let base = buf.h.saturating_sub(FOOTER_ROWS + 1 + d.lines.len() as u16);
    draw_text(buf, 2, base, &format!("{}:", d.name), Color::Magenta, Color::Black);
    for (i, line) in d.lines.iter().enumerate() {
        draw_text(buf, 4, base + 1 + i as u16, line, Color::White, Color::Black);
    }
}

pub(crate) fn draw_menu(buf: &mut CellBuffer, role: Role, has_save: bool, toasts: &[String]) {
    let mut body = vec![
        "Keep yourself fed, rested and clean.".to_string(),
        "Pay attention to rent. Death is permanent.".to_string(),
        String::new(),
        format!("Role: {}   (tab to change)", role.label()),
        String::new(),
        "n  new game".to_string(),
    ];
    if has_save {
        body.push("c  continue".to_string());
    }
    body.push("q  quit".to_string());
    if let Some(last) = toasts.last() {
        body.push(String::new());
        body.push(last.clone());
    }
    draw_box(buf, "STREETLIFE", &body, 52);
}
