use crossterm::event::{Event, KeyCode, MouseButton, MouseEventKind};
use std::io::Write;

use crate::canvas::TerminalCanvas;
use crate::color::Rgb;
use crate::config::Config;
use crate::patterns::PatternType;
use crate::show::Selection;
use crate::simulation::{Simulation, Viewport};
use crate::sound::SoundCue;

/// Ties terminal input and output to the simulation.
pub struct App {
    sim: Simulation,
    canvas: TerminalCanvas,
    world_height: f32,
    bg_color: Rgb,
}

fn viewport_of(canvas: &TerminalCanvas) -> Viewport {
    Viewport {
        width: canvas.world_width(),
        height: canvas.world_height(),
    }
}

impl App {
    pub fn new(cols: usize, rows: usize, config: &Config, sound: Box<dyn SoundCue>) -> Self {
        let canvas = TerminalCanvas::new(cols, rows, config.world_height, config.bg_color);
        let rng = config.seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        let sim = Simulation::new(viewport_of(&canvas), config.mode, sound, rng)
            .with_fade(config.fade)
            .with_selection(Selection {
                pattern: config.pattern,
                color: config.color,
            });

        Self {
            sim,
            canvas,
            world_height: config.world_height,
            bg_color: config.bg_color,
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn update(&mut self, now_ms: u64) {
        self.sim.tick(now_ms);
    }

    pub fn render<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.sim.draw(&mut self.canvas);
        self.canvas.present(out)
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => {
                    self.sim.launch_random();
                }
                KeyCode::Char(c @ '1'..='6') => {
                    let pattern = PatternType::ALL[c as usize - '1' as usize];
                    self.sim.selection_mut().pattern = pattern;
                    log::info!("pattern: {}", pattern);
                }
                KeyCode::Char('c') => {
                    let selection = self.sim.selection_mut();
                    selection.color = selection.color.next();
                    log::info!("color: {}", selection.color);
                }
                KeyCode::Char('m') => {
                    let mode = self.sim.mode().next();
                    self.sim.set_mode(mode);
                }
                _ => {}
            },
            Event::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    let (x, y) = self.canvas.cell_to_world(mouse.column, mouse.row);
                    if let Err(err) = self.sim.launch_at(x, y) {
                        log::warn!("click launch rejected: {}", err);
                    }
                }
            }
            Event::Resize(cols, rows) => {
                self.canvas = TerminalCanvas::new(*cols as usize, *rows as usize, self.world_height, self.bg_color);
                self.sim.resize(viewport_of(&self.canvas));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorChoice;
    use crate::show::ShowMode;
    use crate::sound::Silent;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};

    fn app() -> App {
        let config = Config {
            mode: ShowMode::Manual,
            seed: Some(1),
            ..Config::default()
        };
        App::new(80, 24, &config, Box::new(Silent))
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn test_number_keys_select_pattern() {
        let mut app = app();
        app.handle_event(&key('4'));
        assert_eq!(app.simulation().selection().pattern, PatternType::Crossette);
        app.handle_event(&key('6'));
        assert_eq!(app.simulation().selection().pattern, PatternType::Random);
    }

    #[test]
    fn test_color_and_mode_keys_cycle() {
        let mut app = app();
        app.handle_event(&key('c'));
        assert_eq!(app.simulation().selection().color, ColorChoice::Red);
        app.handle_event(&key('m'));
        assert_eq!(app.simulation().mode(), ShowMode::Festival);
    }

    #[test]
    fn test_space_launches() {
        let mut app = app();
        app.handle_event(&key(' '));
        assert_eq!(app.simulation().fireworks().len(), 1);
    }

    #[test]
    fn test_click_launches_at_point() {
        let mut app = app();
        app.handle_event(&Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 40,
            row: 6,
            modifiers: KeyModifiers::NONE,
        }));
        let fw = &app.simulation().fireworks()[0];
        let (x, y) = fw.target();
        // 48 pixel rows span 800 world units
        assert!((x - 40.5 * 800.0 / 48.0).abs() < 1e-2);
        assert!((y - 13.0 * 800.0 / 48.0).abs() < 1e-2);
    }

    #[test]
    fn test_resize_updates_viewport() {
        let mut app = app();
        app.handle_event(&Event::Resize(120, 24));
        let view = app.simulation().viewport();
        assert!((view.height - 800.0).abs() < 1e-2);
        assert!((view.width - 2000.0).abs() < 1e-1);
    }

    #[test]
    fn test_render_writes_frame() {
        let mut app = app();
        app.handle_event(&key(' '));
        app.update(16);
        let mut out = Vec::new();
        app.render(&mut out).unwrap();
        assert!(!out.is_empty());
    }
}
