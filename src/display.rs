use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

pub const CHIP8_DISPLAY_WIDTH: usize = 64;
pub const CHIP8_DISPLAY_HEIGHT: usize = 32;

/// sprites are always one byte wide
const SPRITE_WIDTH: usize = 8;

/// The 64x32 monochrome screen. Row 0 is the top, column 0 the left edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [[bool; CHIP8_DISPLAY_WIDTH]; CHIP8_DISPLAY_HEIGHT],
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer {
            pixels: [[false; CHIP8_DISPLAY_WIDTH]; CHIP8_DISPLAY_HEIGHT],
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer::default()
    }

    pub fn clear(&mut self) {
        for row in self.pixels.iter_mut() {
            row.fill(false);
        }
    }

    /// pixel at column `x`, row `y`; anything off-screen is dark
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn rows(&self) -> &[[bool; CHIP8_DISPLAY_WIDTH]; CHIP8_DISPLAY_HEIGHT] {
        &self.pixels
    }

    /// how many pixels are lit
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|&&p| p).count()
    }

    /// XOR a sprite onto the screen, one byte per row, MSB leftmost.
    ///
    /// The origin wraps around the screen but the sprite itself is clipped
    /// at the right and bottom edges. Returns true if any lit pixel was
    /// switched off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let col0 = x as usize % CHIP8_DISPLAY_WIDTH;
        let row0 = y as usize % CHIP8_DISPLAY_HEIGHT;
        let mut collision = false;

        for (dy, bits) in sprite.iter().enumerate() {
            let row = row0 + dy;
            if row >= CHIP8_DISPLAY_HEIGHT {
                break;
            }
            for dx in 0..SPRITE_WIDTH {
                let col = col0 + dx;
                if col >= CHIP8_DISPLAY_WIDTH {
                    break;
                }
                if bits & (0x80 >> dx) == 0 {
                    continue;
                }
                let pixel = &mut self.pixels[row][col];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }
        collision
    }
}

/// Display is used by the host to draw things on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// draw a whole frame
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error>;
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coords of every pixel in the frame that is `lit` (or not)
    fn bitplane_from_frame<'a>(
        &self,
        frame: &'a Framebuffer,
        lit: bool,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        frame
            .rows()
            .iter()
            .enumerate()
            .flat_map(|(y, row)| row.iter().enumerate().map(move |(x, &p)| (x, y, p)))
            .filter(move |&(_, _, p)| p == lit)
            .map(|(x, y, _)| {
                (
                    x as f64,        // x
                    -1.0 * y as f64, // y
                )
            })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT),
        })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        let dark: Vec<_> = self.resolution.bitplane_from_frame(frame, false).collect();
        let lit: Vec<_> = self.resolution.bitplane_from_frame(frame, true).collect();
        let x_bounds = self.resolution.x_bounds();
        let y_bounds = self.resolution.y_bounds();
        let (w, h) = (self.resolution.0 as u16, self.resolution.1 as u16);

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + w, 2 + h);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &dark,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; remembers how often it drew
#[derive(Default)]
pub struct DummyDisplay {
    pub frames_drawn: usize,
    pub last_lit: usize,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        self.frames_drawn += 1;
        self.last_lit = frame.lit_count();
        Ok(())
    }
}
