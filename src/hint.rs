use std::path::Path;

use include_dir::{include_dir, Dir};
use unicode_width::UnicodeWidthChar;

use crate::error::Error;
use crate::viewer::ZoomTransform;

static HINTS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets/hints");

pub const DEFAULT_HINT: &str = "problem.txt";

/// The "problem" picture, kept as a grid of terminal cells.
#[derive(Debug, Clone, PartialEq)]
pub struct HintArt {
    cells: Vec<Vec<char>>,
    width: usize,
}

impl HintArt {
    pub fn from_text(text: &str) -> Self {
        let cells: Vec<Vec<char>> = text
            .lines()
            .map(|line| {
                let mut row = Vec::with_capacity(line.len());
                for c in line.chars() {
                    match c.width() {
                        Some(0) | None => {}
                        Some(2) => {
                            row.push(c);
                            // trailing half of a wide glyph
                            row.push(' ');
                        }
                        Some(_) => row.push(c),
                    }
                }
                row
            })
            .collect();
        let width = cells.iter().map(Vec::len).max().unwrap_or(0);
        Self { cells, width }
    }

    pub fn bundled() -> Self {
        let text = HINTS
            .get_file(DEFAULT_HINT)
            .and_then(|f| f.contents_utf8())
            .unwrap_or("(no hint available)");
        Self::from_text(text)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Hint {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(&text))
    }

    /// The configured hint, or the bundled one if there is none or it cannot be read.
    pub fn load_or_bundled(path: Option<&Path>) -> Self {
        match path.map(Self::load) {
            Some(Ok(art)) => art,
            Some(Err(err)) => {
                tracing::warn!(%err, "falling back to bundled hint");
                Self::bundled()
            }
            None => Self::bundled(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, x: i64, y: i64) -> char {
        if x < 0 || y < 0 {
            return ' ';
        }
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(' ')
    }

    /// The art cell visible at viewport cell (`col`, `row`) of a `view_w` x `view_h`
    /// viewport. Scaling is about the viewport centre; offsets move the picture.
    pub fn sample(&self, transform: &ZoomTransform, view_w: u16, view_h: u16, col: u16, row: u16) -> char {
        let scale = transform.scale.max(f64::EPSILON);
        let art_x =
            (col as f64 - view_w as f64 / 2.0 - transform.translate_x) / scale + self.width as f64 / 2.0;
        let art_y = (row as f64 - view_h as f64 / 2.0 - transform.translate_y) / scale
            + self.height() as f64 / 2.0;
        self.cell(art_x.floor() as i64, art_y.floor() as i64)
    }
}

impl Default for HintArt {
    fn default() -> Self {
        Self::bundled()
    }
}
