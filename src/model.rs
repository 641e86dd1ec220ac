//! Core data models for the tank grid viewer.
//! A map is a rectangular grid of single-character cells, classified once on load.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// The longer side, which drives the grid extent so non-square maps stay centered.
    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridCell {
    /// Open ground, drawn as an outline only.
    Empty,
    /// Selectable unit, drawn with the tank sprite.
    Tank,
    /// Obstacle, drawn as a filled block.
    Object,
    Team1,
    Team2,
    Team3,
    /// Any character the map format does not define; rendered like background.
    Unknown,
}

impl GridCell {
    pub const ALL: [GridCell; 7] = [
        GridCell::Empty,
        GridCell::Tank,
        GridCell::Object,
        GridCell::Team1,
        GridCell::Team2,
        GridCell::Team3,
        GridCell::Unknown,
    ];

    pub fn classify(code: char) -> Self {
        match code {
            ' ' => GridCell::Empty,
            'x' | 'X' => GridCell::Tank,
            'o' | 'O' => GridCell::Object,
            '1' => GridCell::Team1,
            '2' => GridCell::Team2,
            '3' => GridCell::Team3,
            _ => GridCell::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GridCell::Empty => "Empty",
            GridCell::Tank => "Tank",
            GridCell::Object => "Object",
            GridCell::Team1 => "Team 1",
            GridCell::Team2 => "Team 2",
            GridCell::Team3 => "Team 3",
            GridCell::Unknown => "Unknown",
        }
    }
}

/// Where the grid currently on screen came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapOrigin {
    Remote,
    Fallback,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridModel {
    size: GridSize,
    /// Row-major cells; length = width * height.
    cells: Vec<GridCell>,
}

impl GridModel {
    /// Builds a grid from rows of cell characters. The width is the longest row; shorter rows are
    /// padded with `Empty`.
    pub fn load<S: AsRef<str>>(rows: &[S]) -> Self {
        let width = rows
            .iter()
            .map(|r| r.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        let size = GridSize {
            width: width as u32,
            height: rows.len() as u32,
        };
        let mut cells = Vec::with_capacity(size.cell_count());
        for row in rows {
            let mut n = 0;
            for c in row.as_ref().chars() {
                cells.push(GridCell::classify(c));
                n += 1;
            }
            cells.extend(std::iter::repeat_n(GridCell::Empty, width - n));
        }
        Self { size, cells }
    }

    /// Fixed 10x10 demonstration map used whenever the remote map is unavailable.
    pub fn fallback() -> Self {
        const SIDE: u32 = 10;
        let rows: Vec<String> = (0..SIDE)
            .map(|y| {
                (0..SIDE)
                    .map(|x| {
                        if x == y && x % 3 == 0 {
                            'x'
                        } else if x + y == SIDE - 1 && x % 3 == 1 {
                            'o'
                        } else {
                            ' '
                        }
                    })
                    .collect()
            })
            .collect();
        Self::load(&rows)
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.size.width && (y as u32) < self.size.height
    }

    pub fn cell_at(&self, x: i32, y: i32) -> Option<GridCell> {
        if !self.contains(x, y) {
            return None;
        }
        let idx = (y as u32 * self.size.width + x as u32) as usize;
        self.cells.get(idx).copied()
    }

    /// Row-major iteration as `(position, cell)`.
    pub fn cells(&self) -> impl Iterator<Item = (Position, GridCell)> + '_ {
        let w = self.size.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (Position::new(i as u32 % w, i as u32 / w), *c))
    }

    pub fn count(&self, cell: GridCell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_code() {
        assert_eq!(GridCell::classify(' '), GridCell::Empty);
        assert_eq!(GridCell::classify('x'), GridCell::Tank);
        assert_eq!(GridCell::classify('X'), GridCell::Tank);
        assert_eq!(GridCell::classify('o'), GridCell::Object);
        assert_eq!(GridCell::classify('O'), GridCell::Object);
        assert_eq!(GridCell::classify('1'), GridCell::Team1);
        assert_eq!(GridCell::classify('2'), GridCell::Team2);
        assert_eq!(GridCell::classify('3'), GridCell::Team3);
        assert_eq!(GridCell::classify('4'), GridCell::Unknown);
        assert_eq!(GridCell::classify('#'), GridCell::Unknown);
    }

    #[test]
    fn load_two_by_two() {
        let grid = GridModel::load(&["xo", "  "]);
        assert_eq!(grid.size(), GridSize { width: 2, height: 2 });
        assert_eq!(grid.cell_at(0, 0), Some(GridCell::Tank));
        assert_eq!(grid.cell_at(1, 0), Some(GridCell::Object));
        assert_eq!(grid.cell_at(0, 1), Some(GridCell::Empty));
        assert_eq!(grid.cell_at(1, 1), Some(GridCell::Empty));
    }

    #[test]
    fn short_rows_are_padded_with_empty() {
        let grid = GridModel::load(&["x", "oo1", ""]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.cells().count(), 9);
        assert_eq!(grid.cell_at(0, 0), Some(GridCell::Tank));
        assert_eq!(grid.cell_at(1, 0), Some(GridCell::Empty));
        assert_eq!(grid.cell_at(2, 0), Some(GridCell::Empty));
        assert_eq!(grid.cell_at(2, 1), Some(GridCell::Team1));
        assert_eq!(grid.cell_at(0, 2), Some(GridCell::Empty));
    }

    #[test]
    fn cell_at_is_bounds_checked() {
        let grid = GridModel::load(&["xo"]);
        assert_eq!(grid.cell_at(-1, 0), None);
        assert_eq!(grid.cell_at(2, 0), None);
        assert_eq!(grid.cell_at(0, 1), None);
    }

    #[test]
    fn empty_input_yields_empty_grid() {
        let grid = GridModel::load::<&str>(&[]);
        assert!(grid.is_empty());
        assert_eq!(grid.size(), GridSize::default());
        assert_eq!(grid.cell_at(0, 0), None);
    }

    #[test]
    fn fallback_is_deterministic() {
        let grid = GridModel::fallback();
        assert_eq!(grid.size(), GridSize { width: 10, height: 10 });
        assert_eq!(grid, GridModel::fallback());
        for p in [(0, 0), (3, 3), (6, 6), (9, 9)] {
            assert_eq!(grid.cell_at(p.0, p.1), Some(GridCell::Tank));
        }
        for p in [(1, 8), (4, 5), (7, 2)] {
            assert_eq!(grid.cell_at(p.0, p.1), Some(GridCell::Object));
        }
        assert_eq!(grid.count(GridCell::Tank), 4);
        assert_eq!(grid.count(GridCell::Object), 3);
        assert_eq!(grid.count(GridCell::Empty), 93);
    }

    #[test]
    fn cells_iterates_row_major() {
        let grid = GridModel::load(&["xo", "12"]);
        let v: Vec<_> = grid.cells().collect();
        assert_eq!(v[1], (Position::new(1, 0), GridCell::Object));
        assert_eq!(v[2], (Position::new(0, 1), GridCell::Team1));
    }
}
