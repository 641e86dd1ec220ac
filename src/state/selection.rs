// Tank selection: hit testing taps against the grid and reporting picks.
use std::rc::Rc;

use glam::Vec2;
use tracing::debug;

use super::camera::ViewState;
use crate::model::{GridCell, GridModel, Position};
use crate::transform::CellGeometry;

/// Fixed value sent alongside the grid coordinates of a highlighted tank.
pub const HIGHLIGHT_MARKER: u8 = 1;

/// Best-effort sink for selection telemetry. Implementations must not block and must swallow
/// their own failures; the controller never waits on or retries a report.
pub trait SelectionReporter {
    fn notify_selection(&self, position: Position);
}

/// Reporter that drops every notification.
pub struct NullReporter;

impl SelectionReporter for NullReporter {
    fn notify_selection(&self, _position: Position) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionUpdate {
    /// A tank cell was hit; the highlight must be rebuilt at this position.
    Selected(Position),
    /// The tap missed every tank. `was_selected` tells whether a highlight has to go away.
    Cleared { was_selected: bool },
}

impl SelectionUpdate {
    pub fn needs_rebuild(&self) -> bool {
        match self {
            SelectionUpdate::Selected(_) => true,
            SelectionUpdate::Cleared { was_selected } => *was_selected,
        }
    }
}

pub struct SelectionController {
    selected: Option<Position>,
    reporter: Rc<dyn SelectionReporter>,
}

impl SelectionController {
    pub fn new(reporter: Rc<dyn SelectionReporter>) -> Self {
        Self {
            selected: None,
            reporter,
        }
    }

    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    pub fn try_select(
        &mut self,
        world: Vec2,
        grid: &GridModel,
        view: &ViewState,
        geometry: &CellGeometry,
    ) -> SelectionUpdate {
        let (gx, gy) = geometry.world_to_cell(world, view.scroll);
        match grid.cell_at(gx, gy) {
            Some(GridCell::Tank) => {
                let pos = Position::new(gx as u32, gy as u32);
                self.selected = Some(pos);
                debug!(x = pos.x, y = pos.y, "tank selected");
                self.reporter.notify_selection(pos);
                SelectionUpdate::Selected(pos)
            }
            other => {
                debug!(x = gx, y = gy, cell = ?other, "tap missed tanks");
                SelectionUpdate::Cleared {
                    was_selected: self.clear(),
                }
            }
        }
    }

    /// Drops the selection. Returns whether there was one.
    pub fn clear(&mut self) -> bool {
        self.selected.take().is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::transform::{Viewport, screen_to_world, world_to_screen};

    #[derive(Default)]
    pub(crate) struct RecordingReporter {
        pub sent: RefCell<Vec<Position>>,
    }

    impl SelectionReporter for RecordingReporter {
        fn notify_selection(&self, position: Position) {
            self.sent.borrow_mut().push(position);
        }
    }

    fn setup() -> (SelectionController, Rc<RecordingReporter>, GridModel, CellGeometry) {
        let reporter = Rc::new(RecordingReporter::default());
        let controller = SelectionController::new(reporter.clone());
        let grid = GridModel::fallback();
        let geometry = CellGeometry::for_grid(&grid, 0.4);
        (controller, reporter, grid, geometry)
    }

    #[test]
    fn tap_at_center_of_tank_selects_and_reports() {
        let (mut sel, reporter, grid, geo) = setup();
        let view = ViewState::default();
        let vp = Viewport::new(1080.0, 1920.0);
        // go through screen space the way a real tap does
        let screen = world_to_screen(geo.cell_center(0, 0), vp, view.zoom());
        let world = screen_to_world(screen, vp, view.zoom());
        let update = sel.try_select(world, &grid, &view, &geo);
        assert_eq!(update, SelectionUpdate::Selected(Position::new(0, 0)));
        assert_eq!(sel.selected(), Some(Position::new(0, 0)));
        assert_eq!(*reporter.sent.borrow(), vec![Position::new(0, 0)]);
    }

    #[test]
    fn selection_accounts_for_scroll() {
        let (mut sel, _, grid, geo) = setup();
        let mut view = ViewState::default();
        view.scroll = Vec2::new(1.0, -0.5);
        let world = geo.cell_center(3, 3) + view.scroll;
        assert_eq!(
            sel.try_select(world, &grid, &view, &geo),
            SelectionUpdate::Selected(Position::new(3, 3))
        );
    }

    #[test]
    fn non_tank_tap_clears_selection() {
        let (mut sel, reporter, grid, geo) = setup();
        let view = ViewState::default();
        sel.try_select(geo.cell_center(6, 6), &grid, &view, &geo);
        let update = sel.try_select(geo.cell_center(4, 5), &grid, &view, &geo);
        assert_eq!(update, SelectionUpdate::Cleared { was_selected: true });
        assert!(update.needs_rebuild());
        assert_eq!(sel.selected(), None);
        assert_eq!(reporter.sent.borrow().len(), 1);

        let update = sel.try_select(geo.cell_center(1, 1), &grid, &view, &geo);
        assert_eq!(update, SelectionUpdate::Cleared { was_selected: false });
        assert!(!update.needs_rebuild());
    }

    #[test]
    fn out_of_bounds_tap_clears_selection() {
        let (mut sel, _, grid, geo) = setup();
        let view = ViewState::default();
        sel.try_select(geo.cell_center(9, 9), &grid, &view, &geo);
        for world in [
            Vec2::new(-2.3, 0.0),
            Vec2::new(2.3, 0.1),
            Vec2::new(0.1, 2.3),
            Vec2::new(0.1, -2.3),
        ] {
            sel.try_select(geo.cell_center(9, 9), &grid, &view, &geo);
            assert_eq!(
                sel.try_select(world, &grid, &view, &geo),
                SelectionUpdate::Cleared { was_selected: true }
            );
            assert_eq!(sel.selected(), None);
        }
    }

    #[test]
    fn reselecting_reports_again() {
        let (mut sel, reporter, grid, geo) = setup();
        let view = ViewState::default();
        sel.try_select(geo.cell_center(3, 3), &grid, &view, &geo);
        sel.try_select(geo.cell_center(3, 3), &grid, &view, &geo);
        assert_eq!(reporter.sent.borrow().len(), 2);
    }
}
