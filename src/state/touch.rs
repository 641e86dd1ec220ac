// Tracked pointers for pan/pinch gestures, keyed by pointer identity rather than slot order.
use glam::Vec2;

pub type PointerId = i32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPointer {
    pub id: PointerId,
    /// Last position in device pixels.
    pub screen: Vec2,
    /// Last position in world units at the zoom current when it was recorded.
    pub world: Vec2,
}

#[derive(Default, Debug, Clone)]
pub struct TouchState {
    pub touch1: Option<TrackedPointer>,
    pub touch2: Option<TrackedPointer>,
    pub pinch: bool,
    pub last_pinch_distance: f32,
}

impl TouchState {
    pub fn active_count(&self) -> usize {
        self.touch1.is_some() as usize + self.touch2.is_some() as usize
    }

    pub fn get(&self, id: PointerId) -> Option<&TrackedPointer> {
        [self.touch1.as_ref(), self.touch2.as_ref()]
            .into_iter()
            .flatten()
            .find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PointerId) -> Option<&mut TrackedPointer> {
        [self.touch1.as_mut(), self.touch2.as_mut()]
            .into_iter()
            .flatten()
            .find(|p| p.id == id)
    }

    /// Starts tracking a pointer in the first free slot. Returns false when both slots are taken
    /// or the pointer is already tracked.
    pub fn press(&mut self, pointer: TrackedPointer) -> bool {
        if self.get(pointer.id).is_some() {
            return false;
        }
        if self.touch1.is_none() {
            self.touch1 = Some(pointer);
        } else if self.touch2.is_none() {
            self.touch2 = Some(pointer);
        } else {
            return false;
        }
        true
    }

    /// Stops tracking `id`. The survivor is compacted into `touch1`, so after a partial lift
    /// `touch1` is always the pointer still down, whichever slot lifted.
    pub fn release(&mut self, id: PointerId) -> Option<TrackedPointer> {
        if self.touch1.is_some_and(|p| p.id == id) {
            let lifted = self.touch1.take();
            self.touch1 = self.touch2.take();
            lifted
        } else if self.touch2.is_some_and(|p| p.id == id) {
            self.touch2.take()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn pair(&self) -> Option<(TrackedPointer, TrackedPointer)> {
        Some((self.touch1?, self.touch2?))
    }
}
