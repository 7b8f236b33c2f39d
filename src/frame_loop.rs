//! Repeat-until-cancelled tasks driven by frame ticks.
//!
//! A task is requested once and then reported as due on every frame until its
//! handle is cancelled. The runtime's ticker decides how often frames happen;
//! nothing here depends on a particular rendering API.

/// Identifies one requested task. Cancelling a stale handle is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
pub struct FrameLoop<T> {
    tasks: Vec<(TaskHandle, T)>,
    next_id: u64,
}

impl<T> Default for FrameLoop<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T: Copy> FrameLoop<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to run on every frame until cancelled.
    pub fn request(&mut self, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push((handle, task));
        handle
    }

    pub fn cancel(&mut self, handle: TaskHandle) {
        self.tasks.retain(|(h, _)| *h != handle);
    }

    /// Cancels the handle in `slot`, if any, leaving the slot empty.
    pub fn cancel_slot(&mut self, slot: &mut Option<TaskHandle>) {
        if let Some(handle) = slot.take() {
            self.cancel(handle);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Every live task in request order.
    ///
    /// Tasks are not consumed; they come back on the next frame too.
    pub fn frame(&self) -> Vec<T> {
        self.tasks.iter().map(|(_, task)| *task).collect()
    }
}
