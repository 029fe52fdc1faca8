use crate::{Container, Scheduler, TickQueue};

/// A builder for a [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    scheduler: Option<Box<dyn Scheduler>>,
}

impl ContainerBuilder {
    /// Assigns the scheduler the container defers its resolution pass to.
    /// Defaults to a [`TickQueue`], which is drained by
    /// [`Container::tick`].
    pub fn with_scheduler<S: Scheduler>(&mut self, scheduler: S) -> &mut Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    /// Builds the container.
    #[must_use]
    pub fn build(self) -> Container {
        let scheduler: Box<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Box::new(TickQueue::new()),
        };
        Container::from_scheduler(scheduler)
    }
}
