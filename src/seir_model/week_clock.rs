use{
    serde::{Serialize, Deserialize},
    std::num::*,
    crate::misc_types::NUM_DAY_GRAPHS,
};

/// # Rotating weekday index
/// * keeps track of which day graph is active without copying graphs around
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct WeekClock{
    start_day: usize,
    current_day: usize,
    bound: NonZeroUsize,
}

impl Default for WeekClock{
    fn default() -> Self {
        Self::new(NUM_DAY_GRAPHS)
    }
}

impl WeekClock {
    pub fn new(bound: usize) -> Self{
        Self{
            start_day: 0,
            current_day: 0,
            bound: NonZeroUsize::MIN.saturating_add(bound.saturating_sub(1)),
        }
    }

    /// Day at which the next run begins. Returns false if `day` is not
    /// inside the week.
    pub fn set_start_day(&mut self, day: usize) -> bool
    {
        if day >= self.bound.get() {
            return false;
        }
        self.start_day = day;
        self.current_day = day;
        true
    }

    pub fn start_day(&self) -> usize
    {
        self.start_day
    }

    #[inline]
    pub fn current_day(&self) -> usize
    {
        self.current_day
    }

    /// Next day - wraps around the end of the week
    #[inline]
    pub fn plus_1(&mut self){
        self.current_day += 1;
        if self.current_day >= self.bound.get() {
            self.current_day = 0;
        }
    }

    /// back to the start day of the run
    pub fn rewind(&mut self)
    {
        self.current_day = self.start_day;
    }
}
