#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
    pub ticks: u32,
    pub dropped: u32,
    pub delay_ms: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    frame_ms: u64,
    max_catch_up: u32,
}

impl FrameClock {
    pub fn new(frame_ms: u64, max_catch_up: u32) -> Self {
        Self {
            frame_ms: frame_ms.max(1),
            max_catch_up,
        }
    }

    pub fn frame_ms(&self) -> u64 {
        self.frame_ms
    }

    /// Plans the next frame given how long the last one took. Overruns are
    /// counted in whole dropped frames and the wait realigns to the next
    /// frame boundary; at most `max_catch_up` extra ticks are run.
    pub fn plan(&self, elapsed_ms: u64) -> FramePlan {
        if elapsed_ms <= self.frame_ms {
            return FramePlan {
                ticks: 1,
                dropped: 0,
                delay_ms: self.frame_ms - elapsed_ms,
            };
        }
        let late = elapsed_ms - self.frame_ms;
        let dropped = late.div_ceil(self.frame_ms);
        let delay_ms = dropped * self.frame_ms - late;
        let dropped = u32::try_from(dropped).unwrap_or(u32::MAX);
        FramePlan {
            ticks: 1 + dropped.min(self.max_catch_up),
            dropped,
            delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_time_frame_waits_out_the_rest() {
        let clock = FrameClock::new(33, 4);
        assert_eq!(
            clock.plan(10),
            FramePlan {
                ticks: 1,
                dropped: 0,
                delay_ms: 23
            }
        );
        assert_eq!(clock.plan(33).delay_ms, 0);
    }

    #[test]
    fn late_frame_catches_up() {
        let clock = FrameClock::new(33, 4);
        assert_eq!(
            clock.plan(40),
            FramePlan {
                ticks: 2,
                dropped: 1,
                delay_ms: 26
            }
        );
        assert_eq!(
            clock.plan(99),
            FramePlan {
                ticks: 3,
                dropped: 2,
                delay_ms: 0
            }
        );
    }

    #[test]
    fn catch_up_is_bounded() {
        let clock = FrameClock::new(33, 4);
        let plan = clock.plan(10_000);
        assert_eq!(plan.ticks, 5);
        assert_eq!(plan.dropped, 303);
        assert!(plan.delay_ms < 33);
    }
}
