//! Level countdown
//!
//! Remaining time only decreases and is floored at zero. Both signals are
//! edge-triggered: [`TimerSignal::Expiring`] fires the first time remaining
//! time drops to the alarm threshold, [`TimerSignal::Expired`] the first time
//! it reaches zero.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Expiring,
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelTimer {
    time_limit: f32,
    remaining: f32,
    alarm_threshold: f32,
    alarm_fired: bool,
    expired_fired: bool,
}

impl LevelTimer {
    pub fn new(time_limit: f32, alarm_threshold: f32) -> Self {
        Self {
            time_limit,
            remaining: time_limit,
            alarm_threshold,
            alarm_fired: false,
            expired_fired: false,
        }
    }

    /// Advance by `dt` seconds. Returns the signals crossed by this step, in order.
    pub fn tick(&mut self, dt: f32) -> impl Iterator<Item = TimerSignal> {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);

        let expiring = !self.alarm_fired && self.remaining <= self.alarm_threshold;
        if expiring {
            self.alarm_fired = true;
        }
        let expired = !self.expired_fired && self.remaining <= 0.0;
        if expired {
            self.expired_fired = true;
        }

        expiring
            .then_some(TimerSignal::Expiring)
            .into_iter()
            .chain(expired.then_some(TimerSignal::Expired))
    }

    pub fn time_limit(&self) -> f32 {
        self.time_limit
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn time_played(&self) -> f32 {
        self.time_limit - self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_fires_once() {
        let mut timer = LevelTimer::new(40.0, 30.0);
        assert_eq!(timer.tick(5.0).count(), 0);
        assert_eq!(timer.tick(6.0).collect::<Vec<_>>(), vec![TimerSignal::Expiring]);
        assert_eq!(timer.tick(1.0).count(), 0);
        assert_eq!(timer.tick(1.0).count(), 0);
    }

    #[test]
    fn test_remaining_floors_at_zero_and_expires_once() {
        let mut timer = LevelTimer::new(2.0, 1.0);
        let signals: Vec<_> = timer.tick(10.0).collect();
        assert_eq!(signals, vec![TimerSignal::Expiring, TimerSignal::Expired]);
        assert_eq!(timer.remaining(), 0.0);
        assert!(timer.is_expired());
        assert_eq!(timer.tick(1.0).count(), 0);
        assert_eq!(timer.remaining(), 0.0);
        assert_eq!(timer.time_played(), 2.0);
    }

    #[test]
    fn test_negative_dt_is_ignored() {
        let mut timer = LevelTimer::new(10.0, 1.0);
        timer.tick(-5.0).for_each(drop);
        assert_eq!(timer.remaining(), 10.0);
    }

    #[test]
    fn test_limit_below_alarm_fires_on_first_tick() {
        let mut timer = LevelTimer::new(20.0, 30.0);
        assert_eq!(timer.tick(0.0).collect::<Vec<_>>(), vec![TimerSignal::Expiring]);
    }
}
