//! State shared by every time series handler.
use super::HandlerConfig;
use crate::{error::ChronicsError, rng::EpisodeRng};
use chrono::{Duration, NaiveDateTime};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Forecast horizons served when none are configured.
const DEFAULT_H_FORECAST: &[usize] = &[5];

/// Stage of a handler within an episode.
///
/// No transition skips `Configured`: stepping operations invoked on an
/// `Unconfigured` handler are a programming error of the driver, which
/// concrete handlers detect with [`HandlerState::ensure_configured`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Constructed, episode timing not established yet.
    Unconfigured,
    /// Timing established, ready to be initialized and stepped.
    Configured,
    /// At least one stepping operation has been served.
    Stepping,
    /// No more data will be served this episode.
    Exhausted,
}

/// The episode's wall-clock anchor and fixed step duration.
///
/// The two values are established together by `set_times` and cleared
/// together by the episode reset; storing them as one pair makes a
/// half-set anchor unrepresentable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpisodeTimes {
    /// Wall-clock time of step 0.
    pub init_datetime: NaiveDateTime,
    /// Duration of one simulation step.
    pub time_interval: Duration,
}

impl EpisodeTimes {
    /// Wall-clock time of the given step.
    pub fn datetime_at(&self, step: u64) -> NaiveDateTime {
        self.init_datetime + self.time_interval * (step as i32)
    }
}

/// State embedded by every concrete handler.
///
/// Handlers expose it through [`Handler::state`](super::Handler::state)
/// and [`Handler::state_mut`](super::Handler::state_mut); all
/// configuration operations of the contract are provided on the trait by
/// delegating here, so the invariants (joint time lifecycle, `-1`
/// sentinel, never-empty horizons) live in a single place.
#[derive(Clone, Debug)]
pub struct HandlerState {
    array_name: String,
    max_iter: i64,
    max_episode_duration: Option<u64>,
    times: Option<EpisodeTimes>,
    h_forecast: Vec<usize>,
    path: Option<PathBuf>,
    rng: EpisodeRng,
    step: u64,
    stage: Stage,
}

impl HandlerState {
    /// Creates the state of a handler serving the named quantity.
    pub fn new(array_name: impl Into<String>, rng: EpisodeRng) -> Self {
        Self {
            array_name: array_name.into(),
            max_iter: -1,
            max_episode_duration: None,
            times: None,
            h_forecast: DEFAULT_H_FORECAST.to_vec(),
            path: None,
            rng,
            step: 0,
            stage: Stage::Unconfigured,
        }
    }

    /// Builds the state from a configuration and an episode seed.
    pub fn build(config: &HandlerConfig, seed: u64) -> Self {
        let mut state = Self::new(config.array_name.clone(), EpisodeRng::from_seed(seed));
        state.max_iter = config.max_iter;
        state.max_episode_duration = config.max_episode_duration;
        state.set_h_forecast(&config.h_forecast);
        state.path = config.path.clone();
        state
    }

    /// The quantity this handler supplies. Never changes after construction.
    pub fn array_name(&self) -> &str {
        &self.array_name
    }

    /// Sets the maximum number of steps to serve; `None` means unbounded.
    pub fn set_max_iter(&mut self, max_iter: Option<i64>) {
        self.max_iter = max_iter.unwrap_or(-1);
    }

    /// The current bound on served steps, `-1` when unbounded.
    pub fn max_iter(&self) -> i64 {
        self.max_iter
    }

    /// Sets the hard cap on episode length; `None` means no cap.
    pub fn set_max_episode_duration(&mut self, max_episode_duration: Option<u64>) {
        self.max_episode_duration = max_episode_duration;
    }

    /// The hard cap on episode length, if any.
    pub fn max_episode_duration(&self) -> Option<u64> {
        self.max_episode_duration
    }

    /// Records the storage location of the handler's data.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// The storage location, for handlers backed by on-disk data.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Establishes the episode's time anchor and step duration jointly.
    pub fn set_times(&mut self, init_datetime: NaiveDateTime, time_interval: Duration) {
        self.times = Some(EpisodeTimes {
            init_datetime,
            time_interval,
        });
        if self.stage == Stage::Unconfigured {
            self.stage = Stage::Configured;
        }
    }

    /// The episode timing, once established.
    pub fn times(&self) -> Option<&EpisodeTimes> {
        self.times.as_ref()
    }

    /// Wall-clock time of step 0, once established.
    pub fn init_datetime(&self) -> Option<NaiveDateTime> {
        self.times.map(|t| t.init_datetime)
    }

    /// Duration of one step, once established.
    pub fn time_interval(&self) -> Option<Duration> {
        self.times.map(|t| t.time_interval)
    }

    /// Resets the handler for the next episode.
    ///
    /// Unsets the time anchor and step duration together and returns the
    /// stage to `Unconfigured`. Horizons, bounds and path survive so the
    /// handler can be re-timed and reused.
    pub fn clear(&mut self) {
        self.times = None;
        self.step = 0;
        self.stage = Stage::Unconfigured;
    }

    /// Sets the supported forecast lead-times, in steps ahead.
    ///
    /// Caller order is preserved; duplicates are dropped (first occurrence
    /// wins). An empty list keeps the previous horizons: a handler always
    /// has at least one.
    pub fn set_h_forecast(&mut self, h_forecast: &[usize]) {
        let mut horizons: Vec<usize> = Vec::with_capacity(h_forecast.len());
        for &h in h_forecast {
            if !horizons.contains(&h) {
                horizons.push(h);
            }
        }
        if horizons.is_empty() {
            warn!(
                "handler \"{}\": ignoring empty forecast horizon list",
                self.array_name
            );
            return;
        }
        self.h_forecast = horizons;
    }

    /// The supported forecast lead-times. Returns a copy.
    pub fn available_horizons(&self) -> Vec<usize> {
        self.h_forecast.clone()
    }

    /// The lead-time of the given horizon id, if it exists.
    pub fn horizon(&self, forecast_horizon_id: usize) -> Option<usize> {
        self.h_forecast.get(forecast_horizon_id).copied()
    }

    /// The number of supported horizons.
    pub fn n_horizons(&self) -> usize {
        self.h_forecast.len()
    }

    /// The random source of the handler.
    pub fn rng(&mut self) -> &mut EpisodeRng {
        &mut self.rng
    }

    /// The seed of the handler's random source.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Reseeds the handler's random source.
    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    /// The current lifecycle stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The number of steps served so far this episode.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Validates the state at `initialize` time.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicsError::NotConfigured`] when `set_times` has not
    /// been called.
    pub fn mark_initialized(&mut self) -> Result<(), ChronicsError> {
        if self.times.is_none() {
            return Err(ChronicsError::NotConfigured {
                array_name: self.array_name.clone(),
                reason: "set_times must be called before initialize".to_string(),
            });
        }
        self.stage = Stage::Configured;
        Ok(())
    }

    /// Guard for stepping operations.
    ///
    /// # Errors
    ///
    /// Returns [`ChronicsError::NotConfigured`] when the handler is still
    /// `Unconfigured`.
    pub fn ensure_configured(&self, operation: &'static str) -> Result<(), ChronicsError> {
        match self.stage {
            Stage::Unconfigured => Err(ChronicsError::NotConfigured {
                array_name: self.array_name.clone(),
                reason: format!("`{}` called on an unconfigured handler", operation),
            }),
            _ => Ok(()),
        }
    }

    /// Whether a configured bound has been reached.
    ///
    /// Exhaustion wins as soon as *either* `max_iter` or
    /// `max_episode_duration` is reached.
    pub fn limits_reached(&self) -> bool {
        let iter_done = self.max_iter >= 0 && self.step >= self.max_iter as u64;
        let duration_done = self
            .max_episode_duration
            .map_or(false, |cap| self.step >= cap);
        iter_done || duration_done
    }

    /// Moves to the next step, or to `Exhausted` when a bound is reached.
    ///
    /// Returns the new step count, or `None` once exhausted. Concrete
    /// handlers call this at the top of `load_next` and translate `None`
    /// into the exhaustion signal.
    pub fn advance(&mut self) -> Option<u64> {
        if self.limits_reached() {
            self.mark_exhausted();
            return None;
        }
        self.stage = Stage::Stepping;
        self.step += 1;
        Some(self.step)
    }

    /// Marks the handler exhausted, for source-driven exhaustion.
    pub fn mark_exhausted(&mut self) {
        if self.stage != Stage::Exhausted {
            debug!(
                "handler \"{}\" exhausted after {} steps",
                self.array_name, self.step
            );
            self.stage = Stage::Exhausted;
        }
    }

    /// Whether the handler has no more data to serve this episode.
    pub fn exhausted(&self) -> bool {
        self.stage == Stage::Exhausted || self.limits_reached()
    }

    /// Wall-clock time of the current step, once timing is established.
    pub fn current_datetime(&self) -> Option<NaiveDateTime> {
        self.times.map(|t| t.datetime_at(self.step))
    }

    /// Wall-clock time the given horizon id points at, from the current step.
    pub fn forecast_datetime(&self, forecast_horizon_id: usize) -> Option<NaiveDateTime> {
        match (self.times, self.horizon(forecast_horizon_id)) {
            (Some(t), Some(h)) => Some(t.datetime_at(self.step + h as u64)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn state() -> HandlerState {
        HandlerState::new("load_p", EpisodeRng::from_seed(0))
    }

    #[test]
    fn test_max_iter_sentinel() {
        let mut state = state();
        assert_eq!(state.max_iter(), -1);
        state.set_max_iter(Some(10));
        assert_eq!(state.max_iter(), 10);
        state.set_max_iter(None);
        assert_eq!(state.max_iter(), -1);
    }

    #[test]
    fn test_max_episode_duration_absent_is_not_zero() {
        let mut state = state();
        state.set_max_episode_duration(Some(0));
        assert_eq!(state.max_episode_duration(), Some(0));
        state.set_max_episode_duration(None);
        assert_eq!(state.max_episode_duration(), None);
        assert!(!state.limits_reached());
    }

    #[test]
    fn test_times_joint_lifecycle() {
        let mut state = state();
        assert!(state.init_datetime().is_none());
        assert!(state.time_interval().is_none());

        state.set_times(t0(), Duration::minutes(5));
        assert!(state.init_datetime().is_some());
        assert!(state.time_interval().is_some());
        assert_eq!(state.stage(), Stage::Configured);

        state.clear();
        assert!(state.init_datetime().is_none());
        assert!(state.time_interval().is_none());
        assert_eq!(state.stage(), Stage::Unconfigured);
    }

    #[test]
    fn test_clear_keeps_horizons() {
        let mut state = state();
        state.set_h_forecast(&[1, 3, 6]);
        state.set_times(t0(), Duration::minutes(5));
        assert_eq!(state.available_horizons(), vec![1, 3, 6]);

        state.clear();
        assert_eq!(state.available_horizons(), vec![1, 3, 6]);
    }

    #[test]
    fn test_h_forecast_dedup_and_never_empty() {
        let mut state = state();
        assert_eq!(state.available_horizons(), vec![5]);
        state.set_h_forecast(&[3, 1, 3, 6, 1]);
        assert_eq!(state.available_horizons(), vec![3, 1, 6]);
        state.set_h_forecast(&[]);
        assert_eq!(state.available_horizons(), vec![3, 1, 6]);
    }

    #[test]
    fn test_either_limit_exhausts() {
        let mut state = state();
        state.set_max_iter(Some(5));
        state.set_max_episode_duration(Some(3));
        state.set_times(t0(), Duration::minutes(5));
        for expected in 1..=3 {
            assert_eq!(state.advance(), Some(expected));
        }
        assert_eq!(state.advance(), None);
        assert!(state.exhausted());
        assert_eq!(state.stage(), Stage::Exhausted);
    }

    #[test]
    fn test_unbounded_advance() {
        let mut state = state();
        state.set_times(t0(), Duration::minutes(5));
        for expected in 1..=100 {
            assert_eq!(state.advance(), Some(expected));
        }
        assert!(!state.exhausted());
        assert_eq!(state.stage(), Stage::Stepping);
    }

    #[test]
    fn test_initialize_requires_times() {
        let mut state = state();
        assert!(matches!(
            state.mark_initialized(),
            Err(ChronicsError::NotConfigured { .. })
        ));
        state.set_times(t0(), Duration::minutes(5));
        assert!(state.mark_initialized().is_ok());
    }

    #[test]
    fn test_step_guard() {
        let mut state = state();
        assert!(matches!(
            state.ensure_configured("load_next"),
            Err(ChronicsError::NotConfigured { .. })
        ));
        state.set_times(t0(), Duration::minutes(5));
        assert!(state.ensure_configured("load_next").is_ok());
    }

    #[test]
    fn test_datetimes() {
        let mut state = state();
        state.set_h_forecast(&[1, 3, 6]);
        state.set_times(t0(), Duration::minutes(5));
        assert_eq!(state.current_datetime(), Some(t0()));
        state.advance();
        assert_eq!(state.current_datetime(), Some(t0() + Duration::minutes(5)));
        // horizon id 1 is 3 steps ahead of the current step
        assert_eq!(
            state.forecast_datetime(1),
            Some(t0() + Duration::minutes(5 + 15))
        );
        assert_eq!(state.forecast_datetime(9), None);
    }
}
