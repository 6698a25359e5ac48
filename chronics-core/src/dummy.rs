//! This module is used for tests.
use crate::base::{Backend, Handler, HandlerConfig, HandlerRole, HandlerState, ReproParams};
use crate::record::InjectionRecord;
use crate::rng::EpisodeRng;
use anyhow::Result;
use std::collections::HashMap;

/// Handler implementing nothing beyond the lifecycle.
///
/// Every stepping operation is left at its default, so invoking one
/// surfaces the `NotSupported` error of the contract.
pub struct DummyHandler {
    state: HandlerState,
}

impl DummyHandler {
    /// Creates a handler for the named quantity.
    pub fn new(array_name: impl Into<String>, rng: EpisodeRng) -> Self {
        Self {
            state: HandlerState::new(array_name, rng),
        }
    }
}

impl Handler for DummyHandler {
    fn state(&self) -> &HandlerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut HandlerState {
        &mut self.state
    }

    fn done(&self) -> bool {
        self.state.exhausted()
    }
}

/// Real-time and forecast handler repeating a fixed array.
///
/// Its forecasts are perfect: every supported horizon predicts the same
/// array it serves in real time.
pub struct ConstantHandler {
    state: HandlerState,
    values: Vec<f32>,
}

impl ConstantHandler {
    /// Creates a handler repeating `values` for the named quantity.
    pub fn new(array_name: impl Into<String>, values: Vec<f32>, rng: EpisodeRng) -> Self {
        Self {
            state: HandlerState::new(array_name, rng),
            values,
        }
    }

    /// Builds the handler from a configuration and an episode seed.
    pub fn build(config: &HandlerConfig, values: Vec<f32>, seed: u64) -> Self {
        Self {
            state: HandlerState::build(config, seed),
            values,
        }
    }
}

impl Handler for ConstantHandler {
    fn state(&self) -> &HandlerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut HandlerState {
        &mut self.state
    }

    fn done(&self) -> bool {
        self.state.exhausted()
    }

    fn roles(&self) -> Vec<HandlerRole> {
        vec![HandlerRole::Realtime, HandlerRole::Forecast]
    }

    #[allow(unused_variables)]
    fn initialize(
        &mut self,
        order_backend_arrays: &[String],
        names_chronics_to_backend: &HashMap<String, String>,
    ) -> Result<()> {
        // constant data is order-independent, nothing to rebind
        self.state.mark_initialized()?;
        Ok(())
    }

    fn check_validity(&self, backend: &dyn Backend) -> Result<bool> {
        Ok(backend.n_elements(self.state.array_name()) == Some(self.values.len()))
    }

    fn load_next(&mut self, _inj_dict: &InjectionRecord) -> Result<Option<Vec<f32>>> {
        self.state.ensure_configured("load_next")?;
        Ok(self.state.advance().map(|_| self.values.clone()))
    }

    #[allow(unused_variables)]
    fn forecast(
        &mut self,
        forecast_horizon_id: usize,
        inj_dict_env: &InjectionRecord,
        inj_dict_previous_forecast: &InjectionRecord,
        env_handler: &dyn Handler,
        env_handlers: &[&dyn Handler],
    ) -> Result<Option<Vec<f32>>> {
        self.state.ensure_configured("forecast")?;
        Ok(self
            .state
            .horizon(forecast_horizon_id)
            .map(|_| self.values.clone()))
    }

    #[allow(unused_variables)]
    fn future_data(&self, horizon: usize) -> Option<Vec<f32>> {
        Some(self.values.clone())
    }

    fn repro_params(&self) -> ReproParams {
        let mut params = ReproParams::new();
        params.insert(
            "seed".to_string(),
            serde_yaml::Value::Number(self.state.seed().into()),
        );
        params
    }
}

/// Backend exposing the same element count for every array.
pub struct DummyBackend {
    n: usize,
}

impl DummyBackend {
    /// Creates a backend with `n` elements per array.
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl Backend for DummyBackend {
    fn n_elements(&self, _array_name: &str) -> Option<usize> {
        Some(self.n)
    }

    fn element_names(&self, array_name: &str) -> Vec<String> {
        (0..self.n)
            .map(|i| format!("{}_{}", array_name, i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChronicsError;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_constant_handler_episode() -> Result<()> {
        let config = HandlerConfig::new("load_p").max_iter(3).h_forecast(&[1, 3, 6]);
        let mut h = ConstantHandler::build(&config, vec![1.0, 2.0], 42);
        h.set_times(t0(), Duration::minutes(5));
        h.initialize(&[], &HashMap::new())?;
        assert!(h.check_validity(&DummyBackend::new(2))?);
        assert!(!h.check_validity(&DummyBackend::new(3))?);

        let empty = InjectionRecord::empty();
        for _ in 0..3 {
            assert!(!h.done());
            assert_eq!(h.load_next(&empty)?, Some(vec![1.0, 2.0]));
        }
        assert_eq!(h.load_next(&empty)?, None);
        assert!(h.done());
        Ok(())
    }

    #[test]
    fn test_constant_handler_forecast() -> Result<()> {
        let mut h = ConstantHandler::new("load_p", vec![1.0], EpisodeRng::from_seed(0));
        let env_handler = ConstantHandler::new("load_p", vec![1.0], EpisodeRng::from_seed(1));
        h.set_h_forecast(&[1, 3, 6]);
        h.set_times(t0(), Duration::minutes(5));
        h.initialize(&[], &HashMap::new())?;

        let empty = InjectionRecord::empty();
        let data = h.forecast(1, &empty, &empty, &env_handler, &[])?;
        assert_eq!(data, Some(vec![1.0]));
        // horizon id out of range: no forecast, not an error
        let data = h.forecast(3, &empty, &empty, &env_handler, &[])?;
        assert_eq!(data, None);
        Ok(())
    }

    #[test]
    fn test_stepping_before_configuration_is_an_error() {
        let mut h = ConstantHandler::new("load_p", vec![1.0], EpisodeRng::from_seed(0));
        let err = h.load_next(&InjectionRecord::empty()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChronicsError>(),
            Some(ChronicsError::NotConfigured { .. })
        ));
    }

    #[test]
    fn test_initialize_before_set_times_is_an_error() {
        let mut h = ConstantHandler::new("load_p", vec![1.0], EpisodeRng::from_seed(0));
        let err = h.initialize(&[], &HashMap::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChronicsError>(),
            Some(ChronicsError::NotConfigured { .. })
        ));
    }

    #[test]
    fn test_repro_params_carry_seed() {
        let h = ConstantHandler::new("load_p", vec![1.0], EpisodeRng::from_seed(42));
        let params = h.repro_params();
        assert_eq!(
            params.get("seed"),
            Some(&serde_yaml::Value::Number(42u64.into()))
        );
    }

    #[test]
    fn test_roles() {
        let h = ConstantHandler::new("load_p", vec![1.0], EpisodeRng::from_seed(0));
        assert_eq!(h.roles(), vec![HandlerRole::Realtime, HandlerRole::Forecast]);
        assert!(!h.roles().contains(&HandlerRole::Maintenance));
    }
}
