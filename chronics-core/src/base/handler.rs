//! Time series handler contract.
use super::{Backend, HandlerState};
use crate::{error::ChronicsError, record::InjectionRecord};
use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use log::trace;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Reproducibility parameters contributed by a handler.
///
/// Owned and immutable once returned: the driver merges the maps of all
/// handlers into the episode configuration it serializes, so that the
/// episode can be replayed exactly given the same seed.
pub type ReproParams = BTreeMap<String, serde_yaml::Value>;

/// A stepping capability a concrete handler declares support for.
///
/// Drivers check the roles of a handler set when composing it, instead of
/// discovering an unsupported operation mid-episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerRole {
    /// Serves the value of its quantity for the current step.
    Realtime,
    /// Produces predicted values for the supported horizons.
    Forecast,
    /// Injects scheduled maintenance events.
    Maintenance,
    /// Injects hazard events.
    Hazard,
}

/// Represents a time series handler.
///
/// A handler supplies one physical quantity (e.g. `load_p` or the
/// maintenance schedule) to the simulation, one value array per step,
/// whatever the underlying source: recorded data replayed from storage,
/// procedurally generated values, scheduled events.
///
/// The driver owns one handler per quantity and advances them in
/// lockstep. Each episode it configures every handler (timing, horizons,
/// bounds, source path), calls [`Handler::initialize`] once to bind it to
/// the backend's naming and ordering, checks it with
/// [`Handler::check_validity`], then repeatedly calls the stepping
/// operations until [`Handler::done`] reports exhaustion.
///
/// Configuration operations are provided by the trait and delegate to the
/// shared [`HandlerState`]; a concrete handler only supplies the state
/// accessors, [`Handler::done`], and the operations of the roles it
/// declares in [`Handler::roles`]. Stepping operations left at their
/// default fail with [`ChronicsError::NotSupported`]; running out of data
/// is signalled with `Ok(None)`, never an error.
pub trait Handler {
    /// The shared state of the handler.
    fn state(&self) -> &HandlerState;

    /// The shared state of the handler, mutably.
    fn state_mut(&mut self) -> &mut HandlerState;

    /// Reports whether the handler has exhausted its data for this
    /// episode: a configured bound was reached or the underlying source
    /// ran dry. Callable at any point after `initialize`.
    fn done(&self) -> bool;

    /// The stepping capabilities this handler supports.
    ///
    /// The default is the empty set: configuration only.
    fn roles(&self) -> Vec<HandlerRole> {
        Vec::new()
    }

    /// The quantity this handler supplies.
    fn array_name(&self) -> &str {
        self.state().array_name()
    }

    /// Sets the maximum number of steps to serve; `None` is normalized to
    /// the unbounded sentinel `-1`.
    fn set_max_iter(&mut self, max_iter: Option<i64>) {
        self.state_mut().set_max_iter(max_iter);
    }

    /// The current bound on served steps, `-1` when unbounded.
    fn max_iter(&self) -> i64 {
        self.state().max_iter()
    }

    /// Sets the hard cap on episode length in steps; `None` means no cap.
    fn set_max_episode_duration(&mut self, max_episode_duration: Option<u64>) {
        self.state_mut()
            .set_max_episode_duration(max_episode_duration);
    }

    /// The hard cap on episode length, if any.
    fn max_episode_duration(&self) -> Option<u64> {
        self.state().max_episode_duration()
    }

    /// Records a storage location. Not validated at this layer; handlers
    /// that read from disk validate it at `initialize` time.
    fn set_path(&mut self, path: &Path) {
        self.state_mut().set_path(path);
    }

    /// The storage location, for handlers backed by on-disk data.
    fn path(&self) -> Option<&Path> {
        self.state().path()
    }

    /// Advisory hint for streaming storage backends.
    ///
    /// Chunked reading means nothing for data that does not come from
    /// disk, so the default accepts the call and ignores it.
    #[allow(unused_variables)]
    fn set_chunk_size(&mut self, chunk_size: Option<usize>) {
        trace!(
            "handler \"{}\": no storage, chunk size ignored",
            self.array_name()
        );
    }

    /// Establishes the episode's time anchor and step duration jointly.
    fn set_times(&mut self, init_datetime: NaiveDateTime, time_interval: Duration) {
        self.state_mut().set_times(init_datetime, time_interval);
    }

    /// Sets the supported forecast lead-times, in steps ahead.
    fn set_h_forecast(&mut self, h_forecast: &[usize]) {
        self.state_mut().set_h_forecast(h_forecast);
    }

    /// The supported forecast lead-times.
    ///
    /// Returns a copy: mutating the returned value does not affect the
    /// handler.
    fn available_horizons(&self) -> Vec<usize> {
        self.state().available_horizons()
    }

    /// Parameters needed to reproduce this handler's output exactly,
    /// given the same seed. The base contract contributes nothing.
    fn repro_params(&self) -> ReproParams {
        ReproParams::new()
    }

    /// Binds the handler to the backend's array ordering and naming.
    ///
    /// `order_backend_arrays` is the backend's canonical element
    /// ordering for this handler's quantity; `names_chronics_to_backend`
    /// maps the handler's own element names to the backend's. Must be
    /// called exactly once, after configuration and before any stepping
    /// operation.
    #[allow(unused_variables)]
    fn initialize(
        &mut self,
        order_backend_arrays: &[String],
        names_chronics_to_backend: &HashMap<String, String>,
    ) -> Result<()> {
        Err(ChronicsError::NotSupported {
            operation: "initialize",
            array_name: self.array_name().to_string(),
        }
        .into())
    }

    /// Confirms the data this handler would supply is structurally
    /// compatible with the given backend (dimensions, ordering). Called
    /// once after `initialize`, before stepping begins.
    #[allow(unused_variables)]
    fn check_validity(&self, backend: &dyn Backend) -> Result<bool> {
        Err(ChronicsError::NotSupported {
            operation: "check_validity",
            array_name: self.array_name().to_string(),
        }
        .into())
    }

    /// Advances the handler by one step and returns the real-time data
    /// for this step, or `None` once exhausted.
    ///
    /// `inj_dict` carries the environment-side state already assembled
    /// for this step, for handlers whose output depends on their peers'.
    #[allow(unused_variables)]
    fn load_next(&mut self, inj_dict: &InjectionRecord) -> Result<Option<Vec<f32>>> {
        Err(ChronicsError::NotSupported {
            operation: "load_next",
            array_name: self.array_name().to_string(),
        }
        .into())
    }

    /// Advances the handler by one step and returns the per-element
    /// maintenance flags for this step, or `None` once exhausted.
    fn load_next_maintenance(&mut self) -> Result<Option<Vec<bool>>> {
        Err(ChronicsError::NotSupported {
            operation: "load_next_maintenance",
            array_name: self.array_name().to_string(),
        }
        .into())
    }

    /// Advances the handler by one step and returns the per-element
    /// hazard flags for this step, or `None` once exhausted.
    fn load_next_hazard(&mut self) -> Result<Option<Vec<bool>>> {
        Err(ChronicsError::NotSupported {
            operation: "load_next_hazard",
            array_name: self.array_name().to_string(),
        }
        .into())
    }

    /// Produces the predicted value for one supported horizon, or `None`
    /// when no forecast can be produced for it.
    ///
    /// `forecast_horizon_id` indexes [`Handler::available_horizons`].
    /// `inj_dict_env` is the current real-time injection state and
    /// `inj_dict_previous_forecast` the previous forecast step's result,
    /// for handlers whose forecast depends on forecast continuity.
    /// `env_handler` is the sibling handler supplying the same quantity
    /// in real time, and `env_handlers` the full set of real-time
    /// siblings, so that a forecast can stay jointly consistent with the
    /// quantities it co-varies with. Siblings are observed, never
    /// mutated.
    #[allow(unused_variables)]
    fn forecast(
        &mut self,
        forecast_horizon_id: usize,
        inj_dict_env: &InjectionRecord,
        inj_dict_previous_forecast: &InjectionRecord,
        env_handler: &dyn Handler,
        env_handlers: &[&dyn Handler],
    ) -> Result<Option<Vec<f32>>> {
        Err(ChronicsError::NotSupported {
            operation: "forecast",
            array_name: self.array_name().to_string(),
        }
        .into())
    }

    /// Non-mutating lookahead at the given horizon, outside the forecast
    /// protocol. The default `None` means the handler does not support it.
    #[allow(unused_variables)]
    fn future_data(&self, horizon: usize) -> Option<Vec<f32>> {
        None
    }
}
