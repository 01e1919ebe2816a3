//! Type-state builder for `Positioner`.
//!
//! The builder enforces at compile time that a camera, an actuator (or a
//! ready-made command link) and a calibration table are provided before
//! `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use droplet_traits::{Actuator, Camera, Clock, MonotonicClock};

use crate::calibration::CalibrationTable;
use crate::config::{ControlCfg, EstimatorCfg, LinkCfg};
use crate::controller::Controller;
use crate::error::{BuildError, Result};
use crate::estimator::Estimator;
use crate::link::{CommandLink, LineLink};
use crate::settle::CancelToken;

/// Dynamically dispatched controller as produced by the builder.
pub type Positioner = Controller<Box<dyn Camera>, Box<dyn CommandLink>>;

impl Positioner {
    /// Start building a Positioner.
    pub fn builder() -> PositionerBuilder<Missing, Missing, Missing> {
        PositionerBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

enum LinkSource {
    Actuator(Box<dyn Actuator>),
    Link(Box<dyn CommandLink>),
}

pub struct PositionerBuilder<C, A, T> {
    camera: Option<Box<dyn Camera>>,
    link: Option<LinkSource>,
    table: Option<Arc<CalibrationTable>>,
    estimator: Option<EstimatorCfg>,
    control: Option<ControlCfg>,
    link_cfg: Option<LinkCfg>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    cancel: Option<CancelToken>,
    _c: PhantomData<C>,
    _a: PhantomData<A>,
    _t: PhantomData<T>,
}

impl Default for PositionerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            camera: None,
            link: None,
            table: None,
            estimator: None,
            control: None,
            link_cfg: None,
            clock: None,
            cancel: None,
            _c: PhantomData,
            _a: PhantomData,
            _t: PhantomData,
        }
    }
}

fn validate(estimator: &EstimatorCfg, control: &ControlCfg) -> std::result::Result<(), BuildError> {
    if estimator.blur_kernel > 1 && estimator.blur_kernel % 2 == 0 {
        return Err(BuildError::InvalidConfig("blur_kernel must be odd"));
    }
    if estimator.min_area_px == 0 {
        return Err(BuildError::InvalidConfig("min_area_px must be >= 1"));
    }
    if control.success_threshold_px == 0 {
        return Err(BuildError::InvalidConfig("success_threshold_px must be >= 1"));
    }
    if control.settle_poll.is_zero() {
        return Err(BuildError::InvalidConfig("settle_poll must be > 0"));
    }
    Ok(())
}

impl<C, A, T> PositionerBuilder<C, A, T> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    ///
    /// Wrapping a raw actuator waits out the link boot delay on the configured clock.
    pub fn try_build(self) -> Result<Positioner> {
        let camera = self
            .camera
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCamera))?;
        let link_src = self
            .link
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let table = self
            .table
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCalibration))?;
        let estimator = self.estimator.unwrap_or_default();
        let control = self.control.unwrap_or_default();
        validate(&estimator, &control).map_err(eyre::Report::new)?;

        let clock: Arc<dyn Clock + Send + Sync> = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let link: Box<dyn CommandLink> = match link_src {
            LinkSource::Link(l) => l,
            LinkSource::Actuator(a) => Box::new(LineLink::open(
                a,
                &self.link_cfg.unwrap_or_default(),
                &clock,
            )),
        };

        Ok(Controller::new(
            camera,
            link,
            Estimator::new(estimator),
            table,
            control,
            clock,
            self.cancel.unwrap_or_default(),
        ))
    }
}

/// Chainable setters that do not affect type-state.
impl<C, A, T> PositionerBuilder<C, A, T> {
    pub fn with_estimator(mut self, cfg: EstimatorCfg) -> Self {
        self.estimator = Some(cfg);
        self
    }
    pub fn with_control(mut self, cfg: ControlCfg) -> Self {
        self.control = Some(cfg);
        self
    }
    pub fn with_link_cfg(mut self, cfg: LinkCfg) -> Self {
        self.link_cfg = Some(cfg);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Token that cuts the settle wait short; a fresh one is created otherwise.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn retype<C2, A2, T2>(self) -> PositionerBuilder<C2, A2, T2> {
        PositionerBuilder {
            camera: self.camera,
            link: self.link,
            table: self.table,
            estimator: self.estimator,
            control: self.control,
            link_cfg: self.link_cfg,
            clock: self.clock,
            cancel: self.cancel,
            _c: PhantomData,
            _a: PhantomData,
            _t: PhantomData,
        }
    }
}

// Setters that advance type-state
impl<A, T> PositionerBuilder<Missing, A, T> {
    pub fn with_camera(mut self, camera: impl Camera + 'static) -> PositionerBuilder<Set, A, T> {
        self.camera = Some(Box::new(camera));
        self.retype()
    }
}

impl<C, T> PositionerBuilder<C, Missing, T> {
    pub fn with_actuator(
        mut self,
        actuator: impl Actuator + 'static,
    ) -> PositionerBuilder<C, Set, T> {
        self.link = Some(LinkSource::Actuator(Box::new(actuator)));
        self.retype()
    }

    /// Use an already-open command link instead of a byte actuator.
    pub fn with_link(mut self, link: impl CommandLink + 'static) -> PositionerBuilder<C, Set, T> {
        self.link = Some(LinkSource::Link(Box::new(link)));
        self.retype()
    }
}

impl<C, A> PositionerBuilder<C, A, Missing> {
    pub fn with_calibration(
        mut self,
        table: impl Into<Arc<CalibrationTable>>,
    ) -> PositionerBuilder<C, A, Set> {
        self.table = Some(table.into());
        self.retype()
    }
}

impl PositionerBuilder<Set, Set, Set> {
    /// Validate and build. Only available when camera, actuator and table are set.
    pub fn build(self) -> Result<Positioner> {
        self.try_build()
    }
}
