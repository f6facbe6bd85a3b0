use std::iter::successors;
use hifitime::{Duration, Epoch};
use log::debug;
use sgp4::MinutesSinceEpoch;
use crate::catalog::ElementRecord;
use crate::config::OrbitConfig;
use crate::earth_mesh::GeocentricPosition;
use crate::error::{OrbitError, Result};
use crate::time::minutes_since;

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct PositionSample {
    pub(crate) epoch: Epoch,
    pub(crate) position: GeocentricPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Trajectory {
    samples: Vec<PositionSample>,
}

impl Trajectory {
    pub(crate) fn samples(&self) -> &[PositionSample] {
        &self.samples
    }

    /// Position at the first instant of the window
    pub(crate) fn current(&self) -> Option<&PositionSample> {
        self.samples.first()
    }

    pub(crate) fn positions(&self) -> impl Iterator<Item = GeocentricPosition> + '_ {
        self.samples.iter().map(|sample| sample.position)
    }
}

pub(crate) struct TrajectorySampler {
    sample_count: usize,
    step: Duration,
}

impl TrajectorySampler {
    pub(crate) fn new(sample_count: usize, step: Duration) -> TrajectorySampler {
        TrajectorySampler { sample_count, step }
    }

    pub(crate) fn from_config(config: &OrbitConfig) -> TrajectorySampler {
        Self::new(config.sample_count, config.sample_step)
    }

    /// `sample_count` instants `step` apart, starting at `start`
    pub(crate) fn instants(&self, start: Epoch) -> impl Iterator<Item = Epoch> {
        let step = self.step;
        successors(Some(start), move |epoch| Some(*epoch + step)).take(self.sample_count)
    }

    ///
    /// Propagate the element set over the sampling window. Positions are in kilometers in the
    /// frame SGP4 produces (TEME).
    ///
    pub(crate) fn sample(&self, record: &ElementRecord, start: Epoch) -> Result<Trajectory> {
        debug!("Sampling {} from {} ({} samples)", record.name(), start, self.sample_count);

        let samples = self.instants(start)
            .map(|epoch| -> Result<PositionSample> {
                let minutes = minutes_since(record.element_datetime(), epoch)?;
                let prediction = record.constants()
                    .propagate(MinutesSinceEpoch(minutes))
                    .map_err(|error| OrbitError::Propagation {
                        name: record.name().to_string(),
                        reason: error.to_string(),
                    })?;
                Ok(PositionSample { epoch, position: prediction.position.into() })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Trajectory { samples })
    }
}
