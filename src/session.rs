//! Analysis session: the owner of all per-session data.
//!
//! A [`Session`] holds the sensor geometry, the validated frames, the
//! configuration, and the COP trajectory computed once at construction.
//! Field and ellipse are recomputed for whichever frame is displayed and
//! handed to a [`FrameSink`].

use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError};
#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SwayConfig;
use crate::dispersion::{confidence_ellipse, DispersionEllipse};
use crate::error::{Result, SwayError};
use crate::field::{synthesize_field, IntensityField};
use crate::frames::FrameSeries;
use crate::geometry::SensorGeometry;
use crate::scheduler::{FrameScheduler, PlaybackCommand, PlaybackState};
use crate::trajectory::{compute_cop_trajectory, path_length, valid_prefix, CopPoint};

/// Everything a renderer needs for one displayed frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FrameOutput {
    /// Zero-based frame index.
    pub index: usize,
    /// One-based frame number for display.
    pub display_number: usize,
    /// Unmerged heatmap samples.
    pub field: IntensityField,
    /// COP of this frame.
    pub cop: CopPoint,
    /// Defined COP points of frames `0..=index` (the trajectory line).
    pub trajectory: Vec<[f64; 2]>,
    /// Confidence ellipse of `trajectory`.
    pub ellipse: DispersionEllipse,
    /// Length of the trajectory line so far.
    pub path_length: f64,
}

/// Rendering collaborator: receives each displayed frame.
pub trait FrameSink {
    /// Consume the output for one displayed frame.
    fn present(&mut self, output: &FrameOutput);
}

impl FrameSink for Vec<FrameOutput> {
    fn present(&mut self, output: &FrameOutput) {
        self.push(output.clone());
    }
}

/// Read-only session data plus the cached COP trajectory.
#[derive(Debug, Clone)]
pub struct Session {
    geometry: SensorGeometry,
    frames: FrameSeries,
    config: SwayConfig,
    cops: Vec<CopPoint>,
}

impl Session {
    /// Build a session and compute the COP trajectory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the frames were
    /// validated against a geometry with a different sensor count.
    pub fn new(geometry: SensorGeometry, frames: FrameSeries, config: SwayConfig) -> Result<Self> {
        config.validate()?;
        let cops = compute_cop_trajectory(&frames, &geometry)?;

        info!(
            frames = frames.len(),
            sensors = geometry.len(),
            undefined_cops = cops.iter().filter(|c| !c.is_defined()).count(),
            "session loaded"
        );

        Ok(Self {
            geometry,
            frames,
            config,
            cops,
        })
    }

    /// Sensor geometry.
    #[must_use]
    pub const fn geometry(&self) -> &SensorGeometry {
        &self.geometry
    }

    /// Loaded frames.
    #[must_use]
    pub const fn frames(&self) -> &FrameSeries {
        &self.frames
    }

    /// Runtime configuration.
    #[must_use]
    pub const fn config(&self) -> &SwayConfig {
        &self.config
    }

    /// COP of every frame.
    #[must_use]
    pub fn cop_trajectory(&self) -> &[CopPoint] {
        &self.cops
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a constructed session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Compute the renderable output for frame `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is past the last frame.
    pub fn frame_output(&self, index: usize) -> Result<FrameOutput> {
        let frame = self
            .frames
            .get(index)
            .ok_or_else(|| SwayError::frame_out_of_range(index, self.frames.len()))?;

        let field = synthesize_field(frame, &self.geometry, &self.config)?;
        let trajectory = valid_prefix(&self.cops, index);
        let ellipse = confidence_ellipse(&trajectory, &self.config);

        debug!(
            index,
            samples = field.len(),
            valid_points = trajectory.len(),
            ellipse_area = ellipse.area(),
            "frame computed"
        );

        Ok(FrameOutput {
            index,
            display_number: index + 1,
            field,
            cop: self.cops[index],
            path_length: path_length(&trajectory),
            trajectory,
            ellipse,
        })
    }

    /// Compute outputs for every frame in order.
    ///
    /// # Errors
    ///
    /// Propagates [`Session::frame_output`] errors.
    pub fn all_outputs(&self) -> Result<Vec<FrameOutput>> {
        (0..self.len()).map(|i| self.frame_output(i)).collect()
    }

    /// Run interactive playback on the current thread.
    ///
    /// Presents frame 0, then advances one frame per cadence while playing,
    /// wrapping past the end. Commands are processed one at a time between
    /// ticks. Returns the final playback state when a
    /// [`PlaybackCommand::Quit`] arrives.
    ///
    /// Once every command sender is dropped, playback continues on its own
    /// if it was playing; the loop returns only when it is paused with no
    /// sender left to resume it.
    ///
    /// # Errors
    ///
    /// Propagates [`Session::frame_output`] errors.
    pub fn play<S: FrameSink>(
        &self,
        commands: &Receiver<PlaybackCommand>,
        sink: &mut S,
    ) -> Result<PlaybackState> {
        let mut scheduler = FrameScheduler::new(self.len(), self.config.cadence(), Instant::now());
        sink.present(&self.frame_output(scheduler.index())?);
        let mut connected = true;

        loop {
            let received = match (connected, scheduler.time_until_due(Instant::now())) {
                (true, Some(wait)) => match commands.recv_timeout(wait) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        debug!("command channel closed while playing");
                        connected = false;
                        None
                    }
                },
                (true, None) => match commands.recv() {
                    Ok(command) => Some(command),
                    Err(_) => {
                        debug!("command channel closed while paused");
                        connected = false;
                        None
                    }
                },
                (false, Some(wait)) => {
                    thread::sleep(wait);
                    None
                }
                // Paused with nobody left to resume
                (false, None) => break,
            };

            let now = Instant::now();
            let present = match received {
                Some(PlaybackCommand::Quit) => break,
                Some(command) => scheduler.handle(command, now),
                None => scheduler.poll(now),
            };

            if let Some(index) = present {
                sink.present(&self.frame_output(index)?);
            }
        }

        info!(index = scheduler.index(), "playback stopped");
        Ok(scheduler.state())
    }
}
