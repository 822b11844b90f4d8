//! Incremental rendering: one diagram per host frame so large batches never block
//! input handling.

use crate::canvas::SvgCanvas;
use crate::error::{GndError, Result};
use crate::gene::Diagram;
use crate::highlight::HighlightIndex;
use std::collections::VecDeque;
use tracing::debug;

/// Outcome of one [`RenderScheduler::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Drew the diagram at this canvas row.
    Drew(usize),
    /// The batch is finished; carries the batch length and the new running total.
    BatchComplete { batch_len: usize, total_drawn: usize },
    Idle,
}

/// Host hook that runs between two draw steps, e.g. waiting for the next animation
/// frame or pumping an event loop.
pub trait FramePump {
    fn next_frame(&mut self);
}

/// Pump for hosts that have no frame loop; steps run back to back.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediatePump;

impl FramePump for ImmediatePump {
    fn next_frame(&mut self) {}
}

#[derive(Debug, Default)]
pub struct RenderScheduler {
    pending: VecDeque<Diagram>,
    batch_len: usize,
    drawn_in_batch: usize,
    total_drawn: usize,
    in_progress: bool,
}

impl RenderScheduler {
    pub fn total_drawn(&self) -> usize {
        self.total_drawn
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Queues a batch. Fails while a previous batch is still being drawn.
    pub fn begin_batch(&mut self, diagrams: Vec<Diagram>) -> Result<()> {
        if self.in_progress {
            return Err(GndError::BatchInProgress);
        }
        self.batch_len = diagrams.len();
        self.drawn_in_batch = 0;
        self.pending = diagrams.into();
        self.in_progress = true;
        debug!(batch_len = self.batch_len, "render batch queued");
        Ok(())
    }

    /// Draws the next diagram, or closes the batch once every diagram was drawn.
    pub fn step(&mut self, canvas: &mut SvgCanvas, highlight: &mut HighlightIndex) -> StepResult {
        if !self.in_progress {
            return StepResult::Idle;
        }
        match self.pending.pop_front() {
            Some(diagram) => {
                let row = self.total_drawn + self.drawn_in_batch;
                canvas.draw_diagram(row, &diagram, highlight);
                self.drawn_in_batch += 1;
                StepResult::Drew(row)
            }
            None => {
                self.total_drawn += self.batch_len;
                self.in_progress = false;
                debug!(
                    batch_len = self.batch_len,
                    total_drawn = self.total_drawn,
                    "render batch complete"
                );
                StepResult::BatchComplete {
                    batch_len: self.batch_len,
                    total_drawn: self.total_drawn,
                }
            }
        }
    }

    /// Steps until the batch completes, yielding to `pump` between draws.
    pub fn run_batch(
        &mut self,
        canvas: &mut SvgCanvas,
        highlight: &mut HighlightIndex,
        pump: &mut dyn FramePump,
    ) -> StepResult {
        loop {
            match self.step(canvas, highlight) {
                StepResult::Drew(_) => pump.next_frame(),
                done => return done,
            }
        }
    }
}
