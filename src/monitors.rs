//! Read-only per-step observers: a binary frame dump and a terminal debug
//! printer, grounded on the reference implementation's `io/output.h` and
//! `io/monitor.h`. Monitors only ever read a [`System`]; per-step write
//! failures are logged and do not abort the run (spec.md §7 "Policy").

use std::io::Write;

use tracing::warn;

use crate::container::Container;
use crate::storage::Storage;
use crate::error::SystemError;
use crate::force::Charge;
use crate::particle::ParticleState;
use crate::system::System;

const MAGIC: &[u8; 4] = b"PART";
const VERSION: u32 = 1;
const FORMAT_FLAGS: u32 = 0;

/// Writes one frame of the fixed binary dump format (spec.md §6):
/// a 28-byte header followed by one 21-byte record per particle.
#[derive(Copy, Clone, Debug, Default)]
pub struct BinaryOutput;

impl BinaryOutput {
    /// Writes every particle in `state_filter`, in storage order. Record
    /// layout: three little-endian `f32` positions, `u32` type, `u32` id,
    /// `u8` state.
    pub fn write_frame<U, C, W>(
        &self,
        writer: &mut W,
        system: &System<U, C>,
        state_filter: ParticleState,
    ) -> Result<(), SystemError>
    where
        U: Copy + Charge,
        C: Container<U>,
        W: Write,
    {
        let storage = system.container().storage();
        let n = storage.len();
        let indices: Vec<usize> = (0..n).filter(|&i| storage.view(i).state.intersects(state_filter)).collect();

        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&system.step().to_le_bytes())?;
        writer.write_all(&(indices.len() as u64).to_le_bytes())?;
        writer.write_all(&FORMAT_FLAGS.to_le_bytes())?;

        for i in indices {
            let view = storage.view(i);
            writer.write_all(&(view.position.x as f32).to_le_bytes())?;
            writer.write_all(&(view.position.y as f32).to_le_bytes())?;
            writer.write_all(&(view.position.z as f32).to_le_bytes())?;
            writer.write_all(&(view.ty as u32).to_le_bytes())?;
            writer.write_all(&view.id.to_le_bytes())?;
            writer.write_all(&[view.state.bits()])?;
        }
        Ok(())
    }

    /// Calls [`Self::write_frame`] and logs (never propagates) any I/O
    /// failure, per spec.md §7's "per-step failures in monitors are logged
    /// and do not abort the run".
    pub fn write_frame_lossy<U, C, W>(&self, writer: &mut W, system: &System<U, C>, state_filter: ParticleState)
    where
        U: Copy + Charge,
        C: Container<U>,
        W: Write,
    {
        if let Err(err) = self.write_frame(writer, system, state_filter) {
            warn!(error = %err, step = system.step(), "monitor frame write failed");
        }
    }
}

/// A human-readable progress line, for interactive runs and debugging.
/// Grounded on the reference implementation's terminal progress monitor.
#[derive(Copy, Clone, Debug, Default)]
pub struct TerminalOutput;

impl TerminalOutput {
    pub fn print<U, C>(&self, system: &System<U, C>)
    where
        U: Copy + Charge,
        C: Container<U>,
    {
        println!(
            "step {:>8}  t = {:>12.6}  alive = {}",
            system.step(),
            system.time(),
            system.size(ParticleState::ALIVE)
        );
    }
}
