//! Per-channel volumes.
//!
//! `ChannelVolumes` mirrors `pa_cvolume` and implements the same arithmetic
//! in Rust; only software volume multiplication goes through libpulse.
use libpulse_sys::*;
use std::fmt;
use std::mem;

/// Normal volume (100%, 0 dB).
pub const VOLUME_NORM: u32 = 0x10000;
/// Muted (minimal valid) volume (0%, -inf dB).
pub const VOLUME_MUTED: u32 = 0;
/// Maximum valid volume.
pub const VOLUME_MAX: u32 = ::std::u32::MAX / 2;
/// Maximum number of channels libpulse supports.
pub const CHANNELS_MAX: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVolumes {
    values: Vec<u32>,
}

impl ChannelVolumes {
    /// `channels` channels, all at `volume`.
    pub fn new(channels: u8, volume: u32) -> ChannelVolumes {
        ChannelVolumes { values: vec![volume; channels as usize] }
    }

    pub fn from_values(values: &[u32]) -> ChannelVolumes {
        ChannelVolumes { values: values.to_vec() }
    }

    pub fn from_raw(raw: &pa_cvolume) -> ChannelVolumes {
        let channels = (raw.channels as usize).min(CHANNELS_MAX);
        ChannelVolumes { values: raw.values[..channels].to_vec() }
    }

    pub fn to_raw(&self) -> pa_cvolume {
        let mut raw: pa_cvolume = unsafe { mem::zeroed() };
        let channels = self.values.len().min(CHANNELS_MAX);
        raw.channels = channels as u8;
        raw.values[..channels].copy_from_slice(&self.values[..channels]);
        raw
    }

    pub fn channels(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn get(&self, channel: usize) -> Option<u32> {
        self.values.get(channel).cloned()
    }

    /// Sets one channel. Returns false if the channel does not exist.
    pub fn set(&mut self, channel: usize, volume: u32) -> bool {
        match self.values.get_mut(channel) {
            Some(v) => {
                *v = volume;
                true
            }
            None => false,
        }
    }

    /// Resizes to `channels` channels, all at `volume`.
    pub fn set_all(&mut self, channels: u8, volume: u32) {
        self.values.clear();
        self.values.resize(channels as usize, volume);
    }

    pub fn reset(&mut self) {
        for v in &mut self.values {
            *v = VOLUME_NORM;
        }
    }

    pub fn mute(&mut self) {
        for v in &mut self.values {
            *v = VOLUME_MUTED;
        }
    }

    /// At least one and at most `CHANNELS_MAX` channels, all within range.
    pub fn is_valid(&self) -> bool {
        !self.values.is_empty() && self.values.len() <= CHANNELS_MAX && self.values.iter().all(|&v| v <= VOLUME_MAX)
    }

    pub fn channels_equal_to(&self, volume: u32) -> bool {
        self.values.iter().all(|&v| v == volume)
    }

    pub fn is_muted(&self) -> bool {
        self.channels_equal_to(VOLUME_MUTED)
    }

    pub fn is_norm(&self) -> bool {
        self.channels_equal_to(VOLUME_NORM)
    }

    pub fn avg(&self) -> u32 {
        if self.values.is_empty() {
            return VOLUME_MUTED;
        }
        let sum: u64 = self.values.iter().map(|&v| v as u64).sum();
        (sum / self.values.len() as u64) as u32
    }

    pub fn min(&self) -> u32 {
        self.values.iter().cloned().min().unwrap_or(VOLUME_MUTED)
    }

    pub fn max(&self) -> u32 {
        self.values.iter().cloned().max().unwrap_or(VOLUME_MUTED)
    }

    /// Scales all channels so the loudest one ends up at `max`, keeping the balance.
    pub fn scale(&mut self, max: u32) {
        let current = self.max();
        if current <= VOLUME_MUTED {
            for v in &mut self.values {
                *v = max;
            }
            return;
        }
        for v in &mut self.values {
            *v = ((*v as u64 * max as u64) / current as u64) as u32;
        }
    }

    /// Raises the loudest channel by `inc`, clamped to `VOLUME_MAX`.
    pub fn inc(&mut self, inc: u32) {
        let current = self.max();
        let target = if current >= VOLUME_MAX.saturating_sub(inc) {
            VOLUME_MAX
        } else {
            current + inc
        };
        self.scale(target);
    }

    /// Lowers the loudest channel by `dec`, stopping at `VOLUME_MUTED`.
    pub fn dec(&mut self, dec: u32) {
        let current = self.max();
        let target = if current <= VOLUME_MUTED + dec {
            VOLUME_MUTED
        } else {
            current - dec
        };
        self.scale(target);
    }

    /// Software volume multiplication, channel by channel.
    ///
    /// Channels missing in `other` are left unchanged.
    pub fn multiply(&mut self, other: &ChannelVolumes) {
        for (v, &o) in self.values.iter_mut().zip(other.values.iter()) {
            *v = unsafe { pa_sw_volume_multiply(*v, o) };
        }
    }

    /// Software volume division, channel by channel.
    pub fn divide(&mut self, other: &ChannelVolumes) {
        for (v, &o) in self.values.iter_mut().zip(other.values.iter()) {
            *v = unsafe { pa_sw_volume_divide(*v, o) };
        }
    }
}

/// Converts a volume to a rounded percentage of `VOLUME_NORM`.
pub fn percent(volume: u32) -> u32 {
    ((volume as u64 * 100 + VOLUME_NORM as u64 / 2) / VOLUME_NORM as u64) as u32
}

impl fmt::Display for ChannelVolumes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "(invalid)");
        }
        for (channel, &v) in self.values.iter().enumerate() {
            if channel > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}: {:>3}%", channel, percent(v))?;
        }
        Ok(())
    }
}
