//! Owned copies of the records libpulse hands to introspection callbacks.
//!
//! libpulse only lends these records for the duration of a callback, so
//! everything is copied out before the callback returns.
use libc;
use libpulse_sys::*;
use std::ffi::CStr;

use crate::proplist::{self, Properties};
use crate::volume::ChannelVolumes;

/// libpulse's marker for "no index".
pub const PA_INVALID_INDEX: u32 = ::std::u32::MAX;

/// A record type delivered by a libpulse info callback.
pub trait Record: Sized + 'static {
    /// The native struct libpulse passes to the callback.
    type Raw;

    /// Copies the native record. Must not keep pointers into `raw`.
    fn from_raw(raw: &Self::Raw) -> Self;
}

pub(crate) unsafe fn optional_string(ptr: *const libc::c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

fn optional_index(index: u32) -> Option<u32> {
    if index == PA_INVALID_INDEX {
        None
    } else {
        Some(index)
    }
}

/// Information about the sound server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    pub user_name: Option<String>,
    pub host_name: Option<String>,
    pub server_version: Option<String>,
    /// Package name, usually "pulseaudio".
    pub server_name: Option<String>,
    pub default_sink_name: Option<String>,
    pub default_source_name: Option<String>,
    pub cookie: u32,
    pub sample_rate: u32,
    pub channels: u8,
}

impl Record for ServerInfo {
    type Raw = pa_server_info;

    fn from_raw(raw: &pa_server_info) -> ServerInfo {
        unsafe {
            ServerInfo {
                user_name: optional_string(raw.user_name),
                host_name: optional_string(raw.host_name),
                server_version: optional_string(raw.server_version),
                server_name: optional_string(raw.server_name),
                default_sink_name: optional_string(raw.default_sink_name),
                default_source_name: optional_string(raw.default_source_name),
                cookie: raw.cookie,
                sample_rate: raw.sample_spec.rate,
                channels: raw.sample_spec.channels,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SinkInfo {
    pub index: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_module: Option<u32>,
    pub volume: ChannelVolumes,
    pub mute: bool,
    pub monitor_source: Option<u32>,
    pub monitor_source_name: Option<String>,
    pub driver: Option<String>,
    pub base_volume: u32,
    pub card: Option<u32>,
    pub properties: Properties,
}

impl Record for SinkInfo {
    type Raw = pa_sink_info;

    fn from_raw(raw: &pa_sink_info) -> SinkInfo {
        unsafe {
            SinkInfo {
                index: raw.index,
                name: optional_string(raw.name),
                description: optional_string(raw.description),
                owner_module: optional_index(raw.owner_module),
                volume: ChannelVolumes::from_raw(&raw.volume),
                mute: raw.mute != 0,
                monitor_source: optional_index(raw.monitor_source),
                monitor_source_name: optional_string(raw.monitor_source_name),
                driver: optional_string(raw.driver),
                base_volume: raw.base_volume,
                card: optional_index(raw.card),
                properties: proplist::snapshot(raw.proplist),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub index: u32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_module: Option<u32>,
    pub volume: ChannelVolumes,
    pub mute: bool,
    /// Set when this source monitors a sink.
    pub monitor_of_sink: Option<u32>,
    pub monitor_of_sink_name: Option<String>,
    pub driver: Option<String>,
    pub base_volume: u32,
    pub card: Option<u32>,
    pub properties: Properties,
}

impl Record for SourceInfo {
    type Raw = pa_source_info;

    fn from_raw(raw: &pa_source_info) -> SourceInfo {
        unsafe {
            SourceInfo {
                index: raw.index,
                name: optional_string(raw.name),
                description: optional_string(raw.description),
                owner_module: optional_index(raw.owner_module),
                volume: ChannelVolumes::from_raw(&raw.volume),
                mute: raw.mute != 0,
                monitor_of_sink: optional_index(raw.monitor_of_sink),
                monitor_of_sink_name: optional_string(raw.monitor_of_sink_name),
                driver: optional_string(raw.driver),
                base_volume: raw.base_volume,
                card: optional_index(raw.card),
                properties: proplist::snapshot(raw.proplist),
            }
        }
    }
}

/// A stream playing into a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkInputInfo {
    pub index: u32,
    pub name: Option<String>,
    pub owner_module: Option<u32>,
    pub client: Option<u32>,
    pub sink: u32,
    pub volume: ChannelVolumes,
    pub mute: bool,
    pub corked: bool,
    pub has_volume: bool,
    pub volume_writable: bool,
    pub driver: Option<String>,
    pub properties: Properties,
}

impl Record for SinkInputInfo {
    type Raw = pa_sink_input_info;

    fn from_raw(raw: &pa_sink_input_info) -> SinkInputInfo {
        unsafe {
            SinkInputInfo {
                index: raw.index,
                name: optional_string(raw.name),
                owner_module: optional_index(raw.owner_module),
                client: optional_index(raw.client),
                sink: raw.sink,
                volume: ChannelVolumes::from_raw(&raw.volume),
                mute: raw.mute != 0,
                corked: raw.corked != 0,
                has_volume: raw.has_volume != 0,
                volume_writable: raw.volume_writable != 0,
                driver: optional_string(raw.driver),
                properties: proplist::snapshot(raw.proplist),
            }
        }
    }
}

/// A stream recording from a source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutputInfo {
    pub index: u32,
    pub name: Option<String>,
    pub owner_module: Option<u32>,
    pub client: Option<u32>,
    pub source: u32,
    pub volume: ChannelVolumes,
    pub mute: bool,
    pub corked: bool,
    pub has_volume: bool,
    pub volume_writable: bool,
    pub driver: Option<String>,
    pub properties: Properties,
}

impl Record for SourceOutputInfo {
    type Raw = pa_source_output_info;

    fn from_raw(raw: &pa_source_output_info) -> SourceOutputInfo {
        unsafe {
            SourceOutputInfo {
                index: raw.index,
                name: optional_string(raw.name),
                owner_module: optional_index(raw.owner_module),
                client: optional_index(raw.client),
                source: raw.source,
                volume: ChannelVolumes::from_raw(&raw.volume),
                mute: raw.mute != 0,
                corked: raw.corked != 0,
                has_volume: raw.has_volume != 0,
                volume_writable: raw.volume_writable != 0,
                driver: optional_string(raw.driver),
                properties: proplist::snapshot(raw.proplist),
            }
        }
    }
}
