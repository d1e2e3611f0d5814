//! SCTE-35 `splice_info_section` decoder
//!
//! This crate turns an already-isolated SCTE-35 cue message (the payload of
//! a PID carrying table id 0xFC) into typed splice commands and splice
//! descriptors. Every optional field is modelled as an `Option` or enum arm
//! selected by the flag bit that governs it on the wire.
//!
//! Transport-stream demuxing, re-encoding and CRC verification are left to
//! the caller; the CRC fields are surfaced exactly as read.

pub mod bit_reader;
pub mod command;
pub mod descriptor;
pub mod error;
pub mod section;
pub mod time;

pub use bit_reader::BitReader;
pub use command::{
    BANDWIDTH_RESERVATION, InsertComponent, InsertSplice, PRIVATE_COMMAND, PrivateCommand,
    SPLICE_INSERT, SPLICE_NULL, SPLICE_SCHEDULE, ScheduleComponent, ScheduleEventDetails,
    ScheduleSplice, SpliceCommand, SpliceCommandType, SpliceInsert, SpliceInsertDetails,
    SpliceSchedule, SpliceScheduleEvent, TIME_SIGNAL, TimeSignal,
};
pub use descriptor::{
    AudioComponent, AudioDescriptor, AvailDescriptor, DeliveryRestrictions, DescriptorBody,
    DtmfDescriptor, SUB_SEGMENT_TYPE_IDS, SegmentationComponent, SegmentationDescriptor,
    SegmentationDetails, SegmentationScope, SegmentationUpid, SpliceDescriptor, SubSegment,
    TAG_AUDIO, TAG_AVAIL, TAG_DTMF, TAG_SEGMENTATION, TAG_TIME, TimeDescriptor,
};
pub use error::{Result, Scte35Error};
pub use section::{CUEI_IDENTIFIER, SCTE35_TABLE_ID, SectionTrailer, SpliceInfoSection};
pub use time::{BreakDuration, PTS_CLOCK_HZ, PTS_MASK, SpliceTime};

/// Decode a complete `splice_info_section`.
///
/// Shorthand for [`SpliceInfoSection::parse`].
pub fn decode(data: &[u8]) -> Result<SpliceInfoSection> {
    SpliceInfoSection::parse(data)
}

/// Map each byte to the char with the same code point, so no byte is lost.
pub(crate) fn ascii_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
