use bytes::Bytes;
use tracing::debug;

use crate::{BitReader, BreakDuration, Result, Scte35Error, SpliceTime, ascii_string};

/// `splice_null()` command type code
pub const SPLICE_NULL: u8 = 0x00;
/// `splice_schedule()` command type code
pub const SPLICE_SCHEDULE: u8 = 0x04;
/// `splice_insert()` command type code
pub const SPLICE_INSERT: u8 = 0x05;
/// `time_signal()` command type code
pub const TIME_SIGNAL: u8 = 0x06;
/// `bandwidth_reservation()` command type code
pub const BANDWIDTH_RESERVATION: u8 = 0x07;
/// `private_command()` command type code
pub const PRIVATE_COMMAND: u8 = 0xFF;

/// SCTE-35 splice command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SpliceCommandType {
    SpliceNull,
    SpliceSchedule,
    SpliceInsert,
    TimeSignal,
    BandwidthReservation,
    PrivateCommand,
    Unknown(u8),
}

impl From<u8> for SpliceCommandType {
    fn from(value: u8) -> Self {
        match value {
            SPLICE_NULL => SpliceCommandType::SpliceNull,
            SPLICE_SCHEDULE => SpliceCommandType::SpliceSchedule,
            SPLICE_INSERT => SpliceCommandType::SpliceInsert,
            TIME_SIGNAL => SpliceCommandType::TimeSignal,
            BANDWIDTH_RESERVATION => SpliceCommandType::BandwidthReservation,
            PRIVATE_COMMAND => SpliceCommandType::PrivateCommand,
            v => SpliceCommandType::Unknown(v),
        }
    }
}

impl From<SpliceCommandType> for u8 {
    fn from(value: SpliceCommandType) -> Self {
        match value {
            SpliceCommandType::SpliceNull => SPLICE_NULL,
            SpliceCommandType::SpliceSchedule => SPLICE_SCHEDULE,
            SpliceCommandType::SpliceInsert => SPLICE_INSERT,
            SpliceCommandType::TimeSignal => TIME_SIGNAL,
            SpliceCommandType::BandwidthReservation => BANDWIDTH_RESERVATION,
            SpliceCommandType::PrivateCommand => PRIVATE_COMMAND,
            SpliceCommandType::Unknown(v) => v,
        }
    }
}

/// Parsed splice command, one variant per command type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SpliceCommand {
    SpliceNull,
    SpliceSchedule(SpliceSchedule),
    SpliceInsert(SpliceInsert),
    TimeSignal(TimeSignal),
    BandwidthReservation,
    PrivateCommand(PrivateCommand),
    /// Unrecognised command type; its declared bytes were skipped.
    Unknown(u8),
}

impl SpliceCommand {
    /// Parse the command body that follows `splice_command_type`.
    ///
    /// Known commands are self-delimiting. `command_length` is only used to
    /// size the private payload and to skip unrecognised commands.
    pub fn parse(
        command_type: SpliceCommandType,
        command_length: u16,
        reader: &mut BitReader<'_>,
    ) -> Result<Self> {
        let command = match command_type {
            SpliceCommandType::SpliceNull => SpliceCommand::SpliceNull,
            SpliceCommandType::SpliceSchedule => {
                SpliceCommand::SpliceSchedule(SpliceSchedule::parse(reader)?)
            }
            SpliceCommandType::SpliceInsert => {
                SpliceCommand::SpliceInsert(SpliceInsert::parse(reader)?)
            }
            SpliceCommandType::TimeSignal => SpliceCommand::TimeSignal(TimeSignal {
                splice_time: SpliceTime::parse(reader)?,
            }),
            SpliceCommandType::BandwidthReservation => SpliceCommand::BandwidthReservation,
            SpliceCommandType::PrivateCommand => {
                SpliceCommand::PrivateCommand(PrivateCommand::parse(command_length, reader)?)
            }
            SpliceCommandType::Unknown(code) => {
                debug!(
                    command_type = code,
                    command_length, "Skipping unknown splice command"
                );
                reader.skip(command_length as usize * 8)?;
                SpliceCommand::Unknown(code)
            }
        };
        Ok(command)
    }

    /// The command type this variant was decoded from.
    pub fn command_type(&self) -> SpliceCommandType {
        match self {
            SpliceCommand::SpliceNull => SpliceCommandType::SpliceNull,
            SpliceCommand::SpliceSchedule(_) => SpliceCommandType::SpliceSchedule,
            SpliceCommand::SpliceInsert(_) => SpliceCommandType::SpliceInsert,
            SpliceCommand::TimeSignal(_) => SpliceCommandType::TimeSignal,
            SpliceCommand::BandwidthReservation => SpliceCommandType::BandwidthReservation,
            SpliceCommand::PrivateCommand(_) => SpliceCommandType::PrivateCommand,
            SpliceCommand::Unknown(code) => SpliceCommandType::Unknown(*code),
        }
    }
}

/// Trailer shared by schedule events and inserts.
fn parse_avail_fields(reader: &mut BitReader<'_>) -> Result<(u16, u8, u8)> {
    let unique_program_id = reader.read_u16(16)?;
    let avail_num = reader.read_u8(8)?;
    let avails_expected = reader.read_u8(8)?;
    Ok((unique_program_id, avail_num, avails_expected))
}

/// SCTE-35 splice schedule command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpliceSchedule {
    pub events: Vec<SpliceScheduleEvent>,
}

impl SpliceSchedule {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let splice_count = reader.read_u8(8)?;
        let events = (0..splice_count)
            .map(|_| SpliceScheduleEvent::parse(reader))
            .collect::<Result<Vec<_>>>()?;
        Ok(SpliceSchedule { events })
    }

    pub fn splice_count(&self) -> usize {
        self.events.len()
    }
}

/// One event of a splice schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpliceScheduleEvent {
    pub splice_event_id: u32,
    /// `None` when `splice_event_cancel_indicator` is set.
    pub details: Option<ScheduleEventDetails>,
}

/// Fields of a schedule event that has not been cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScheduleEventDetails {
    pub out_of_network_indicator: bool,
    pub splice: ScheduleSplice,
    pub break_duration: Option<BreakDuration>,
    pub unique_program_id: u16,
    pub avail_num: u8,
    pub avails_expected: u8,
}

/// Program-level or per-component wall-clock splice times.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ScheduleSplice {
    Program { utc_splice_time: u32 },
    Components(Vec<ScheduleComponent>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScheduleComponent {
    pub component_tag: u8,
    pub utc_splice_time: u32,
}

impl SpliceScheduleEvent {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let splice_event_id = reader.read_u32(32)?;
        let splice_event_cancel_indicator = reader.read_bool()?;
        reader.skip(7)?;

        if splice_event_cancel_indicator {
            return Ok(SpliceScheduleEvent {
                splice_event_id,
                details: None,
            });
        }

        let out_of_network_indicator = reader.read_bool()?;
        let program_splice_flag = reader.read_bool()?;
        let duration_flag = reader.read_bool()?;
        reader.skip(5)?;

        let splice = if program_splice_flag {
            ScheduleSplice::Program {
                utc_splice_time: reader.read_u32(32)?,
            }
        } else {
            let component_count = reader.read_u8(8)?;
            let mut components = Vec::with_capacity(component_count as usize);
            for _ in 0..component_count {
                components.push(ScheduleComponent {
                    component_tag: reader.read_u8(8)?,
                    utc_splice_time: reader.read_u32(32)?,
                });
            }
            ScheduleSplice::Components(components)
        };

        let break_duration = if duration_flag {
            Some(BreakDuration::parse(reader)?)
        } else {
            None
        };

        let (unique_program_id, avail_num, avails_expected) = parse_avail_fields(reader)?;

        Ok(SpliceScheduleEvent {
            splice_event_id,
            details: Some(ScheduleEventDetails {
                out_of_network_indicator,
                splice,
                break_duration,
                unique_program_id,
                avail_num,
                avails_expected,
            }),
        })
    }

    pub fn splice_event_cancel_indicator(&self) -> bool {
        self.details.is_none()
    }
}

impl ScheduleEventDetails {
    pub fn program_splice_flag(&self) -> bool {
        matches!(self.splice, ScheduleSplice::Program { .. })
    }

    pub fn duration_flag(&self) -> bool {
        self.break_duration.is_some()
    }
}

/// SCTE-35 splice insert command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpliceInsert {
    pub splice_event_id: u32,
    /// `None` when `splice_event_cancel_indicator` is set.
    pub details: Option<SpliceInsertDetails>,
}

/// Fields of a splice insert that has not been cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpliceInsertDetails {
    pub out_of_network_indicator: bool,
    pub splice_immediate_flag: bool,
    pub splice: InsertSplice,
    pub break_duration: Option<BreakDuration>,
    pub unique_program_id: u16,
    pub avail_num: u8,
    pub avails_expected: u8,
}

/// Program-level or per-component splice points of an insert.
///
/// Splice times are absent whenever `splice_immediate_flag` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum InsertSplice {
    Program { splice_time: Option<SpliceTime> },
    Components(Vec<InsertComponent>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InsertComponent {
    pub component_tag: u8,
    pub splice_time: Option<SpliceTime>,
}

impl SpliceInsert {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let splice_event_id = reader.read_u32(32)?;
        let splice_event_cancel_indicator = reader.read_bool()?;
        reader.skip(7)?;

        if splice_event_cancel_indicator {
            return Ok(SpliceInsert {
                splice_event_id,
                details: None,
            });
        }

        let out_of_network_indicator = reader.read_bool()?;
        let program_splice_flag = reader.read_bool()?;
        let duration_flag = reader.read_bool()?;
        let splice_immediate_flag = reader.read_bool()?;
        reader.skip(4)?;

        let splice = if program_splice_flag {
            let splice_time = if splice_immediate_flag {
                None
            } else {
                Some(SpliceTime::parse(reader)?)
            };
            InsertSplice::Program { splice_time }
        } else {
            let component_count = reader.read_u8(8)?;
            let mut components = Vec::with_capacity(component_count as usize);
            for _ in 0..component_count {
                let component_tag = reader.read_u8(8)?;
                let splice_time = if splice_immediate_flag {
                    None
                } else {
                    Some(SpliceTime::parse(reader)?)
                };
                components.push(InsertComponent {
                    component_tag,
                    splice_time,
                });
            }
            InsertSplice::Components(components)
        };

        let break_duration = if duration_flag {
            Some(BreakDuration::parse(reader)?)
        } else {
            None
        };

        let (unique_program_id, avail_num, avails_expected) = parse_avail_fields(reader)?;

        Ok(SpliceInsert {
            splice_event_id,
            details: Some(SpliceInsertDetails {
                out_of_network_indicator,
                splice_immediate_flag,
                splice,
                break_duration,
                unique_program_id,
                avail_num,
                avails_expected,
            }),
        })
    }

    pub fn splice_event_cancel_indicator(&self) -> bool {
        self.details.is_none()
    }
}

impl SpliceInsertDetails {
    pub fn program_splice_flag(&self) -> bool {
        matches!(self.splice, InsertSplice::Program { .. })
    }

    pub fn duration_flag(&self) -> bool {
        self.break_duration.is_some()
    }
}

/// SCTE-35 time signal command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeSignal {
    pub splice_time: SpliceTime,
}

/// SCTE-35 private command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PrivateCommand {
    pub identifier: [u8; 4],
    pub private_data: Bytes,
}

impl PrivateCommand {
    /// Parse `identifier` plus `command_length - 4` bytes of private data.
    pub fn parse(command_length: u16, reader: &mut BitReader<'_>) -> Result<Self> {
        let data_length = command_length.checked_sub(4).ok_or(
            Scte35Error::InvalidCommandLength {
                command_type: PRIVATE_COMMAND,
                length: command_length,
            },
        )?;
        let identifier = reader.read_array::<4>()?;
        let private_data = reader.read_bytes(data_length as usize)?;
        Ok(PrivateCommand {
            identifier,
            private_data,
        })
    }

    pub fn identifier_str(&self) -> String {
        ascii_string(&self.identifier)
    }
}
