use bytes::Bytes;
use tracing::debug;

use crate::{BitReader, BreakDuration, Result, Scte35Error, ascii_string};

/// `avail_descriptor()` tag
pub const TAG_AVAIL: u8 = 0x00;
/// `DTMF_descriptor()` tag
pub const TAG_DTMF: u8 = 0x01;
/// `segmentation_descriptor()` tag
pub const TAG_SEGMENTATION: u8 = 0x02;
/// `time_descriptor()` tag
pub const TAG_TIME: u8 = 0x03;
/// `audio_descriptor()` tag
pub const TAG_AUDIO: u8 = 0x04;

/// Segmentation type ids that carry `sub_segment_num` / `sub_segments_expected`.
pub const SUB_SEGMENT_TYPE_IDS: [u8; 4] = [0x34, 0x36, 0x38, 0x3A];

/// Size of the `identifier` field counted by `descriptor_length`.
const IDENTIFIER_LEN: u8 = 4;

/// A splice descriptor: common header plus a tag-specific body.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpliceDescriptor {
    pub tag: u8,
    /// Bytes following the tag/length pair, identifier included.
    pub length: u8,
    /// Usually `CUEI`.
    pub identifier: [u8; 4],
    pub body: DescriptorBody,
}

/// Tag-specific descriptor payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DescriptorBody {
    Avail(AvailDescriptor),
    Dtmf(DtmfDescriptor),
    Segmentation(SegmentationDescriptor),
    Time(TimeDescriptor),
    Audio(AudioDescriptor),
    /// Unrecognised tag; the payload was skipped using the declared length.
    Unknown,
}

impl SpliceDescriptor {
    /// Parse one descriptor, header included.
    ///
    /// On success the reader is left exactly `2 + length` bytes past where it
    /// started. A known body that reads past its declared length is an error.
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let tag = reader.read_u8(8)?;
        let length = reader.read_u8(8)?;
        if length < IDENTIFIER_LEN {
            return Err(Scte35Error::InvalidDescriptorLength { tag, length });
        }
        let identifier = reader.read_array::<4>()?;

        let payload_bits = (length - IDENTIFIER_LEN) as usize * 8;
        let start = reader.position();

        let body = match tag {
            TAG_AVAIL => DescriptorBody::Avail(AvailDescriptor::parse(reader)?),
            TAG_DTMF => DescriptorBody::Dtmf(DtmfDescriptor::parse(reader)?),
            TAG_SEGMENTATION => {
                DescriptorBody::Segmentation(SegmentationDescriptor::parse(reader)?)
            }
            TAG_TIME => DescriptorBody::Time(TimeDescriptor::parse(reader)?),
            TAG_AUDIO => DescriptorBody::Audio(AudioDescriptor::parse(reader)?),
            _ => {
                debug!(tag, length, "Skipping unknown splice descriptor");
                reader.skip(payload_bits)?;
                DescriptorBody::Unknown
            }
        };

        let consumed = reader.position() - start;
        if consumed > payload_bits {
            return Err(Scte35Error::DescriptorBodyOverrun {
                tag,
                length,
                consumed_bits: consumed,
            });
        }
        if consumed < payload_bits {
            debug!(
                tag,
                length,
                surplus_bits = payload_bits - consumed,
                "Skipping unparsed descriptor bytes"
            );
            reader.skip(payload_bits - consumed)?;
        }

        Ok(SpliceDescriptor {
            tag,
            length,
            identifier,
            body,
        })
    }

    /// Bytes this descriptor occupies in the loop (`2 + descriptor_length`).
    pub fn encoded_len(&self) -> usize {
        2 + self.length as usize
    }

    pub fn identifier_str(&self) -> String {
        ascii_string(&self.identifier)
    }
}

/// Avail descriptor (tag 0x00)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AvailDescriptor {
    pub provider_avail_id: u32,
}

impl AvailDescriptor {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        Ok(AvailDescriptor {
            provider_avail_id: reader.read_u32(32)?,
        })
    }
}

/// DTMF descriptor (tag 0x01)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DtmfDescriptor {
    /// Tenths of a second before the splice point.
    pub preroll: u8,
    pub dtmf_chars: String,
}

impl DtmfDescriptor {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let preroll = reader.read_u8(8)?;
        let dtmf_count = reader.read_u8(3)?;
        reader.skip(5)?;
        let chars = reader.read_bytes(dtmf_count as usize)?;
        Ok(DtmfDescriptor {
            preroll,
            dtmf_chars: ascii_string(&chars),
        })
    }

    pub fn dtmf_count(&self) -> usize {
        self.dtmf_chars.chars().count()
    }
}

/// Segmentation descriptor (tag 0x02)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SegmentationDescriptor {
    pub segmentation_event_id: u32,
    /// `None` when `segmentation_event_cancel_indicator` is set.
    pub details: Option<SegmentationDetails>,
}

/// Fields of a segmentation event that has not been cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SegmentationDetails {
    /// `None` when `delivery_not_restricted_flag` is set.
    pub delivery_restrictions: Option<DeliveryRestrictions>,
    pub scope: SegmentationScope,
    pub segmentation_duration: Option<BreakDuration>,
    pub upid: SegmentationUpid,
    pub segmentation_type_id: u8,
    pub segment_num: u8,
    pub segments_expected: u8,
    /// Present only for type ids in [`SUB_SEGMENT_TYPE_IDS`].
    pub sub_segment: Option<SubSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeliveryRestrictions {
    pub web_delivery_allowed_flag: bool,
    pub no_regional_blackout_flag: bool,
    pub archive_allowed_flag: bool,
    /// 2-bit device restriction group.
    pub device_restrictions: u8,
}

/// Whole-program segmentation, or per-component PTS offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SegmentationScope {
    Program,
    Components(Vec<SegmentationComponent>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SegmentationComponent {
    pub component_tag: u8,
    /// 33-bit PTS offset.
    pub pts_offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SegmentationUpid {
    pub upid_type: u8,
    pub value: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SubSegment {
    pub sub_segment_num: u8,
    pub sub_segments_expected: u8,
}

impl SegmentationDescriptor {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let segmentation_event_id = reader.read_u32(32)?;
        let segmentation_event_cancel_indicator = reader.read_bool()?;
        reader.skip(7)?;

        if segmentation_event_cancel_indicator {
            return Ok(SegmentationDescriptor {
                segmentation_event_id,
                details: None,
            });
        }

        let program_segmentation_flag = reader.read_bool()?;
        let segmentation_duration_flag = reader.read_bool()?;
        let delivery_not_restricted_flag = reader.read_bool()?;

        let delivery_restrictions = if delivery_not_restricted_flag {
            reader.skip(5)?;
            None
        } else {
            Some(DeliveryRestrictions {
                web_delivery_allowed_flag: reader.read_bool()?,
                no_regional_blackout_flag: reader.read_bool()?,
                archive_allowed_flag: reader.read_bool()?,
                device_restrictions: reader.read_u8(2)?,
            })
        };

        let scope = if program_segmentation_flag {
            SegmentationScope::Program
        } else {
            let component_count = reader.read_u8(8)?;
            let mut components = Vec::with_capacity(component_count as usize);
            for _ in 0..component_count {
                let component_tag = reader.read_u8(8)?;
                reader.skip(7)?;
                let pts_offset = reader.read_unsigned(33)?;
                components.push(SegmentationComponent {
                    component_tag,
                    pts_offset,
                });
            }
            SegmentationScope::Components(components)
        };

        let segmentation_duration = if segmentation_duration_flag {
            Some(BreakDuration::parse(reader)?)
        } else {
            None
        };

        let upid_type = reader.read_u8(8)?;
        let upid_length = reader.read_u8(8)?;
        let upid = SegmentationUpid {
            upid_type,
            value: reader.read_bytes(upid_length as usize)?,
        };

        let segmentation_type_id = reader.read_u8(8)?;
        let segment_num = reader.read_u8(8)?;
        let segments_expected = reader.read_u8(8)?;

        let sub_segment = if SUB_SEGMENT_TYPE_IDS.contains(&segmentation_type_id) {
            Some(SubSegment {
                sub_segment_num: reader.read_u8(8)?,
                sub_segments_expected: reader.read_u8(8)?,
            })
        } else {
            None
        };

        Ok(SegmentationDescriptor {
            segmentation_event_id,
            details: Some(SegmentationDetails {
                delivery_restrictions,
                scope,
                segmentation_duration,
                upid,
                segmentation_type_id,
                segment_num,
                segments_expected,
                sub_segment,
            }),
        })
    }

    pub fn segmentation_event_cancel_indicator(&self) -> bool {
        self.details.is_none()
    }
}

impl SegmentationDetails {
    pub fn program_segmentation_flag(&self) -> bool {
        matches!(self.scope, SegmentationScope::Program)
    }

    pub fn segmentation_duration_flag(&self) -> bool {
        self.segmentation_duration.is_some()
    }

    pub fn delivery_not_restricted_flag(&self) -> bool {
        self.delivery_restrictions.is_none()
    }
}

/// Time descriptor (tag 0x03)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeDescriptor {
    /// 48-bit TAI seconds.
    pub tai_seconds: u64,
    pub tai_ns: u32,
    pub utc_offset: u16,
}

impl TimeDescriptor {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        Ok(TimeDescriptor {
            tai_seconds: reader.read_unsigned(48)?,
            tai_ns: reader.read_u32(32)?,
            utc_offset: reader.read_u16(16)?,
        })
    }
}

/// Audio descriptor (tag 0x04)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AudioDescriptor {
    pub components: Vec<AudioComponent>,
}

/// A single audio component entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AudioComponent {
    pub component_tag: u8,
    /// 3-character ISO 639-2 language code (e.g. "eng")
    pub iso_code: String,
    pub bit_stream_mode: u8,
    pub num_channels: u8,
    pub full_srvc_audio: bool,
}

impl AudioDescriptor {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let audio_count = reader.read_u8(4)?;
        let mut components = Vec::with_capacity(audio_count as usize);
        for _ in 0..audio_count {
            let component_tag = reader.read_u8(8)?;
            let iso_code = reader.read_array::<3>()?;
            components.push(AudioComponent {
                component_tag,
                iso_code: ascii_string(&iso_code),
                bit_stream_mode: reader.read_u8(3)?,
                num_channels: reader.read_u8(4)?,
                full_srvc_audio: reader.read_bool()?,
            });
        }
        Ok(AudioDescriptor { components })
    }

    pub fn audio_count(&self) -> usize {
        self.components.len()
    }
}
