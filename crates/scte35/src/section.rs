use tracing::{debug, trace};

use crate::{
    BitReader, PTS_MASK, Result, Scte35Error, SpliceCommand, SpliceCommandType, SpliceDescriptor,
};

/// SCTE-35 table ID
pub const SCTE35_TABLE_ID: u8 = 0xFC;

/// SCTE-35 registration format identifier
pub const CUEI_IDENTIFIER: [u8; 4] = *b"CUEI";

/// Bytes preceding the part of the section counted by `section_length`.
const SECTION_HEADER_LEN: usize = 3;

/// Section trailer: the branch taken follows `encrypted_packet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SectionTrailer {
    Clear { crc_32: u32 },
    Encrypted { e_crc_32: u32, crc_32: u32 },
}

impl SectionTrailer {
    pub fn crc_32(&self) -> u32 {
        match *self {
            SectionTrailer::Clear { crc_32 } | SectionTrailer::Encrypted { crc_32, .. } => crc_32,
        }
    }

    /// Only present on encrypted sections.
    pub fn e_crc_32(&self) -> Option<u32> {
        match *self {
            SectionTrailer::Clear { .. } => None,
            SectionTrailer::Encrypted { e_crc_32, .. } => Some(e_crc_32),
        }
    }
}

/// Top-level SCTE-35 splice info section.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpliceInfoSection {
    pub table_id: u8,
    pub section_syntax_indicator: bool,
    pub private_indicator: bool,
    /// 2-bit field following `private_indicator`, surfaced uninterpreted.
    pub sap_type: u8,
    pub section_length: u16,
    pub protocol_version: u8,
    pub encrypted_packet: bool,
    pub encryption_algorithm: u8,
    /// 33-bit offset added to every PTS in the section.
    pub pts_adjustment: u64,
    pub cw_index: u8,
    /// 12-bit authorisation tier.
    pub tier: u16,
    pub splice_command_length: u16,
    pub splice_command_type: SpliceCommandType,
    pub splice_command: SpliceCommand,
    pub descriptor_loop_length: u16,
    pub splice_descriptors: Vec<SpliceDescriptor>,
    pub trailer: SectionTrailer,
}

impl SpliceInfoSection {
    /// Decode a complete `splice_info_section`, starting at `table_id`.
    ///
    /// The CRC is surfaced as read, it is not verified.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);

        let table_id = reader.read_u8(8)?;
        let section_syntax_indicator = reader.read_bool()?;
        let private_indicator = reader.read_bool()?;
        let sap_type = reader.read_u8(2)?;
        let section_length = reader.read_u16(12)?;
        let protocol_version = reader.read_u8(8)?;
        let encrypted_packet = reader.read_bool()?;
        let encryption_algorithm = reader.read_u8(6)?;
        let pts_adjustment = reader.read_unsigned(33)?;
        let cw_index = reader.read_u8(8)?;
        let tier = reader.read_u16(12)?;
        let splice_command_length = reader.read_u16(12)?;
        let splice_command_type = SpliceCommandType::from(reader.read_u8(8)?);

        let declared = SECTION_HEADER_LEN + section_length as usize;
        if declared != data.len() {
            debug!(
                section_length,
                buffer_len = data.len(),
                "section_length disagrees with buffer length"
            );
        }

        let splice_command =
            SpliceCommand::parse(splice_command_type, splice_command_length, &mut reader)?;

        let descriptor_loop_length = reader.read_u16(16)?;
        let splice_descriptors = Self::parse_descriptor_loop(descriptor_loop_length, &mut reader)?;

        let trailer = Self::parse_trailer(encrypted_packet, &mut reader)?;

        trace!(
            command_type = u8::from(splice_command_type),
            descriptors = splice_descriptors.len(),
            encrypted_packet,
            "Decoded splice_info_section"
        );

        Ok(SpliceInfoSection {
            table_id,
            section_syntax_indicator,
            private_indicator,
            sap_type,
            section_length,
            protocol_version,
            encrypted_packet,
            encryption_algorithm,
            pts_adjustment,
            cw_index,
            tier,
            splice_command_length,
            splice_command_type,
            splice_command,
            descriptor_loop_length,
            splice_descriptors,
            trailer,
        })
    }

    /// Read descriptors until their cumulative `2 + length` reaches the
    /// declared loop length.
    fn parse_descriptor_loop(
        loop_length: u16,
        reader: &mut BitReader<'_>,
    ) -> Result<Vec<SpliceDescriptor>> {
        let mut descriptors = Vec::new();
        let mut consumed = 0usize;
        while consumed < loop_length as usize {
            let descriptor = SpliceDescriptor::parse(reader)?;
            consumed += descriptor.encoded_len();
            descriptors.push(descriptor);
        }

        if consumed != loop_length as usize {
            return Err(Scte35Error::DescriptorLoopOverrun {
                declared: loop_length,
                consumed,
            });
        }
        Ok(descriptors)
    }

    /// Discard stuffing, then read the fixed-size trailer from the last bits.
    fn parse_trailer(encrypted_packet: bool, reader: &mut BitReader<'_>) -> Result<SectionTrailer> {
        let trailer_bits = if encrypted_packet { 64 } else { 32 };
        let stuffing = reader.remaining_bits().saturating_sub(trailer_bits);
        if stuffing > 0 {
            debug!(stuffing_bits = stuffing, "Discarding bits before trailer");
            reader.skip(stuffing)?;
        }

        if encrypted_packet {
            let e_crc_32 = reader.read_u32(32)?;
            let crc_32 = reader.read_u32(32)?;
            Ok(SectionTrailer::Encrypted { e_crc_32, crc_32 })
        } else {
            Ok(SectionTrailer::Clear {
                crc_32: reader.read_u32(32)?,
            })
        }
    }

    /// Apply `pts_adjustment` to a PTS from this section, wrapping at 33 bits.
    pub fn adjusted_pts(&self, pts: u64) -> u64 {
        (pts + self.pts_adjustment) & PTS_MASK
    }

    pub fn crc_32(&self) -> u32 {
        self.trailer.crc_32()
    }

    pub fn e_crc_32(&self) -> Option<u32> {
        self.trailer.e_crc_32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DescriptorBody, InsertSplice, SegmentationScope, SpliceTime, TAG_AVAIL, TAG_SEGMENTATION,
    };
    use base64::{Engine, engine::general_purpose::STANDARD};
    use proptest::prelude::*;

    fn b64(message: &str) -> Vec<u8> {
        STANDARD.decode(message).unwrap()
    }

    /// Header bytes up to and including `splice_command_type`.
    fn header(encrypted: bool, command_length: u16, command_type: u8) -> Vec<u8> {
        vec![
            0xFC, // table_id
            0x30, 0x00, // syntax=0, private=0, sap=11, section_length (patched by callers)
            0x00, // protocol_version
            if encrypted { 0x80 } else { 0x00 }, // encrypted, algorithm=0, pts_adjustment bit 32
            0x00, 0x00, 0x00, 0x00, // pts_adjustment low 32
            0x00, // cw_index
            0xFF, // tier high 8
            0xF0 | (command_length >> 8) as u8, // tier low 4 | cmd_length high 4
            command_length as u8,
            command_type,
        ]
    }

    fn finish(mut data: Vec<u8>) -> Vec<u8> {
        let section_length = data.len() - 3;
        data[1] |= (section_length >> 8) as u8 & 0x0F;
        data[2] = section_length as u8;
        data
    }

    fn make_splice_null() -> Vec<u8> {
        let mut data = header(false, 0, 0x00);
        data.extend_from_slice(&[0x00, 0x00]); // descriptor_loop_length=0
        data.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]); // CRC
        finish(data)
    }

    #[test]
    fn test_scte35_splice_null() {
        let data = make_splice_null();
        assert_eq!(data.len(), 20);
        let section = SpliceInfoSection::parse(&data).unwrap();
        assert_eq!(section.table_id, SCTE35_TABLE_ID);
        assert_eq!(section.section_length, 17);
        assert_eq!(section.sap_type, 0b11);
        assert_eq!(section.tier, 0xFFF);
        assert_eq!(section.splice_command_length, 0);
        assert_eq!(section.splice_command_type, SpliceCommandType::SpliceNull);
        assert_eq!(section.splice_command, SpliceCommand::SpliceNull);
        assert_eq!(section.descriptor_loop_length, 0);
        assert!(section.splice_descriptors.is_empty());
        assert_eq!(section.trailer, SectionTrailer::Clear { crc_32: 0xDEAD_BEEF });
        assert_eq!(section.e_crc_32(), None);
    }

    #[test]
    fn test_scte35_time_signal_sample() {
        let data = b64("/DAWAAAAAAAAAP/wBQb+Qjo1vQAAuwxz9A==");
        let section = SpliceInfoSection::parse(&data).unwrap();
        assert_eq!(section.section_length, 22);
        assert!(!section.encrypted_packet);
        assert_eq!(section.pts_adjustment, 0);
        assert_eq!(section.splice_command_length, 5);
        assert_eq!(section.splice_command_type, SpliceCommandType::TimeSignal);
        match &section.splice_command {
            SpliceCommand::TimeSignal(ts) => {
                assert_eq!(ts.splice_time.pts_time, Some(1_111_111_101));
            }
            other => panic!("Expected TimeSignal, got {other:?}"),
        }
        assert_eq!(section.crc_32(), 0xBB0C_73F4);

        // same cue as it appears in hex dumps
        let from_hex = hex::decode("fc301600000000000000fff00506fe423a35bd0000bb0c73f4").unwrap();
        assert_eq!(from_hex, data);
        assert_eq!(SpliceInfoSection::parse(&from_hex).unwrap(), section);
    }

    #[test]
    fn test_scte35_splice_insert_sample() {
        let data = b64("/DAvAAAAAAAA///wFAVIAACPf+/+c2nALv4AUsz1AAAAAAAKAAhDVUVJAAABNWLbowo=");
        let section = SpliceInfoSection::parse(&data).unwrap();
        assert_eq!(section.cw_index, 0xFF);
        assert_eq!(section.splice_command_length, 20);

        let SpliceCommand::SpliceInsert(insert) = &section.splice_command else {
            panic!("Expected SpliceInsert, got {:?}", section.splice_command);
        };
        assert_eq!(insert.splice_event_id, 0x4800_008F);
        let details = insert.details.as_ref().unwrap();
        assert!(details.out_of_network_indicator);
        assert!(!details.splice_immediate_flag);
        assert_eq!(
            details.splice,
            InsertSplice::Program {
                splice_time: Some(SpliceTime {
                    pts_time: Some(1_936_310_318)
                })
            }
        );
        let bd = details.break_duration.unwrap();
        assert!(bd.auto_return);
        assert_eq!(bd.duration, 5_426_421);
        assert_eq!(details.unique_program_id, 0);

        assert_eq!(section.descriptor_loop_length, 10);
        assert_eq!(section.splice_descriptors.len(), 1);
        let avail = &section.splice_descriptors[0];
        assert_eq!(avail.tag, TAG_AVAIL);
        assert_eq!(avail.identifier, CUEI_IDENTIFIER);
        assert!(matches!(
            avail.body,
            DescriptorBody::Avail(a) if a.provider_avail_id == 309
        ));
        assert_eq!(section.crc_32(), 0x62DB_A30A);
    }

    #[test]
    fn test_scte35_segmentation_sample() {
        let data = b64(
            "/DBhAAAAAAAA///wBQb+qM1E7QBLAhdDVUVJSAAArX+fCAgAAAAALLLXnTUCAAIXQ1VFSUgAACZ/nwgIAAAAACyy150RAAACF0NVRUlIAAAnf58ICAAAAAAsstezEAAAihiGnw==",
        );
        let section = SpliceInfoSection::parse(&data).unwrap();
        match &section.splice_command {
            SpliceCommand::TimeSignal(ts) => {
                assert_eq!(ts.splice_time.pts_time, Some(2_832_024_813));
            }
            other => panic!("Expected TimeSignal, got {other:?}"),
        }

        assert_eq!(section.descriptor_loop_length, 75);
        let total: usize = section
            .splice_descriptors
            .iter()
            .map(SpliceDescriptor::encoded_len)
            .sum();
        assert_eq!(total, section.descriptor_loop_length as usize);

        let expected = [(0x4800_00AD, 0x35, 2), (0x4800_0026, 0x11, 0), (0x4800_0027, 0x10, 0)];
        assert_eq!(section.splice_descriptors.len(), expected.len());
        for (desc, (event_id, type_id, segment_num)) in
            section.splice_descriptors.iter().zip(expected)
        {
            assert_eq!(desc.tag, TAG_SEGMENTATION);
            let DescriptorBody::Segmentation(seg) = &desc.body else {
                panic!("Expected segmentation descriptor, got {:?}", desc.body);
            };
            assert_eq!(seg.segmentation_event_id, event_id);
            let details = seg.details.as_ref().unwrap();
            assert_eq!(details.scope, SegmentationScope::Program);
            let restrictions = details.delivery_restrictions.unwrap();
            assert!(restrictions.web_delivery_allowed_flag);
            assert!(restrictions.no_regional_blackout_flag);
            assert!(restrictions.archive_allowed_flag);
            assert_eq!(restrictions.device_restrictions, 3);
            assert_eq!(details.upid.upid_type, 0x08);
            assert_eq!(details.upid.value.len(), 8);
            assert_eq!(details.segmentation_type_id, type_id);
            assert_eq!(details.segment_num, segment_num);
            assert!(details.sub_segment.is_none());
        }
        assert_eq!(section.crc_32(), 0x8A18_869F);
    }

    #[test]
    fn test_encrypted_trailer() {
        let mut data = header(true, 0, 0x00);
        data.extend_from_slice(&[0x00, 0x00]); // descriptor_loop_length=0
        data.extend_from_slice(&[0x11, 0x22, 0x33, 0x44]); // E_CRC_32
        data.extend_from_slice(&[0x55, 0x66, 0x77, 0x88]); // CRC_32
        let data = finish(data);

        let section = SpliceInfoSection::parse(&data).unwrap();
        assert!(section.encrypted_packet);
        assert_eq!(
            section.trailer,
            SectionTrailer::Encrypted {
                e_crc_32: 0x1122_3344,
                crc_32: 0x5566_7788,
            }
        );
        assert_eq!(section.e_crc_32(), Some(0x1122_3344));
        assert_eq!(section.crc_32(), 0x5566_7788);
    }

    #[test]
    fn test_stuffing_before_crc_is_discarded() {
        let mut data = header(false, 0, 0x07);
        data.extend_from_slice(&[0x00, 0x00]); // descriptor_loop_length=0
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF]); // stuffing
        data.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]); // CRC
        let data = finish(data);

        let section = SpliceInfoSection::parse(&data).unwrap();
        assert_eq!(section.splice_command, SpliceCommand::BandwidthReservation);
        assert_eq!(section.crc_32(), 0x0102_0304);
    }

    #[test]
    fn test_unknown_command_uses_declared_length() {
        let mut data = header(false, 3, 0x42);
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC]); // opaque command body
        data.extend_from_slice(&[0x00, 0x0A]); // descriptor_loop_length=10
        data.extend_from_slice(&[0x00, 0x08, b'C', b'U', b'E', b'I', 0x00, 0x00, 0x00, 0x05]);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // CRC
        let data = finish(data);

        let section = SpliceInfoSection::parse(&data).unwrap();
        assert_eq!(section.splice_command_type, SpliceCommandType::Unknown(0x42));
        assert_eq!(section.splice_command, SpliceCommand::Unknown(0x42));
        assert_eq!(section.splice_descriptors.len(), 1);
    }

    #[test]
    fn test_descriptor_loop_overrun() {
        let mut data = header(false, 0, 0x00);
        data.extend_from_slice(&[0x00, 0x06]); // declared 6, descriptor needs 10
        data.extend_from_slice(&[0x00, 0x08, b'C', b'U', b'E', b'I', 0x00, 0x00, 0x00, 0x05]);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // CRC
        let data = finish(data);

        assert_eq!(
            SpliceInfoSection::parse(&data),
            Err(Scte35Error::DescriptorLoopOverrun {
                declared: 6,
                consumed: 10,
            })
        );
    }

    #[test]
    fn test_short_descriptor_does_not_absorb_stuffing() {
        let mut data = header(false, 0, 0x00);
        data.extend_from_slice(&[0x00, 0x08]); // descriptor_loop_length=8
        data.extend_from_slice(&[0x00, 0x06, b'C', b'U', b'E', b'I', 0x00, 0x01]); // avail, length=6
        data.extend_from_slice(&[0xAA, 0xBB]); // stuffing
        data.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]); // CRC
        let data = finish(data);

        assert_eq!(
            SpliceInfoSection::parse(&data),
            Err(Scte35Error::DescriptorBodyOverrun {
                tag: TAG_AVAIL,
                length: 6,
                consumed_bits: 32,
            })
        );
    }

    #[test]
    fn test_truncated_schedule_fails() {
        // splice_schedule declaring one event, cut right after the event count
        let mut data = header(false, 20, 0x04);
        data.push(0x01);
        let data = finish(data);
        assert!(matches!(
            SpliceInfoSection::parse(&data),
            Err(Scte35Error::BufferUnderrun { .. })
        ));

        // cut directly after splice_command_type
        let data = finish(header(false, 20, 0x04));
        assert!(matches!(
            SpliceInfoSection::parse(&data),
            Err(Scte35Error::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn test_missing_crc_fails() {
        let mut data = make_splice_null();
        data.truncate(data.len() - 1);
        assert!(matches!(
            SpliceInfoSection::parse(&data),
            Err(Scte35Error::BufferUnderrun {
                requested: 32,
                remaining: 24,
            })
        ));
    }

    #[test]
    fn test_adjusted_pts_wraps() {
        let mut data = make_splice_null();
        // pts_adjustment = 2^33 - 1
        data[4] |= 0x01;
        data[5..9].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        let section = SpliceInfoSection::parse(&data).unwrap();
        assert_eq!(section.pts_adjustment, PTS_MASK);
        assert_eq!(section.adjusted_pts(1), 0);
        assert_eq!(section.adjusted_pts(10), 9);
    }

    const SAMPLES: [&str; 3] = [
        "/DAWAAAAAAAAAP/wBQb+Qjo1vQAAuwxz9A==",
        "/DAvAAAAAAAA///wFAVIAACPf+/+c2nALv4AUsz1AAAAAAAKAAhDVUVJAAABNWLbowo=",
        "/DBIAAAAAAAA///wBQb+ek2ItgAyAhdDVUVJSAAAGH+fCAgAAAAALMvDRBEAAAIXQ1VFSUgAABl/nwgIAAAAACyk26AQAACZcuND",
    ];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any strict prefix of a valid section fails with an underrun
        /// rather than yielding a partially populated section.
        #[test]
        fn prop_truncated_sections_underrun(sample in 0..SAMPLES.len(), cut in any::<prop::sample::Index>()) {
            let data = b64(SAMPLES[sample]);
            let len = cut.index(data.len());
            let result = SpliceInfoSection::parse(&data[..len]);
            let is_underrun = matches!(result, Err(Scte35Error::BufferUnderrun { .. }));
            prop_assert!(is_underrun, "prefix of {} bytes gave {:?}", len, result);
        }

        /// Arbitrary input never panics.
        #[test]
        fn prop_arbitrary_input_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = SpliceInfoSection::parse(&data);
        }
    }
}
