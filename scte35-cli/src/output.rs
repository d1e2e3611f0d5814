use std::fmt::Write;

use scte35::{
    BreakDuration, DescriptorBody, InsertSplice, ScheduleSplice, SegmentationScope,
    SpliceCommand, SpliceDescriptor, SpliceInfoSection, SpliceTime,
};

use crate::{cli::OutputFormat, error::Result};

pub fn format_section(section: &SpliceInfoSection, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Pretty => Ok(format_pretty(section)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(section)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(section)?),
    }
}

fn splice_time(time: &SpliceTime) -> String {
    match (time.pts_time, time.as_seconds()) {
        (Some(pts), Some(seconds)) => format!("pts={pts} ({seconds:.3}s)"),
        _ => "unspecified".to_string(),
    }
}

fn break_duration(duration: &BreakDuration) -> String {
    format!(
        "{} ticks ({:.3}s), auto_return={}",
        duration.duration,
        duration.as_seconds(),
        duration.auto_return
    )
}

// writeln! into a String cannot fail
fn format_pretty(section: &SpliceInfoSection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "splice_info_section:");
    let _ = writeln!(out, "  table_id: 0x{:02X}", section.table_id);
    let _ = writeln!(out, "  section_length: {}", section.section_length);
    let _ = writeln!(out, "  protocol_version: {}", section.protocol_version);
    let _ = writeln!(
        out,
        "  encrypted_packet: {} (algorithm {})",
        section.encrypted_packet, section.encryption_algorithm
    );
    let _ = writeln!(out, "  pts_adjustment: {}", section.pts_adjustment);
    let _ = writeln!(out, "  cw_index: 0x{:02X}", section.cw_index);
    let _ = writeln!(out, "  tier: 0x{:03X}", section.tier);
    let _ = writeln!(
        out,
        "  splice_command: 0x{:02X} ({} bytes)",
        u8::from(section.splice_command_type),
        section.splice_command_length
    );
    format_command(&mut out, &section.splice_command);

    let _ = writeln!(
        out,
        "  descriptors: {} ({} bytes)",
        section.splice_descriptors.len(),
        section.descriptor_loop_length
    );
    for descriptor in &section.splice_descriptors {
        format_descriptor(&mut out, descriptor);
    }

    if let Some(e_crc_32) = section.e_crc_32() {
        let _ = writeln!(out, "  e_crc_32: 0x{e_crc_32:08X}");
    }
    let _ = writeln!(out, "  crc_32: 0x{:08X}", section.crc_32());
    out
}

fn format_command(out: &mut String, command: &SpliceCommand) {
    match command {
        SpliceCommand::SpliceNull => {
            let _ = writeln!(out, "    splice_null");
        }
        SpliceCommand::BandwidthReservation => {
            let _ = writeln!(out, "    bandwidth_reservation");
        }
        SpliceCommand::TimeSignal(signal) => {
            let _ = writeln!(out, "    time_signal: {}", splice_time(&signal.splice_time));
        }
        SpliceCommand::SpliceInsert(insert) => {
            let _ = writeln!(out, "    splice_insert: event_id={}", insert.splice_event_id);
            let Some(details) = &insert.details else {
                let _ = writeln!(out, "      cancelled");
                return;
            };
            let _ = writeln!(
                out,
                "      out_of_network={} immediate={}",
                details.out_of_network_indicator, details.splice_immediate_flag
            );
            match &details.splice {
                InsertSplice::Program { splice_time: Some(time) } => {
                    let _ = writeln!(out, "      program splice: {}", splice_time(time));
                }
                InsertSplice::Program { splice_time: None } => {
                    let _ = writeln!(out, "      program splice: immediate");
                }
                InsertSplice::Components(components) => {
                    for component in components {
                        let time = component
                            .splice_time
                            .as_ref()
                            .map_or_else(|| "immediate".to_string(), splice_time);
                        let _ = writeln!(
                            out,
                            "      component 0x{:02X}: {time}",
                            component.component_tag
                        );
                    }
                }
            }
            if let Some(duration) = &details.break_duration {
                let _ = writeln!(out, "      break_duration: {}", break_duration(duration));
            }
            let _ = writeln!(
                out,
                "      unique_program_id={} avail {}/{}",
                details.unique_program_id, details.avail_num, details.avails_expected
            );
        }
        SpliceCommand::SpliceSchedule(schedule) => {
            let _ = writeln!(out, "    splice_schedule: {} events", schedule.splice_count());
            for event in &schedule.events {
                let _ = writeln!(out, "      event_id={}", event.splice_event_id);
                let Some(details) = &event.details else {
                    let _ = writeln!(out, "        cancelled");
                    continue;
                };
                match &details.splice {
                    ScheduleSplice::Program { utc_splice_time } => {
                        let _ = writeln!(out, "        utc_splice_time: {utc_splice_time}");
                    }
                    ScheduleSplice::Components(components) => {
                        for component in components {
                            let _ = writeln!(
                                out,
                                "        component 0x{:02X}: utc_splice_time={}",
                                component.component_tag, component.utc_splice_time
                            );
                        }
                    }
                }
                if let Some(duration) = &details.break_duration {
                    let _ = writeln!(out, "        break_duration: {}", break_duration(duration));
                }
            }
        }
        SpliceCommand::PrivateCommand(private) => {
            let _ = writeln!(
                out,
                "    private_command: identifier={} data={}",
                private.identifier_str(),
                hex::encode(&private.private_data)
            );
        }
        SpliceCommand::Unknown(code) => {
            let _ = writeln!(out, "    unknown command 0x{code:02X} (skipped)");
        }
    }
}

fn format_descriptor(out: &mut String, descriptor: &SpliceDescriptor) {
    let _ = write!(
        out,
        "    [0x{:02X} {}] ",
        descriptor.tag,
        descriptor.identifier_str()
    );
    match &descriptor.body {
        DescriptorBody::Avail(avail) => {
            let _ = writeln!(out, "avail: provider_avail_id={}", avail.provider_avail_id);
        }
        DescriptorBody::Dtmf(dtmf) => {
            let _ = writeln!(
                out,
                "dtmf: preroll={} chars={:?}",
                dtmf.preroll, dtmf.dtmf_chars
            );
        }
        DescriptorBody::Time(time) => {
            let _ = writeln!(
                out,
                "time: tai={}.{:09} utc_offset={}",
                time.tai_seconds, time.tai_ns, time.utc_offset
            );
        }
        DescriptorBody::Audio(audio) => {
            let _ = writeln!(out, "audio: {} components", audio.audio_count());
            for component in &audio.components {
                let _ = writeln!(
                    out,
                    "      0x{:02X} {} bsmod={} channels={} full_service={}",
                    component.component_tag,
                    component.iso_code,
                    component.bit_stream_mode,
                    component.num_channels,
                    component.full_srvc_audio
                );
            }
        }
        DescriptorBody::Segmentation(segmentation) => {
            let _ = writeln!(
                out,
                "segmentation: event_id={}",
                segmentation.segmentation_event_id
            );
            let Some(details) = &segmentation.details else {
                let _ = writeln!(out, "      cancelled");
                return;
            };
            let _ = writeln!(
                out,
                "      type_id=0x{:02X} segment {}/{}",
                details.segmentation_type_id, details.segment_num, details.segments_expected
            );
            if let Some(sub) = &details.sub_segment {
                let _ = writeln!(
                    out,
                    "      sub_segment {}/{}",
                    sub.sub_segment_num, sub.sub_segments_expected
                );
            }
            let _ = writeln!(
                out,
                "      upid type=0x{:02X} value={}",
                details.upid.upid_type,
                hex::encode(&details.upid.value)
            );
            if let Some(duration) = &details.segmentation_duration {
                let _ = writeln!(out, "      duration: {}", break_duration(duration));
            }
            if let Some(restrictions) = &details.delivery_restrictions {
                let _ = writeln!(
                    out,
                    "      restrictions: web={} no_regional_blackout={} archive={} device={}",
                    restrictions.web_delivery_allowed_flag,
                    restrictions.no_regional_blackout_flag,
                    restrictions.archive_allowed_flag,
                    restrictions.device_restrictions
                );
            }
            if let SegmentationScope::Components(components) = &details.scope {
                for component in components {
                    let _ = writeln!(
                        out,
                        "      component 0x{:02X}: pts_offset={}",
                        component.component_tag, component.pts_offset
                    );
                }
            }
        }
        DescriptorBody::Unknown => {
            let _ = writeln!(out, "unknown ({} bytes skipped)", descriptor.length);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::STANDARD};

    fn sample() -> SpliceInfoSection {
        let data = STANDARD
            .decode("/DAvAAAAAAAA///wFAVIAACPf+/+c2nALv4AUsz1AAAAAAAKAAhDVUVJAAABNWLbowo=")
            .unwrap();
        scte35::decode(&data).unwrap()
    }

    #[test]
    fn test_pretty_output() {
        let text = format_section(&sample(), OutputFormat::Pretty).unwrap();
        assert!(text.contains("splice_insert: event_id=1207959695"));
        assert!(text.contains("avail: provider_avail_id=309"));
        assert!(text.contains("crc_32: 0x62DBA30A"));
        assert!(!text.contains("e_crc_32"));
    }

    #[test]
    fn test_json_output() {
        let text = format_section(&sample(), OutputFormat::JsonCompact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["table_id"], 252);
        assert_eq!(value["splice_command"]["SpliceInsert"]["splice_event_id"], 1207959695u32);
        assert_eq!(value["trailer"]["Clear"]["crc_32"], 0x62DB_A30Au32);
        assert_eq!(value["splice_descriptors"][0]["identifier"], serde_json::json!([67, 85, 69, 73]));
    }
}
