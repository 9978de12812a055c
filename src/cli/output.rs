//! Output formatting for the command-line tool

use crate::core::protocol::{decode, InvalidFrame, Message, NavDop, RawFrame};
use crate::core::reader::{Classified, FixReport};
use serde_json::json;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Render one classified unit. `NoData`, `Closed` and transport errors
/// produce nothing.
pub fn format_unit(unit: &Classified<'_>, format: OutputFormat) -> Option<String> {
    match unit {
        Classified::BinaryFrame(frame) => Some(format_frame(frame, format)),
        Classified::TextSentence(sentence) => Some(match format {
            OutputFormat::Text => sentence.trimmed().to_string(),
            OutputFormat::Json => json!({
                "kind": "sentence",
                "address": sentence.address(),
                "text": sentence.trimmed(),
            })
            .to_string(),
        }),
        Classified::InvalidFrame(invalid) => Some(format_invalid(invalid, format)),
        Classified::NoData | Classified::Closed | Classified::TransportError(_) => None,
    }
}

fn format_frame(frame: &RawFrame<'_>, format: OutputFormat) -> String {
    match decode(frame) {
        Ok(Message::Unknown(msg)) => match format {
            OutputFormat::Text => {
                format!("{} len={} {}", msg, frame.len(), hex::encode(frame.payload()))
            }
            OutputFormat::Json => json!({
                "kind": "frame",
                "class": msg.class,
                "id": msg.id,
                "payload": hex::encode(frame.payload()),
            })
            .to_string(),
        },
        Ok(message) => match format {
            OutputFormat::Text => format_message(&message),
            OutputFormat::Json => json!({ "kind": "message", "data": message }).to_string(),
        },
        Err(err) => format_invalid(&InvalidFrame::from(err), format),
    }
}

fn format_invalid(invalid: &InvalidFrame, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("invalid: {}", invalid),
        OutputFormat::Json => json!({ "kind": "invalid", "data": invalid }).to_string(),
    }
}

/// Single-line text rendering of a decoded message
pub fn format_message(message: &Message) -> String {
    match message {
        Message::NavPvt(pvt) => {
            let utc = pvt
                .utc
                .and_then(|t| t.to_datetime())
                .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
            format!(
                "NAV-PVT {:?} valid={} lat={:.7} lon={:.7} hacc={:.3}m sv={} speed={:.3}m/s \
                 heading={:.5} heading_valid={} pdop={:.2} utc={}",
                pvt.fix_type,
                pvt.fix_valid,
                pvt.latitude,
                pvt.longitude,
                pvt.horizontal_accuracy_m,
                pvt.num_sv,
                pvt.ground_speed_mps,
                pvt.vehicle_heading_deg,
                pvt.heading_valid,
                pvt.pdop_scaled(),
                utc,
            )
        }
        Message::NavDop(dop) => format!(
            "NAV-DOP hdop={:.2} vdop={:.2} pdop={:.2} gdop={:.2}",
            NavDop::scaled(dop.hdop),
            NavDop::scaled(dop.vdop),
            NavDop::scaled(dop.pdop),
            NavDop::scaled(dop.gdop),
        ),
        Message::EsfStatus(status) => {
            let sensors = status.sensors.as_ref().map_or_else(
                || format!("unset ({} declared)", status.declared_sensors),
                |sensors| {
                    sensors
                        .iter()
                        .map(|s| {
                            format!(
                                "{}:{}{}c{}",
                                s.sensor_type(),
                                if s.used() { "u" } else { "-" },
                                if s.ready() { "r" } else { "-" },
                                s.calibration_status()
                            )
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                },
            );
            format!("ESF-STATUS mode={:?} sensors=[{}]", status.fusion_mode, sensors)
        }
        Message::MonVer(ver) => format!(
            "MON-VER sw=\"{}\" hw=\"{}\" fw=\"{}\"",
            ver.software_version,
            ver.hardware_version,
            ver.firmware_version.as_deref().unwrap_or("-"),
        ),
        Message::Unknown(msg) => msg.to_string(),
    }
}

/// Render a fix report
pub fn format_fix(report: &FixReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!(report).to_string(),
        OutputFormat::Text => {
            let mut line = format_message(&Message::NavPvt(report.fix.clone()));
            if let Some(dop) = &report.dop {
                line.push_str(&format!(" hdop={:.2}", NavDop::scaled(dop.hdop)));
            }
            if let Some(fusion) = &report.fusion {
                line.push_str(&format!(" fusion={:?}", fusion.fusion_mode));
            }
            if let Some(fw) = report.version.as_ref().and_then(|v| v.firmware_version.as_deref()) {
                line.push_str(&format!(" fw=\"{}\"", fw));
            }
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::{MessageId, Sentence};

    #[test]
    fn test_unknown_frame_hex() {
        let payload = [0xDE, 0xAD];
        let frame = RawFrame::new(MessageId::new(0x02, 0x15), &payload);
        let unit = Classified::BinaryFrame(frame);
        assert_eq!(
            format_unit(&unit, OutputFormat::Text).unwrap(),
            "0x02-0x15 len=2 dead"
        );
        let json: serde_json::Value =
            serde_json::from_str(&format_unit(&unit, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["payload"], "dead");
        assert_eq!(json["class"], 2);
    }

    #[test]
    fn test_sentence_json() {
        let sentence = Sentence::from_bytes(b"$GNGGA,1*00\r\n").unwrap();
        let out = format_unit(&Classified::TextSentence(sentence), OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["address"], "GNGGA");
        assert_eq!(json["text"], "$GNGGA,1*00");
    }

    #[test]
    fn test_invalid_json_reason() {
        let unit = Classified::InvalidFrame(InvalidFrame::Garbage { bytes: 5 });
        let json: serde_json::Value =
            serde_json::from_str(&format_unit(&unit, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["data"]["reason"], "garbage");
        assert_eq!(json["data"]["bytes"], 5);
    }

    #[test]
    fn test_truncated_known_frame() {
        let payload = [0u8; 4];
        let frame = RawFrame::new(MessageId::NAV_DOP, &payload);
        let out = format_unit(&Classified::BinaryFrame(frame), OutputFormat::Text).unwrap();
        assert!(out.starts_with("invalid:"));
    }

    #[test]
    fn test_nodata_renders_nothing() {
        assert!(format_unit(&Classified::NoData, OutputFormat::Text).is_none());
    }
}
