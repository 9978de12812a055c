//! End-to-end reader tests over scripted and replayed byte streams

use gnss_reader::core::protocol::{encoder, FixType, FusionMode, InvalidFrame, Message, MessageId};
use gnss_reader::core::reader::{
    Classified, Event, Reader, ReaderConfig, ReaderError, ReaderState, Status,
};
use gnss_reader::core::transport::{MemorySource, ReplaySource};
use std::io::Cursor;

fn nav_pvt_payload() -> Vec<u8> {
    let mut p = vec![0u8; 92];
    p[4..6].copy_from_slice(&2024u16.to_le_bytes());
    p[6] = 3;
    p[7] = 15;
    p[8] = 12;
    p[9] = 34;
    p[10] = 56;
    p[11] = 0x07;
    p[20] = 3;
    p[21] = 0x21;
    p[23] = 14;
    p[24..28].copy_from_slice(&85_123_456i32.to_le_bytes());
    p[28..32].copy_from_slice(&473_947_912i32.to_le_bytes());
    p[40..44].copy_from_slice(&1523u32.to_le_bytes());
    p[60..64].copy_from_slice(&2500i32.to_le_bytes());
    p[76..78].copy_from_slice(&156u16.to_le_bytes());
    p[84..88].copy_from_slice(&9_000_000i32.to_le_bytes());
    p
}

fn mon_ver_payload(firmware: &str) -> Vec<u8> {
    let mut p = Vec::new();
    let fields = [
        ("EXT CORE 1.00 (f10c36)", 30),
        ("00190000", 10),
        ("ROM BASE 0x118B2060", 30),
    ];
    for (text, width) in fields {
        let mut field = text.as_bytes().to_vec();
        field.resize(width, 0);
        p.extend(field);
    }
    let mut ext = firmware.as_bytes().to_vec();
    ext.resize(30, 0);
    p.extend(ext);
    p
}

fn esf_status_payload(declared: u8) -> Vec<u8> {
    let mut p = vec![0u8; 16];
    p[4] = 2;
    p[12] = 1;
    p[15] = declared;
    for _ in 0..declared {
        p.extend_from_slice(&[0xCB, 0x03, 10, 0]);
    }
    p
}

const GGA: &[u8] = b"$GNGGA,092725.00,4717.11399,N,00833.91590,E,1,08,1.01,499.6,M,48.0,M,,*5B\r\n";

/// Valid frame of unknown type, then the same frame with CK_B broken
fn unknown_frames() -> (Vec<u8>, Vec<u8>) {
    let good = encoder::encode(MessageId::new(0x02, 0x15), &[1, 2, 3]).unwrap();
    let mut bad = good.clone();
    let last = bad.len() - 1;
    bad[last] ^= 0x03;
    (good, bad)
}

fn mixed_stream() -> Vec<u8> {
    let (good, bad) = unknown_frames();
    let mut stream = vec![0x00, 0x11, 0x22];
    stream.extend(bad);
    stream.extend(encoder::encode(MessageId::NAV_PVT, &nav_pvt_payload()).unwrap());
    stream.extend_from_slice(GGA);
    stream.extend(encoder::encode(MessageId::MON_VER, &mon_ver_payload("FWVER=HPS 1.21")).unwrap());
    stream.extend(encoder::encode(MessageId::ESF_STATUS, &esf_status_payload(17)).unwrap());
    stream.extend(good);
    stream
}

fn drain(reader: &mut Reader) -> Vec<Event> {
    let mut events = Vec::new();
    loop {
        match reader.next_message(true).unwrap() {
            Event::Closed => return events,
            Event::NoData => {}
            event => events.push(event),
        }
    }
}

fn attached<S>(source: S) -> Reader
where
    S: gnss_reader::core::transport::ByteSource + Send + 'static,
{
    let mut reader = Reader::new(ReaderConfig::default());
    reader.attach(source).unwrap();
    reader
}

#[test]
fn mixed_stream_classifies_in_order() {
    let mut reader = attached(MemorySource::from_bytes(&mixed_stream(), 7));
    let events = drain(&mut reader);
    assert_eq!(events.len(), 7, "{:?}", events);

    assert_eq!(events[0], Event::Invalid(InvalidFrame::Garbage { bytes: 3 }));
    assert_eq!(
        events[1],
        Event::Invalid(InvalidFrame::ChecksumMismatch {
            msg: MessageId::new(0x02, 0x15),
        })
    );

    match &events[2] {
        Event::Message(Message::NavPvt(pvt)) => {
            assert!((pvt.latitude - 47.394_791_2).abs() < 1e-9);
            assert!((pvt.longitude - 8.512_345_6).abs() < 1e-9);
            assert!((pvt.horizontal_accuracy_m - 1.523).abs() < 1e-9);
            assert!((pvt.ground_speed_mps - 2.5).abs() < 1e-9);
            assert!((pvt.vehicle_heading_deg - 90.0).abs() < 1e-9);
            assert!(pvt.fix_valid);
            assert!(pvt.heading_valid);
            assert_eq!(pvt.fix_type, FixType::Fix3D);
            assert_eq!(pvt.num_sv, 14);
            assert_eq!(pvt.pdop, 156);
            assert_eq!(pvt.utc.map(|t| t.seconds), Some(1_710_506_096));
        }
        other => panic!("expected NAV-PVT, got {:?}", other),
    }

    let gga = String::from_utf8_lossy(&GGA[..GGA.len() - 2]).into_owned();
    assert_eq!(events[3], Event::Sentence(gga));

    match &events[4] {
        Event::Message(Message::MonVer(ver)) => {
            assert_eq!(ver.software_version, "EXT CORE 1.00 (f10c36)");
            assert_eq!(ver.hardware_version, "00190000");
            assert_eq!(ver.firmware_version.as_deref(), Some("HPS 1.21"));
            assert_eq!(ver.extensions.len(), 2);
        }
        other => panic!("expected MON-VER, got {:?}", other),
    }

    match &events[5] {
        Event::Message(Message::EsfStatus(status)) => {
            assert_eq!(status.fusion_mode, FusionMode::Fusion);
            assert_eq!(status.declared_sensors, 17);
            assert!(status.sensors.is_none());
        }
        other => panic!("expected ESF-STATUS, got {:?}", other),
    }

    assert_eq!(events[6], Event::Message(Message::Unknown(MessageId::new(0x02, 0x15))));

    let stats = reader.stats();
    assert_eq!(stats.binary_frames, 4);
    assert_eq!(stats.text_sentences, 1);
    assert_eq!(stats.invalid_frames, 2);
}

#[test]
fn chunking_does_not_change_events() {
    let stream = mixed_stream();
    let whole = drain(&mut attached(MemorySource::from_bytes(&stream, stream.len())));
    for chunk in [1, 2, 5, 13, 64] {
        let split = drain(&mut attached(MemorySource::from_bytes(&stream, chunk)));
        assert_eq!(split, whole, "chunk size {}", chunk);
    }
}

#[test]
fn replay_source_yields_fix_reports() {
    let mut capture = Vec::new();
    let version = mon_ver_payload("FWVER=ADR 5.10");
    capture.extend(encoder::encode(MessageId::MON_VER, &version).unwrap());
    capture.extend(encoder::encode(MessageId::ESF_STATUS, &esf_status_payload(2)).unwrap());
    capture.extend_from_slice(GGA);
    capture.extend(encoder::encode(MessageId::NAV_PVT, &nav_pvt_payload()).unwrap());
    capture.extend(encoder::encode(MessageId::NAV_PVT, &nav_pvt_payload()).unwrap());

    let mut reader = attached(ReplaySource::new(Cursor::new(capture), 5));

    let first = reader.next_fix(true).unwrap().expect("fix");
    assert_eq!(
        first.version.and_then(|v| v.firmware_version).as_deref(),
        Some("ADR 5.10")
    );
    let sensors = first.fusion.and_then(|f| f.sensors).expect("sensors");
    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[0].sensor_type(), 11);
    assert!(sensors[0].ready());

    let second = reader.next_fix(true).unwrap().expect("fix");
    assert!(second.version.is_none());
    assert!(second.fusion.is_none());

    assert!(matches!(reader.next_fix(true), Err(ReaderError::Closed)));
    assert_eq!(reader.state(), ReaderState::Closed);
}

#[test]
fn closed_stream_stays_closed() {
    let mut reader = attached(MemorySource::new().data(GGA).end().data(GGA));
    assert!(matches!(reader.pull(true), Classified::TextSentence(_)));
    for _ in 0..3 {
        let unit = reader.pull(true);
        assert_eq!(unit.status(), Status::Closed);
    }
}

#[test]
fn transport_failure_reported_once() {
    let mut reader = attached(MemorySource::new().data(&GGA[..10]).fail("cable pulled").data(GGA));
    match reader.pull(true) {
        Classified::TransportError(err) => {
            assert_eq!(err.status(), Status::TransportReadFailure);
            assert!(err.to_string().contains("cable pulled"));
        }
        other => panic!("expected transport error, got {:?}", other),
    }
    assert!(matches!(reader.pull(true), Classified::Closed));
    reader.close();
    assert!(!reader.is_open());
}

#[test]
fn poll_reply_arrives_through_pull() {
    let reply = encoder::encode(MessageId::MON_VER, &mon_ver_payload("FWVER=TIM 2.20")).unwrap();
    let source = MemorySource::new().empty().data(&reply);
    let writes = source.writes();
    let mut reader = attached(source);

    let selector = encoder::PollSelector::from_raw(-1).unwrap();
    reader.poll(MessageId::MON_VER, selector).unwrap();
    assert_eq!(writes.lock().len(), 1);

    assert_eq!(reader.next_message(false).unwrap(), Event::NoData);
    match reader.next_message(false).unwrap() {
        Event::Message(Message::MonVer(ver)) => {
            assert_eq!(ver.firmware_version.as_deref(), Some("TIM 2.20"));
        }
        other => panic!("expected MON-VER, got {:?}", other),
    }
}

#[test]
fn oversized_length_resynchronizes() {
    let mut stream = vec![0xB5, 0x62, 0x01, 0x07, 0xFF, 0x7F];
    stream.extend(encoder::encode(MessageId::NAV_PVT, &nav_pvt_payload()).unwrap());
    let mut reader = attached(MemorySource::from_bytes(&stream, 4));

    let events = drain(&mut reader);
    assert_eq!(
        events[0],
        Event::Invalid(InvalidFrame::LengthExceeded {
            msg: MessageId::NAV_PVT,
            len: 0x7FFF,
        })
    );
    assert!(matches!(events[1], Event::Message(Message::NavPvt(_))));
    assert_eq!(events.len(), 2);
}
