#![cfg(feature = "io-binary")]

use anyhow::Result;
use recfile::testing::*;
use recfile::*;
use std::fs::{self, OpenOptions};
use std::io::Write;

type EventCodec = PostcardCodec<SampleEvent>;

#[test]
fn postcard_round_trip_plain_and_gzip() -> Result<()> {
    let dir = TempDirPath::new()?;
    let events = sample_events(30);
    for name in ["events.bin", "events.bin.gz"] {
        let path = mock_binary_file(&dir, name, &events)?;
        let mut r = open_binary_file(&path, EventCodec::new())?;
        let mut back = Vec::new();
        while let Some(ev) = r.read()? {
            back.push(ev);
        }
        assert_eq!(back, events);
    }
    assert_files_equal(dir.file_path("events.bin"), dir.file_path("events.bin.gz"));
    Ok(())
}

#[test]
fn read_into_reuses_holder() -> Result<()> {
    let mut w = BinaryWriter::new(Vec::new(), Compression::None, EventCodec::new());
    for ev in sample_events(5) {
        w.write(&ev)?;
    }
    let bytes = w.close()?;

    let mut r = BinaryReader::new(bytes.as_slice(), Compression::None, EventCodec::new())?;
    let mut holder = SampleEvent::default();
    let mut ids = Vec::new();
    while r.read_into(&mut holder)? {
        ids.push(holder.id);
    }
    assert_eq!(ids, [0, 1, 2, 3, 4]);
    assert_eq!(holder.id, 4);
    Ok(())
}

#[test]
fn in_memory_frames_match_file_frames() -> Result<()> {
    let dir = TempDirPath::new()?;
    let events = sample_events(8);
    let path = mock_binary_file(&dir, "events.bin", &events)?;

    let mut w = BinaryWriter::new(Vec::new(), Compression::None, EventCodec::new());
    for ev in &events {
        w.write(ev)?;
    }
    assert_eq!(w.close()?, fs::read(&path)?);
    Ok(())
}

#[test]
fn zero_length_frame_decodes_to_default() -> Result<()> {
    let mut w = BinaryWriter::new(Vec::new(), Compression::None, RawCodec);
    w.write_raw(&[])?;
    w.write(&b"xyz".to_vec())?;
    let bytes = w.close()?;
    assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0, 3, b'x', b'y', b'z']);

    let mut r = BinaryReader::new(bytes.as_slice(), Compression::None, EventCodec::new())?;
    assert_eq!(r.read()?, Some(SampleEvent::default()));

    let mut r = BinaryReader::new(bytes.as_slice(), Compression::None, RawCodec)?;
    assert_eq!(r.read_raw()?, Some(Vec::new()));
    assert_eq!(r.read()?, Some(b"xyz".to_vec()));
    assert_eq!(r.read()?, None);
    Ok(())
}

#[test]
fn truncated_file_reports_frame_error() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = mock_binary_file(&dir, "events.bin", &sample_events(3))?;
    OpenOptions::new()
        .append(true)
        .open(&path)?
        .write_all(&[0, 0, 0, 9, 1, 2])?;

    let mut r = open_binary_file(&path, EventCodec::new())?;
    for _ in 0..3 {
        assert!(r.read()?.is_some());
    }
    let err = r.read().expect_err("fourth frame is truncated");
    assert!(matches!(
        err.downcast_ref::<FrameError>(),
        Some(FrameError::TruncatedPayload { declared: 9, read: 2 })
    ));
    Ok(())
}

#[test]
fn truncated_prefix_is_not_clean_exhaustion() -> Result<()> {
    let bytes = [0u8, 0, 0, 1, 7, 0, 0];
    let mut r = BinaryReader::new(&bytes[..], Compression::None, RawCodec)?;
    assert_eq!(r.read_raw()?, Some(vec![7]));
    let err = r.read_raw().expect_err("prefix is cut short");
    assert!(matches!(
        err.downcast_ref::<FrameError>(),
        Some(FrameError::TruncatedPrefix { read: 2 })
    ));
    Ok(())
}

#[test]
fn failed_write_poisons_writer() -> Result<()> {
    // larger than the stream buffer, so the failure surfaces on this write
    let payload = vec![0xAB; 80 * 1024];
    let mut w = BinaryWriter::new(FailingWriter::new(2), Compression::None, RawCodec);

    let err = w.write_raw(&payload).expect_err("sink rejects the frame");
    assert!(matches!(err.downcast_ref::<FrameError>(), Some(FrameError::Io(_))));

    let err = w.write_raw(b"x").expect_err("writer is poisoned");
    assert!(matches!(err.downcast_ref::<FrameError>(), Some(FrameError::Poisoned)));
    let err = w.write(&b"y".to_vec()).expect_err("writer is poisoned");
    assert!(matches!(err.downcast_ref::<FrameError>(), Some(FrameError::Poisoned)));
    Ok(())
}

#[test]
fn malformed_gzip_fails_at_open() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("events.bin.gz");
    fs::write(&path, [0, 0, 0, 1, 42])?;
    assert!(open_binary_file(&path, RawCodec).is_err());
    Ok(())
}

#[test]
fn file_errors_name_the_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("bad.bin");
    fs::write(&path, [0, 0, 0, 9, 1])?;

    let mut r = open_binary_file(&path, RawCodec)?;
    let err = r.read_raw().expect_err("frame is truncated");
    let msg = format!("{err:#}");
    assert!(msg.contains("bad.bin"), "{msg}");
    assert!(matches!(
        err.downcast_ref::<FrameError>(),
        Some(FrameError::TruncatedPayload { declared: 9, read: 1 })
    ));
    assert_eq!(r.frames(), 0);
    Ok(())
}

#[test]
fn write_returns_encoded_payload() -> Result<()> {
    let events = sample_events(3);
    let mut w = BinaryWriter::new(Vec::new(), Compression::None, EventCodec::new());
    let mut payloads = Vec::new();
    for ev in &events {
        payloads.push(w.write(ev)?.to_vec());
    }
    let bytes = w.close()?;

    let first_len = u32::try_from(payloads[0].len())?;
    assert_eq!(bytes[..4], first_len.to_be_bytes());
    assert_eq!(bytes[4..4 + payloads[0].len()], payloads[0][..]);

    let mut r = BinaryReader::new(bytes.as_slice(), Compression::None, RawCodec)?;
    for payload in &payloads {
        assert_eq!(r.read_raw()?.as_ref(), Some(payload));
    }
    assert_eq!(r.frames(), 3);
    Ok(())
}
