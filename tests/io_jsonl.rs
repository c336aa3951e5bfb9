#![cfg(feature = "io-jsonl")]

use anyhow::Result;
use recfile::testing::*;
use recfile::*;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
struct Reading {
    sensor_id: String,
    value: f64,
}

#[test]
fn typed_round_trip_plain_and_gzip() -> Result<()> {
    let dir = TempDirPath::new()?;
    let events = sample_events(40);
    for name in ["events.jsonl", "events.jsonl.gz"] {
        let path = mock_jsonl_file(&dir, name, &events)?;
        let mut r = open_jsonl_file(&path, JsonOptions::default())?;
        let mut back = Vec::new();
        while let Some(ev) = r.read::<SampleEvent>()? {
            back.push(ev);
        }
        assert_eq!(back, events);
        assert_eq!(r.lines(), 40);
    }
    assert_files_equal(dir.file_path("events.jsonl"), dir.file_path("events.jsonl.gz"));
    Ok(())
}

#[test]
fn lines_are_compact_and_terminated() -> Result<()> {
    let mut w = JsonlWriter::new(Vec::new(), Compression::None, JsonOptions::default());
    for ev in sample_events(2) {
        w.write(&ev)?;
    }
    assert_eq!(w.count(), 2);
    let text = String::from_utf8(w.close()?)?;
    assert_eq!(
        text,
        "{\"id\":0,\"kind\":\"click\",\"user\":null,\"tags\":[\"batch\",\"t0\"]}\n\
         {\"id\":1,\"kind\":\"view\",\"user\":\"user-1\",\"tags\":[]}\n"
    );
    Ok(())
}

#[test]
fn final_line_without_terminator_is_a_record() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("tail.jsonl");
    fs::write(&path, "{\"sensorId\":\"a\",\"value\":1.5}\n{\"sensorId\":\"b\",\"value\":2.0}")?;

    let mut r = open_jsonl_file(&path, JsonOptions::default())?;
    assert_eq!(r.read::<Reading>()?.map(|x| x.sensor_id), Some("a".to_string()));
    assert_eq!(r.read::<Reading>()?.map(|x| x.sensor_id), Some("b".to_string()));
    assert!(r.read::<Reading>()?.is_none());
    assert!(r.read::<Reading>()?.is_none());
    Ok(())
}

#[test]
fn read_into_reuses_holder() -> Result<()> {
    let input = b"{\"sensorId\":\"a\",\"value\":1.0}\n{\"sensorId\":\"b\",\"value\":2.0}\n";
    let mut r = JsonlReader::new(&input[..], Compression::None, JsonOptions::default())?;
    let mut holder = Reading::default();
    let mut seen = Vec::new();
    while r.read_into(&mut holder)? {
        seen.push(holder.sensor_id.clone());
    }
    assert_eq!(seen, ["a", "b"]);
    // exhaustion leaves the last value in place
    assert_eq!(holder.sensor_id, "b");
    Ok(())
}

#[test]
fn omit_nulls_drops_missing_fields() -> Result<()> {
    let mut w = JsonlWriter::new(Vec::new(), Compression::None, JsonOptions::omit_nulls());
    w.write(&sample_events(1)[0])?;
    let bytes = w.close()?;
    assert_eq!(bytes, b"{\"id\":0,\"kind\":\"click\",\"tags\":[\"batch\",\"t0\"]}\n");

    let mut r = JsonlReader::new(bytes.as_slice(), Compression::None, JsonOptions::omit_nulls())?;
    let back: SampleEvent = r.read()?.expect("one event");
    assert_eq!(back, sample_events(1)[0]);
    Ok(())
}

#[test]
fn raw_lines_pass_through_untouched() -> Result<()> {
    let mut w = JsonlWriter::new(Vec::new(), Compression::Gzip, JsonOptions::default());
    w.write_raw(br#"{"b":1,  "a":2}"#)?;
    w.write_raw(b"[]")?;
    let bytes = w.close()?;

    let mut r = JsonlReader::new(bytes.as_slice(), Compression::Gzip, JsonOptions::default())?;
    assert_eq!(r.read_raw()?.as_deref(), Some(&br#"{"b":1,  "a":2}"#[..]));
    assert_eq!(r.read_raw()?.as_deref(), Some(&b"[]"[..]));
    assert_eq!(r.read_raw()?, None);
    Ok(())
}

#[test]
fn decode_error_names_line() -> Result<()> {
    let input = b"{\"sensorId\":\"a\",\"value\":1.0}\nnot json\n";
    let mut r = JsonlReader::new(&input[..], Compression::None, JsonOptions::default())?;
    assert!(r.read::<Reading>()?.is_some());
    let err = r.read::<Reading>().expect_err("second line is malformed");
    assert!(err.to_string().contains("line 2"));
    Ok(())
}

#[test]
fn empty_file_is_exhausted_immediately() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = mock_jsonl_file::<SampleEvent>(&dir, "empty.jsonl.gz", &[])?;
    let mut r = open_jsonl_file(&path, JsonOptions::default())?;
    assert!(r.read::<SampleEvent>()?.is_none());
    assert_eq!(r.lines(), 0);
    Ok(())
}

#[test]
fn file_errors_name_the_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("bad.jsonl");
    fs::write(&path, "{\"sensorId\":\"a\",\"value\":1.0}\nnot json\n")?;

    let mut r = open_jsonl_file(&path, JsonOptions::default())?;
    assert!(r.read::<Reading>()?.is_some());
    let err = r.read::<Reading>().expect_err("second line is malformed");
    let msg = format!("{err:#}");
    assert!(msg.contains("line 2"), "{msg}");
    assert!(msg.contains("bad.jsonl"), "{msg}");
    Ok(())
}
