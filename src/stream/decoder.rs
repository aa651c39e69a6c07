//! Chunked JSON stream decoder

use crate::error::{GantryError, GantryResult};
use serde_json::{Deserializer, Value};
use std::io::Read;

/// Consumer of decoded daemon messages.
///
/// `start` is called once before the first value, `stop` exactly once
/// after the stream ends, on every exit path including decode errors.
pub trait StreamHandler {
    /// Called once before any value is delivered
    fn start(&mut self) {}

    /// Called for each decoded JSON value
    fn process(&mut self, value: Value) -> GantryResult<()>;

    /// Called exactly once when the stream ends
    fn stop(&mut self) {}
}

/// Decode back-to-back JSON values from `reader`, feeding each to `handler`.
///
/// Whitespace between values is tolerated. A malformed value aborts the
/// decode with a stream error; values already delivered are not retracted.
/// The reader is consumed and dropped on every exit path.
pub fn decode_stream<R: Read>(handler: &mut dyn StreamHandler, reader: R) -> GantryResult<()> {
    handler.start();

    let result = (|| {
        for value in Deserializer::from_reader(reader).into_iter::<Value>() {
            let value = value.map_err(|e| GantryError::MalformedStream(e.to_string()))?;
            handler.process(value)?;
        }
        Ok(())
    })();

    handler.stop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records lifecycle calls and received values
    #[derive(Default)]
    struct Recorder {
        started: u32,
        stopped: u32,
        values: Vec<Value>,
    }

    impl StreamHandler for Recorder {
        fn start(&mut self) {
            self.started += 1;
        }

        fn process(&mut self, value: Value) -> GantryResult<()> {
            self.values.push(value);
            Ok(())
        }

        fn stop(&mut self) {
            self.stopped += 1;
        }
    }

    #[test]
    fn decodes_concatenated_objects() {
        let input = br#"{"stream":"a"}{"stream":"b"}{"status":"done"}"#;
        let mut rec = Recorder::default();

        decode_stream(&mut rec, &input[..]).unwrap();

        assert_eq!(rec.values.len(), 3);
        assert_eq!(rec.values[0]["stream"], "a");
        assert_eq!(rec.values[2]["status"], "done");
        assert_eq!(rec.started, 1);
        assert_eq!(rec.stopped, 1);
    }

    #[test]
    fn tolerates_whitespace_between_values() {
        let input = b"  {\"a\":1}\n\n  {\"b\":2}\n";
        let mut rec = Recorder::default();

        decode_stream(&mut rec, &input[..]).unwrap();

        assert_eq!(rec.values.len(), 2);
    }

    #[test]
    fn empty_stream_still_runs_lifecycle() {
        let mut rec = Recorder::default();

        decode_stream(&mut rec, &b""[..]).unwrap();

        assert!(rec.values.is_empty());
        assert_eq!(rec.started, 1);
        assert_eq!(rec.stopped, 1);
    }

    #[test]
    fn malformed_value_aborts_but_stops_once() {
        let input = br#"{"ok":true}{not json"#;
        let mut rec = Recorder::default();

        let err = decode_stream(&mut rec, &input[..]).unwrap_err();

        assert!(matches!(err, GantryError::MalformedStream(_)));
        // The value before the malformed one was already delivered
        assert_eq!(rec.values.len(), 1);
        assert_eq!(rec.stopped, 1);
    }

    #[test]
    fn handler_error_propagates_after_stop() {
        struct Failing {
            stopped: bool,
        }

        impl StreamHandler for Failing {
            fn process(&mut self, _value: Value) -> GantryResult<()> {
                Err(GantryError::BuildFailed("daemon says no".to_string()))
            }

            fn stop(&mut self) {
                self.stopped = true;
            }
        }

        let mut handler = Failing { stopped: false };
        let err = decode_stream(&mut handler, &br#"{"error":"x"}"#[..]).unwrap_err();

        assert!(matches!(err, GantryError::BuildFailed(_)));
        assert!(handler.stopped);
    }
}
