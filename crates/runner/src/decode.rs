//! Result decoding - turns the runner payload into a [`SuiteResult`]
//!
//! The driver prints one JSON document:
//!
//! ```text
//! {"results": {"<module>": {"<test case>": [{"testNumber": 1, "message": "...",
//!   "expected": "..."|null, "actual": "..."|null, "source": "..."|null,
//!   "failure": false}]}}}
//! ```
//!
//! The bare module mapping (without the `results` envelope) is accepted too.
//! Key order is kept at both levels.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pagetest_common::{DecodeError, Modules, Result, SuiteResult};

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Envelope(Envelope),
    Bare(Modules),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    results: Modules,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    results: &'a Modules,
}

/// Decode a runner payload.
///
/// Either the whole payload decodes or nothing is returned.
pub fn decode(raw: &str) -> Result<SuiteResult> {
    let payload = raw.trim();
    if payload.is_empty() {
        return Err(DecodeError::Empty.into());
    }

    let modules = match serde_json::from_str::<Payload>(payload).map_err(DecodeError::from)? {
        Payload::Envelope(envelope) => envelope.results,
        Payload::Bare(modules) => modules,
    };

    let suite = SuiteResult::new(modules);
    if let Some((expected, found)) = suite.numbering_gap() {
        warn!(
            "Assertion numbering is not continuous: expected {}, found {}",
            expected, found
        );
    }
    debug!(
        "Decoded {} module(s), {} assertion(s)",
        suite.modules.len(),
        suite.record_count()
    );

    Ok(suite)
}

/// Serialize a suite back into the driver's payload format
pub fn encode(suite: &SuiteResult) -> Result<String> {
    let payload = EnvelopeRef {
        results: &suite.modules,
    };
    Ok(serde_json::to_string(&payload).map_err(DecodeError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagetest_common::Error;

    #[test]
    fn test_decode_preserves_key_order() {
        let raw = r#"{"results":{
            "Zeta":{"b":[{"testNumber":1,"message":"m","expected":"1","actual":"1","source":null,"failure":false}],
                    "a":[{"testNumber":2,"message":"m","expected":"1","actual":"1","source":null,"failure":false}]},
            "Alpha":{"only":[{"testNumber":3,"message":"m","expected":null,"actual":null,"source":null,"failure":true}]}
        }}"#;

        let suite = decode(raw).unwrap();
        assert_eq!(suite.module_names(), vec!["Zeta", "Alpha"]);
        let cases: Vec<&str> = suite.modules["Zeta"].keys().map(String::as_str).collect();
        assert_eq!(cases, vec!["b", "a"]);

        let encoded = encode(&suite).unwrap();
        let reparsed = decode(&encoded).unwrap();
        assert_eq!(reparsed, suite);
        assert!(encoded.find("Zeta").unwrap() < encoded.find("Alpha").unwrap());
    }

    #[test]
    fn test_decode_bare_mapping() {
        let raw = r#"{"Module":{"case":[{"testNumber":1,"message":"ok","failure":false}]}}"#;
        let suite = decode(raw).unwrap();
        let record = &suite.modules["Module"]["case"][0];
        assert_eq!(record.expected, None);
        assert_eq!(record.source_snippet, None);
    }

    #[test]
    fn test_module_named_results_is_not_an_envelope() {
        let raw = r#"{"results":{"case":[{"testNumber":1,"message":"ok","failure":false}]}}"#;
        let suite = decode(raw).unwrap();
        assert_eq!(suite.module_names(), vec!["results"]);
    }

    #[test]
    fn test_null_and_empty_are_distinct() {
        let raw = r#"{"results":{"m":{"t":[
            {"testNumber":1,"message":"a","expected":null,"actual":null,"failure":true},
            {"testNumber":2,"message":"b","expected":"","actual":"","failure":true}
        ]}}}"#;
        let suite = decode(raw).unwrap();
        let records = &suite.modules["m"]["t"];
        assert_eq!(records[0].expected, None);
        assert_eq!(records[1].expected, Some(String::new()));
        assert_ne!(records[0], records[1]);

        let encoded = encode(&suite).unwrap();
        assert!(encoded.contains(r#""expected":null"#));
        assert!(encoded.contains(r#""expected":"""#));
    }

    #[test]
    fn test_empty_payload_fails() {
        assert!(matches!(decode("  \n"), Err(Error::Decode(DecodeError::Empty))));
    }

    #[test]
    fn test_truncated_payload_fails() {
        let raw = r#"{"results":{"m":{"t":[{"testNumber":1,"message":"a""#;
        assert!(matches!(decode(raw), Err(Error::Decode(DecodeError::Malformed(_)))));
    }

    #[test]
    fn test_wrong_shape_fails() {
        assert!(decode(r#"{"results":{"m":["not","a","map"]}}"#).is_err());
        assert!(decode(r#"[1,2,3]"#).is_err());
        assert!(decode(r#"{"m":{"t":[{"message":"missing number","failure":true}]}}"#).is_err());
        assert!(decode("Unable to open test at /tmp/x.html").is_err());
    }

    #[test]
    fn test_empty_object_has_no_modules() {
        let suite = decode("{}").unwrap();
        assert!(suite.modules.is_empty());
        assert!(suite.is_empty());
    }
}
