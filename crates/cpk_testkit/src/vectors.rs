//! Known-answer vectors for the CRILAYLA codec.
//!
//! Vectors are plain hex so they can be exported as JSON and checked
//! against other CRILAYLA implementations.

use serde::{Deserialize, Serialize};

/// A test vector that can be shared with other implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Input data (hex-encoded).
    pub input_hex: String,
    /// Expected output data (hex-encoded).
    pub expected_hex: String,
    /// Expected error kind (if this should fail).
    pub expected_error: Option<String>,
}

const MAGIC_HEX: &str = "4352494c41594c41";

fn container_hex(uncompressed: u32, stream_hex: &str, header_hex: &str) -> String {
    let compressed = (stream_hex.len() / 2) as u32;
    format!(
        "{MAGIC_HEX}{}{}{stream_hex}{header_hex}",
        hex_encode(&uncompressed.to_le_bytes()),
        hex_encode(&compressed.to_le_bytes()),
    )
}

/// CRILAYLA decoding vectors.
pub fn crilayla_decode_vectors() -> Vec<TestVector> {
    let zeros = "00".repeat(256);
    let counting: String = (0..=255u8).map(|b| format!("{b:02x}")).collect();

    vec![
        TestVector {
            id: "crilayla_three_literals".into(),
            description: "Three literal bytes AA BB CC after 256 zero bytes".into(),
            input_hex: container_hex(3, "40d52e66", &zeros),
            expected_hex: format!("{zeros}aabbcc"),
            expected_error: None,
        },
        TestVector {
            id: "crilayla_header_passthrough".into(),
            description: "Raw block is copied verbatim in front of the body".into(),
            input_hex: container_hex(3, "40d52e66", &counting),
            expected_hex: format!("{counting}aabbcc"),
            expected_error: None,
        },
        TestVector {
            id: "crilayla_empty_body".into(),
            description: "Zero-length body needs no bitstream".into(),
            input_hex: container_hex(0, "", &zeros),
            expected_hex: zeros.clone(),
            expected_error: None,
        },
        TestVector {
            id: "crilayla_bad_magic".into(),
            description: "Signature other than CRILAYLA or zeros".into(),
            input_hex: format!(
                "4352494c41594c42{}",
                &container_hex(3, "40d52e66", &zeros)[16..]
            ),
            expected_hex: String::new(),
            expected_error: Some("BadSignature".into()),
        },
        TestVector {
            id: "crilayla_trailing_byte".into(),
            description: "Container one byte longer than its header declares".into(),
            input_hex: format!("{}00", container_hex(3, "40d52e66", &zeros)),
            expected_hex: String::new(),
            expected_error: Some("SizeMismatch".into()),
        },
        TestVector {
            id: "crilayla_stream_exhausted".into(),
            description: "Four bytes of bitstream cannot produce four literals".into(),
            input_hex: container_hex(4, "40d52e66", &zeros),
            expected_hex: String::new(),
            expected_error: Some("UnexpectedEndOfInput".into()),
        },
    ]
}

/// CRILAYLA encoding vectors (bit-exact output of the greedy encoder).
pub fn crilayla_encode_vectors() -> Vec<TestVector> {
    let zeros = "00".repeat(256);
    vec![TestVector {
        id: "crilayla_encode_three_literals".into(),
        description: "Body too short for any backreference".into(),
        input_hex: format!("{zeros}aabbcc"),
        expected_hex: container_hex(3, "40d52e66", &zeros),
        expected_error: None,
    }]
}

/// Generate all test vectors as JSON for cross-implementation use.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        crilayla_decode: crilayla_decode_vectors(),
        crilayla_encode: crilayla_encode_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    crilayla_decode: Vec<TestVector>,
    crilayla_encode: Vec<TestVector>,
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes lowercase or uppercase hex.
///
/// # Panics
///
/// Panics on odd length or non-hex characters.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "hex string has odd length");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}
