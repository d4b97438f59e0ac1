//! Property-based test generators using proptest.
//!
//! Provides strategies for CRILAYLA payloads and @UTF table contents.

use crate::fixtures::{kind, FixtureValue};
use proptest::prelude::*;

/// Strategy for payloads that CRILAYLA accepts (more than 256 bytes).
///
/// Mixes literal noise, short repeats and long runs so both literal and
/// backreference paths get exercised.
pub fn payload_strategy(max_body: usize) -> impl Strategy<Value = Vec<u8>> {
    (
        prop::collection::vec(any::<u8>(), 256),
        prop::collection::vec(chunk_strategy(), 1..16),
    )
        .prop_map(move |(header, chunks)| {
            let mut payload = header;
            for chunk in chunks {
                payload.extend(chunk);
            }
            payload.truncate(256 + max_body.max(1));
            payload
        })
}

fn chunk_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        2 => prop::collection::vec(any::<u8>(), 1..64),
        2 => (prop::collection::vec(any::<u8>(), 1..8), 2usize..40)
            .prop_map(|(unit, times)| unit.repeat(times)),
        1 => (any::<u8>(), 3usize..600).prop_map(|(byte, len)| vec![byte; len]),
    ]
}

/// Strategy for payloads whose body contains a run of at least 260
/// identical bytes.
pub fn long_run_payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    (
        prop::collection::vec(any::<u8>(), 256..300),
        any::<u8>(),
        260usize..2000,
        prop::collection::vec(any::<u8>(), 0..32),
    )
        .prop_map(|(mut payload, byte, run, tail)| {
            payload.extend(std::iter::repeat(byte).take(run));
            payload.extend(tail);
            payload
        })
}

/// Strategy for payloads CRILAYLA must reject (256 bytes or fewer).
pub fn small_payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=256)
}

/// Strategy for backreference lengths around every field boundary.
pub fn backref_length_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        3u64..14,
        40u64..48,
        295u64..303,
        545u64..560,
        3u64..100_000,
    ]
}

/// Strategy for a per-row column kind code.
pub fn column_kind_strategy() -> impl Strategy<Value = u8> {
    prop::sample::select(vec![
        kind::U8,
        kind::I8,
        kind::U16,
        kind::I16,
        kind::U32,
        kind::I32,
        kind::U64,
        kind::I64,
        kind::F32,
        kind::F64,
        kind::STRING,
        kind::DATA,
    ])
}

/// Strategy for a value of the given kind.
///
/// Floats are finite so values compare equal after a round trip.
pub fn fixture_value_strategy(code: u8) -> BoxedStrategy<FixtureValue> {
    match code {
        kind::U8 => any::<u8>().prop_map(FixtureValue::U8).boxed(),
        kind::I8 => any::<i8>().prop_map(FixtureValue::I8).boxed(),
        kind::U16 => any::<u16>().prop_map(FixtureValue::U16).boxed(),
        kind::I16 => any::<i16>().prop_map(FixtureValue::I16).boxed(),
        kind::U32 => any::<u32>().prop_map(FixtureValue::U32).boxed(),
        kind::I32 => any::<i32>().prop_map(FixtureValue::I32).boxed(),
        kind::U64 => any::<u64>().prop_map(FixtureValue::U64).boxed(),
        kind::I64 => any::<i64>().prop_map(FixtureValue::I64).boxed(),
        kind::F32 => (-1.0e6f32..1.0e6).prop_map(FixtureValue::F32).boxed(),
        kind::F64 => (-1.0e12f64..1.0e12).prop_map(FixtureValue::F64).boxed(),
        kind::STRING => "[a-zA-Z0-9_./]{0,12}".prop_map(FixtureValue::Str).boxed(),
        _ => prop::collection::vec(any::<u8>(), 0..24)
            .prop_map(FixtureValue::Data)
            .boxed(),
    }
}

/// Strategy for a table description: column kinds plus matching rows.
pub fn table_contents_strategy(
    max_columns: usize,
    max_rows: usize,
) -> impl Strategy<Value = (Vec<u8>, Vec<Vec<FixtureValue>>)> {
    prop::collection::vec(column_kind_strategy(), 1..=max_columns.max(1)).prop_flat_map(
        move |kinds| {
            let row = kinds
                .iter()
                .map(|&code| fixture_value_strategy(code))
                .collect::<Vec<_>>();
            let rows = prop::collection::vec(row, 0..=max_rows);
            (Just(kinds), rows)
        },
    )
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
