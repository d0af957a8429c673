//! Test-only helpers shared by the lancedoc crates.

use std::sync::Once;

use arrow::datatypes::{DataType, Field, Fields, TimeUnit};
use lancedoc_types::{Document, MetaValue, Metadata};
use time::OffsetDateTime;

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let env = std::env::var("RUST_LOG").ok();
        let filter = match env {
            Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            None => EnvFilter::new("info"),
        };
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(feature = "auto-init")]
mod auto {
    // Use ctor to run at binary init time to avoid having to call init in every test.
    use ctor::ctor;

    #[ctor]
    fn init() {
        super::init_tracing_for_tests();
    }
}

/// Metadata schema with a single nullable `count: int32` field.
pub fn count_metadata() -> Fields {
    Fields::from(vec![Field::new("count", DataType::Int32, true)])
}

/// Flat metadata schema covering every scalar type a document may carry.
pub fn scalar_metadata() -> Fields {
    Fields::from(vec![
        Field::new("name", DataType::Utf8, true),
        Field::new("page", DataType::Utf8, true),
        Field::new("chapter", DataType::Utf8, true),
        Field::new("number", DataType::Int32, true),
        Field::new("views", DataType::Int64, true),
        Field::new("rating", DataType::Float64, true),
        Field::new("weight", DataType::Float32, true),
        Field::new("date", DataType::Timestamp(TimeUnit::Second, None), true),
        Field::new("no_embedding", DataType::Boolean, true),
        Field::new("thumbnail", DataType::Binary, true),
    ])
}

/// Two-level nested metadata schema.
pub fn nested_metadata() -> Fields {
    let address = Fields::from(vec![
        Field::new("street", DataType::Utf8, true),
        Field::new("zip", DataType::Int32, true),
    ]);
    let author = Fields::from(vec![
        Field::new("name", DataType::Utf8, true),
        Field::new("address", DataType::Struct(address), true),
    ]);
    Fields::from(vec![
        Field::new("title", DataType::Utf8, true),
        Field::new("author", DataType::Struct(author), true),
    ])
}

/// A document exercising every field of [`scalar_metadata`].
pub fn full_scalar_document(id: &str) -> Document {
    Document::new(id)
        .with_content("A long time ago")
        .with_embedding(vec![0.5, -0.25, 1.0])
        .with_blob(vec![0xde, 0xad, 0xbe, 0xef])
        .with_meta("name", "name_0")
        .with_meta("page", "100")
        .with_meta("chapter", "intro")
        .with_meta("number", 7)
        .with_meta("views", 9_000_000_000_i64)
        .with_meta("rating", 4.5)
        .with_meta("weight", 0.25_f32)
        .with_meta("date", "1969-07-21T02:56:15")
        .with_meta("no_embedding", false)
        .with_meta("thumbnail", vec![1_u8, 2, 3])
}

/// Nested metadata value for [`nested_metadata`].
pub fn author(name: &str, street: Option<&str>, zip: Option<i64>) -> MetaValue {
    let mut address = Metadata::new();
    if let Some(street) = street {
        address.insert("street".into(), MetaValue::from(street));
    }
    if let Some(zip) = zip {
        address.insert("zip".into(), MetaValue::Int(zip));
    }
    let mut author = Metadata::new();
    author.insert("name".into(), MetaValue::from(name));
    author.insert("address".into(), MetaValue::Map(address));
    MetaValue::Map(author)
}

/// Fixed instant used by timestamp tests: 2024-01-02T03:04:05Z.
pub fn fixed_instant() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_704_164_645).expect("valid fixed instant")
}
