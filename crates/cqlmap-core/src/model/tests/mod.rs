mod entity;

use crate::{
    codec::NativeCodec,
    error::{ErrorClass, MappingError},
    value::ValueKind,
};

fn text() -> crate::codec::CodecRef {
    NativeCodec::shared(ValueKind::Text)
}

fn bigint() -> crate::codec::CodecRef {
    NativeCodec::shared(ValueKind::BigInt)
}

#[track_caller]
fn assert_class<T: std::fmt::Debug>(result: Result<T, MappingError>, class: ErrorClass) -> String {
    let err = result.expect_err("operation should fail");
    assert_eq!(err.class, class, "unexpected error: {}", err.message);

    err.message
}
