use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use bytes::{BufMut, BytesMut};

/// Scalar wire format of a leaf field.
///
/// The authored tag `int` is an alias for `int.le`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WireFormat {
    /// Unsigned integer, least-significant byte first.
    IntLe,
    /// Unsigned integer, most-significant byte first.
    IntBe,
    /// UTF-8 text, left-aligned and zero-padded to the field width.
    Str,
    /// Two packed decimal digits (tens, ones) in one byte.
    Bcd,
}

impl WireFormat {
    pub(crate) fn parse(tag: &str) -> Option<WireFormat> {
        match tag {
            "int" | "int.le" => Some(WireFormat::IntLe),
            "int.be" => Some(WireFormat::IntBe),
            "string" => Some(WireFormat::Str),
            "bcd" => Some(WireFormat::Bcd),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            WireFormat::IntLe => "int.le",
            WireFormat::IntBe => "int.be",
            WireFormat::Str => "string",
            WireFormat::Bcd => "bcd",
        }
    }
}

/// Encode one scalar into exactly `byte_length` bytes.
///
/// Integer values wider than the field truncate silently; the schema is
/// trusted to declare the width it means. Strings truncate at the field
/// width and shorter ones are zero-padded.
pub(crate) fn encode_scalar(
    dst: &mut BytesMut,
    format: WireFormat,
    byte_length: usize,
    value: &Value,
) -> CodecResult<()> {
    match format {
        WireFormat::IntLe => {
            let v = expect_int(format, value)?;
            for i in 0..byte_length {
                dst.put_u8(int_byte(v, i));
            }
        }
        WireFormat::IntBe => {
            let v = expect_int(format, value)?;
            for i in (0..byte_length).rev() {
                dst.put_u8(int_byte(v, i));
            }
        }
        WireFormat::Str => {
            let s = value.as_str().ok_or_else(|| {
                CodecError::UnexpectedType(format!(
                    "string field needs text, got {}",
                    value.type_name()
                ))
            })?;
            let bytes = s.as_bytes();
            for i in 0..byte_length {
                dst.put_u8(bytes.get(i).copied().unwrap_or(0));
            }
        }
        WireFormat::Bcd => {
            let v = expect_int(format, value)? % 100;
            dst.put_u8(((v / 10) as u8) << 4 | (v % 10) as u8);
            // Field width is compile-checked to 1 for bcd.
        }
    }
    Ok(())
}

/// Decode one scalar from a window of exactly the field's width.
pub(crate) fn decode_scalar(window: &[u8], format: WireFormat) -> CodecResult<Value> {
    match format {
        WireFormat::IntLe => Ok(Value::Int(
            window
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | b as u64),
        )),
        WireFormat::IntBe => Ok(Value::Int(
            window.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
        )),
        WireFormat::Str => {
            let end = window.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
            let text = std::str::from_utf8(&window[..end]).map_err(|_| {
                CodecError::InvalidData("string field is not valid UTF-8".to_string())
            })?;
            Ok(Value::Str(text.to_string()))
        }
        WireFormat::Bcd => {
            let b = window[0];
            let tens = b >> 4;
            let ones = b & 0x0F;
            if tens > 9 || ones > 9 {
                return Err(CodecError::InvalidData(format!(
                    "invalid BCD digit in byte {b:#04X}"
                )));
            }
            Ok(Value::Int(tens as u64 * 10 + ones as u64))
        }
    }
}

fn expect_int(format: WireFormat, value: &Value) -> CodecResult<u64> {
    value.as_int().ok_or_else(|| {
        CodecError::UnexpectedType(format!(
            "{} field needs an integer, got {}",
            format.as_str(),
            value.type_name()
        ))
    })
}

fn int_byte(v: u64, i: usize) -> u8 {
    let shift = 8 * i;
    if shift < u64::BITS as usize {
        (v >> shift) as u8
    } else {
        0
    }
}
