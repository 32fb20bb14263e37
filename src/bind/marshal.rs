//! Marshalling between bind descriptors and wire values.
//!
//! [`encode`] validates a descriptor and produces its wire metadata and value,
//! [`allocate_output_buffer`] reserves the buffer an OUT value is received
//! into, and [`decode`] turns a returned wire value back into an
//! [`OracleValue`]. [`BoundCall`] drives all binds of one execution through
//! their lifecycle.

use bytes::{Bytes, BytesMut};

use crate::bind::{normalize_name, BindDescriptor, BindSet, BindState, BindType, ExecutionResult};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::protocol::constants::*;
use crate::protocol::decode::{
    decode_oracle_date, decode_oracle_number, encode_oracle_date, encode_oracle_number,
};
use crate::protocol::types::{BindMetadata, OracleType, OracleValue};

/// A bind ready to be written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct WireParam {
    pub name: String,
    pub metadata: BindMetadata,
    /// Encoded input value; `None` is SQL NULL (and every OUT bind).
    pub value: Option<Bytes>,
}

/// Validate a descriptor and encode it for the wire.
///
/// Empty strings and empty raw values are sent as NULL.
pub fn encode(name: &str, descriptor: &BindDescriptor, config: &ConnectionConfig) -> Result<WireParam> {
    let bind_type = descriptor.bind_type();
    let value = match descriptor.value() {
        Some(value) => encode_value(name, bind_type, value)?,
        None => None,
    };
    let value_len = value.as_ref().map_or(0, Bytes::len);

    let buffer_size = match fixed_size(bind_type) {
        Some(size) => size,
        None if descriptor.is_output() => {
            let max_size = declared_max_size(name, descriptor, config)?;
            if value_len > max_size as usize {
                return Err(Error::invalid_bind(
                    name,
                    format!("value of {} bytes exceeds maxSize {}", value_len, max_size),
                ));
            }
            max_size
        }
        None => {
            if value_len > config.max_bind_size as usize {
                return Err(Error::invalid_bind(
                    name,
                    format!(
                        "value of {} bytes exceeds the {} byte bind limit",
                        value_len, config.max_bind_size
                    ),
                ));
            }
            value_len.max(1) as u32
        }
    };

    let metadata = BindMetadata::new(
        name,
        descriptor.direction().wire_code(),
        wire_type(bind_type, buffer_size),
        buffer_size,
    );
    tracing::trace!(
        bind = name,
        ora_type = metadata.ora_type_num,
        buffer_size,
        value_len,
        "encoded bind"
    );

    Ok(WireParam {
        name: name.to_string(),
        metadata,
        value,
    })
}

/// Wire size of fixed-length types.
fn fixed_size(bind_type: BindType) -> Option<u32> {
    match bind_type {
        BindType::Number => Some(TNS_NUMBER_BUFFER_SIZE),
        BindType::Date => Some(TNS_DATE_BUFFER_SIZE),
        BindType::String | BindType::Raw => None,
    }
}

fn declared_max_size(name: &str, descriptor: &BindDescriptor, config: &ConnectionConfig) -> Result<u32> {
    match descriptor.max_size() {
        None => Err(Error::invalid_bind(
            name,
            format!("maxSize is required for {} output binds", descriptor.bind_type()),
        )),
        Some(0) => Err(Error::invalid_bind(name, "maxSize must be positive")),
        Some(size) if size > config.max_bind_size => Err(Error::invalid_bind(
            name,
            format!(
                "maxSize {} exceeds the {} byte bind limit",
                size, config.max_bind_size
            ),
        )),
        Some(size) => Ok(size),
    }
}

/// Oracle type used on the wire; large buffers switch to the LONG types.
fn wire_type(bind_type: BindType, buffer_size: u32) -> OracleType {
    let is_long = buffer_size > TNS_MAX_SHORT_LENGTH;
    match bind_type {
        BindType::Number => OracleType::Number,
        BindType::Date => OracleType::Date,
        BindType::String if is_long => OracleType::Long,
        BindType::String => OracleType::Varchar2 {
            max_size: buffer_size,
        },
        BindType::Raw if is_long => OracleType::LongRaw,
        BindType::Raw => OracleType::Raw {
            max_size: buffer_size,
        },
    }
}

fn encode_value(name: &str, bind_type: BindType, value: &OracleValue) -> Result<Option<Bytes>> {
    let mismatch = || {
        Error::invalid_bind(
            name,
            format!("cannot bind a {} value as {}", value.kind(), bind_type),
        )
    };
    let bytes = match (bind_type, value) {
        (_, OracleValue::Null) => return Ok(None),
        (BindType::String, OracleValue::String(s) | OracleValue::Number(s)) => {
            Bytes::copy_from_slice(s.as_bytes())
        }
        (BindType::Raw, OracleValue::Raw(raw)) => Bytes::copy_from_slice(raw),
        (BindType::Number, OracleValue::Number(s) | OracleValue::String(s)) => {
            let encoded =
                encode_oracle_number(s).map_err(|e| Error::invalid_bind(name, e.to_string()))?;
            Bytes::from(encoded)
        }
        (BindType::Date, OracleValue::Date(dt)) => {
            let encoded =
                encode_oracle_date(dt).map_err(|e| Error::invalid_bind(name, e.to_string()))?;
            Bytes::copy_from_slice(&encoded)
        }
        _ => return Err(mismatch()),
    };
    // '' is NULL
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(bytes))
}

/// Receive buffer for one OUT or IN/OUT bind.
///
/// The buffer starts small and grows only with the data actually returned,
/// but never past `max_size`.
#[derive(Debug)]
pub struct OutputBuffer {
    name: String,
    max_size: usize,
    data: BytesMut,
}

impl OutputBuffer {
    /// Bytes currently reserved.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Largest value this buffer accepts.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Copy a returned value into the buffer.
    pub fn fill(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.max_size {
            return Err(Error::BufferTooSmall {
                name: self.name.clone(),
                needed: bytes.len(),
                max_size: self.max_size,
            });
        }
        self.data.clear();
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Take the received bytes out of the buffer.
    fn take(&mut self) -> Bytes {
        self.data.split().freeze()
    }
}

/// Reserve the receive buffer for an OUT or IN/OUT bind.
///
/// Returns `None` for IN binds.
pub fn allocate_output_buffer(
    name: &str,
    descriptor: &BindDescriptor,
    config: &ConnectionConfig,
) -> Result<Option<OutputBuffer>> {
    if !descriptor.is_output() {
        return Ok(None);
    }
    let max_size = match fixed_size(descriptor.bind_type()) {
        Some(size) => size,
        None => declared_max_size(name, descriptor, config)?,
    } as usize;
    let initial = max_size.min(config.out_buffer_capacity);
    Ok(Some(OutputBuffer {
        name: name.to_string(),
        max_size,
        data: BytesMut::with_capacity(initial),
    }))
}

/// Decode a returned wire value through `buffer`.
pub fn decode(
    wire: Option<Bytes>,
    descriptor: &BindDescriptor,
    buffer: &mut OutputBuffer,
) -> Result<OracleValue> {
    let Some(wire) = wire else {
        return Ok(OracleValue::Null);
    };
    // '' is NULL, even when sent as an empty chunked value
    if wire.is_empty() && descriptor.bind_type().is_variable_length() {
        return Ok(OracleValue::Null);
    }
    buffer.fill(&wire)?;
    let data = buffer.take();
    let value = match descriptor.bind_type() {
        BindType::String => {
            let text = String::from_utf8(data.to_vec()).map_err(|e| {
                Error::type_conversion(format!("bind :{} returned invalid UTF-8: {}", buffer.name, e))
            })?;
            OracleValue::String(text)
        }
        BindType::Raw => OracleValue::Raw(data.to_vec()),
        BindType::Number => OracleValue::Number(decode_oracle_number(&data)?),
        BindType::Date => OracleValue::Date(decode_oracle_date(&data)?),
    };
    Ok(value)
}

/// Bind positions travel as ub2.
const MAX_BINDS: usize = u16::MAX as usize;

/// One bind of an in-flight execution.
#[derive(Debug)]
struct BoundParam {
    name: String,
    descriptor: BindDescriptor,
    state: BindState,
    buffer: Option<OutputBuffer>,
}

/// All binds of one execution, validated and encoded.
///
/// Binds share fate: if any fails to bind or decode, the whole call fails
/// and no partial result is produced.
#[derive(Debug)]
pub struct BoundCall {
    params: Vec<BoundParam>,
    metadata: Vec<BindMetadata>,
    values: Vec<Option<Bytes>>,
}

impl BoundCall {
    /// Validate and encode every bind of `binds`.
    pub fn bind(binds: BindSet, config: &ConnectionConfig) -> Result<Self> {
        if binds.len() > MAX_BINDS {
            let name = binds.iter().nth(MAX_BINDS).map_or("", |(n, _)| n).to_string();
            return Err(Error::invalid_bind(
                name,
                format!("{} binds exceed the limit of {}", binds.len(), MAX_BINDS),
            ));
        }
        let mut call = Self {
            params: Vec::with_capacity(binds.len()),
            metadata: Vec::with_capacity(binds.len()),
            values: Vec::with_capacity(binds.len()),
        };

        for (name, descriptor) in binds {
            let name = normalize_name(&name).to_string();
            if name.trim().is_empty() {
                return Err(Error::invalid_bind(name, "bind name must not be empty"));
            }
            if call
                .params
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&name))
            {
                return Err(Error::invalid_bind(name, "bind name used more than once"));
            }

            let mut state = BindState::Unbound;
            let wire = encode(&name, &descriptor, config)?;
            let buffer = allocate_output_buffer(&name, &descriptor, config)?;
            state.advance(&name, BindState::Bound)?;

            call.metadata.push(wire.metadata);
            call.values.push(wire.value);
            call.params.push(BoundParam {
                name,
                descriptor,
                state,
                buffer,
            });
        }
        Ok(call)
    }

    /// Wire metadata in bind order.
    pub fn metadata(&self) -> &[BindMetadata] {
        &self.metadata
    }

    /// Encoded input values in bind order.
    pub fn values(&self) -> &[Option<Bytes>] {
        &self.values
    }

    /// Number of binds in the call.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Record that the backend call returned.
    pub fn executed(&mut self) -> Result<()> {
        for param in &mut self.params {
            param.state.advance(&param.name, BindState::Executed)?;
        }
        Ok(())
    }

    /// Decode returned values and hand them over to an `ExecutionResult`.
    ///
    /// `out_values` are keyed by zero-based bind position. Every OUT and
    /// IN/OUT bind must be present exactly once.
    pub fn complete(
        mut self,
        out_values: Vec<(u16, Option<Bytes>)>,
        rows_affected: u64,
    ) -> Result<ExecutionResult> {
        let mut returned: Vec<Option<Option<Bytes>>> = vec![None; self.params.len()];
        for (pos, value) in out_values {
            let param = self
                .params
                .get(pos as usize)
                .ok_or_else(|| Error::protocol(format!("Returned value for unknown bind position {}", pos)))?;
            if !param.descriptor.is_output() {
                return Err(Error::protocol(format!(
                    "Returned value for IN bind :{}",
                    param.name
                )));
            }
            if returned[pos as usize].replace(value).is_some() {
                return Err(Error::protocol(format!(
                    "Bind :{} returned more than once",
                    param.name
                )));
            }
        }

        let mut out_binds = Vec::new();
        for (param, wire) in self.params.iter_mut().zip(returned) {
            let value = match param.buffer.as_mut() {
                Some(buffer) => {
                    let wire = wire.ok_or_else(|| {
                        Error::protocol(format!("No value returned for bind :{}", param.name))
                    })?;
                    Some(decode(wire, &param.descriptor, buffer)?)
                }
                None => None,
            };
            param.state.advance(&param.name, BindState::Decoded)?;
            if let Some(value) = value {
                out_binds.push((param.name.clone(), value));
            }
        }

        for param in &mut self.params {
            param.buffer = None;
            param.state.advance(&param.name, BindState::Discarded)?;
        }

        Ok(ExecutionResult {
            out_binds,
            rows_affected,
        })
    }
}
