//! Schema-driven instruction argument codec
//!
//! Every instruction kind and every decoded account layout is described by a static [`Schema`]:
//! an optional prefix (Anchor discriminator or enum tag) followed by an ordered list of typed
//! fields. Records are encoded field by field in declared order with no padding, using the same
//! little-endian / length-prefixed layout the on-chain programs deserialize with borsh.
//!
//! The schema tables are the single place where client and program layouts meet, so a value
//! whose kind does not match its declared type is rejected with [`TokrError::SchemaMismatch`]
//! instead of being coerced.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::{TokrError, TokrResult};
use crate::instruction::{account_discriminator, instruction_discriminator};

/// Bytes written before the first field of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// No prefix, the payload starts with the first field
    None,
    /// Anchor method discriminator, `sha256("global:<method>")[..8]`
    Anchor(&'static str),
    /// Anchor account discriminator, `sha256("account:<Name>")[..8]`
    AnchorAccount(&'static str),
    /// Single byte enum tag (native programs with a borsh instruction enum)
    Tag(u8),
    /// Four byte little-endian enum index (bincode encoded programs such as the system program)
    Index(u32),
}

impl Prefix {
    /// The prefix bytes
    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Prefix::None => Vec::new(),
            Prefix::Anchor(method) => instruction_discriminator(method).to_vec(),
            Prefix::AnchorAccount(name) => account_discriminator(name).to_vec(),
            Prefix::Tag(tag) => vec![*tag],
            Prefix::Index(index) => index.to_le_bytes().to_vec(),
        }
    }
}

/// Declared type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I64,
    /// Raw 32-byte public key
    PublicKey,
    /// Fixed number of raw bytes, no length prefix
    FixedBytes(usize),
    /// UTF-8 string with a u32 length prefix
    String,
    /// Byte array with a u32 length prefix
    Bytes,
    /// One byte presence flag followed by the value when present
    Option(&'static FieldType),
    /// u32 element count followed by the elements
    Vec(&'static FieldType),
    /// Nested record, fields inlined in order
    Record(&'static Schema),
    /// One byte variant index followed by the variant's fields
    Enum(&'static [Variant]),
}

impl FieldType {
    /// Human readable name used in error messages
    pub fn describe(&self) -> String {
        match self {
            FieldType::Bool => "bool".to_string(),
            FieldType::U8 => "u8".to_string(),
            FieldType::U16 => "u16".to_string(),
            FieldType::U32 => "u32".to_string(),
            FieldType::U64 => "u64".to_string(),
            FieldType::I64 => "i64".to_string(),
            FieldType::PublicKey => "pubkey".to_string(),
            FieldType::FixedBytes(len) => format!("[u8; {}]", len),
            FieldType::String => "string".to_string(),
            FieldType::Bytes => "bytes".to_string(),
            FieldType::Option(inner) => format!("option<{}>", inner.describe()),
            FieldType::Vec(inner) => format!("vec<{}>", inner.describe()),
            FieldType::Record(schema) => format!("record {}", schema.name),
            FieldType::Enum(variants) => {
                let names: Vec<&str> = variants.iter().map(|v| v.name).collect();
                format!("enum {{{}}}", names.join(", "))
            }
        }
    }
}

/// A named, typed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

impl Field {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// An enum variant and the fields that follow its index byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Variant {
    pub const fn unit(name: &'static str) -> Self {
        Self { name, fields: &[] }
    }

    pub const fn new(name: &'static str, fields: &'static [Field]) -> Self {
        Self { name, fields }
    }
}

/// Fixed layout of an instruction payload or account
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub prefix: Prefix,
    pub fields: &'static [Field],
}

impl Schema {
    pub const fn new(name: &'static str, prefix: Prefix, fields: &'static [Field]) -> Self {
        Self {
            name,
            prefix,
            fields,
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A runtime value held by an [`ArgumentRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I64(i64),
    PublicKey(Pubkey),
    FixedBytes(Vec<u8>),
    String(String),
    Bytes(Vec<u8>),
    Option(Option<Box<Value>>),
    Vec(Vec<Value>),
    Record(ArgumentRecord),
    Enum { variant: u8, fields: ArgumentRecord },
}

impl Value {
    /// Name of the runtime kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I64(_) => "i64",
            Value::PublicKey(_) => "pubkey",
            Value::FixedBytes(_) => "fixed bytes",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Option(_) => "option",
            Value::Vec(_) => "vec",
            Value::Record(_) => "record",
            Value::Enum { .. } => "enum",
        }
    }

    /// A unit enum variant (status codes, tipping modes, ...)
    pub fn unit_variant(variant: u8) -> Self {
        Value::Enum {
            variant,
            fields: ArgumentRecord::new(),
        }
    }

    /// An enum variant carrying fields
    pub fn variant(variant: u8, fields: ArgumentRecord) -> Self {
        Value::Enum { variant, fields }
    }

    /// A list of values
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Vec(items.into_iter().map(Into::into).collect())
    }

    /// A length-prefixed byte array
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<Pubkey> for Value {
    fn from(v: Pubkey) -> Self {
        Value::PublicKey(v)
    }
}

impl From<&Pubkey> for Value {
    fn from(v: &Pubkey) -> Self {
        Value::PublicKey(*v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<ArgumentRecord> for Value {
    fn from(v: ArgumentRecord) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Option(v.map(|inner| Box::new(inner.into())))
    }
}

/// An ordered set of named values, encoded against a [`Schema`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentRecord {
    fields: Vec<(String, Value)>,
}

impl ArgumentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    fn require(&self, name: &str, expected: &str) -> TokrResult<&Value> {
        self.get(name).ok_or_else(|| TokrError::RecordField {
            field: name.to_string(),
            expected: expected.to_string(),
            found: "missing".to_string(),
        })
    }

    fn wrong_kind(name: &str, expected: &str, found: &Value) -> TokrError {
        TokrError::RecordField {
            field: name.to_string(),
            expected: expected.to_string(),
            found: found.kind().to_string(),
        }
    }

    pub fn bool(&self, name: &str) -> TokrResult<bool> {
        match self.require(name, "bool")? {
            Value::Bool(v) => Ok(*v),
            other => Err(Self::wrong_kind(name, "bool", other)),
        }
    }

    pub fn u8(&self, name: &str) -> TokrResult<u8> {
        match self.require(name, "u8")? {
            Value::U8(v) => Ok(*v),
            other => Err(Self::wrong_kind(name, "u8", other)),
        }
    }

    pub fn u16(&self, name: &str) -> TokrResult<u16> {
        match self.require(name, "u16")? {
            Value::U16(v) => Ok(*v),
            other => Err(Self::wrong_kind(name, "u16", other)),
        }
    }

    pub fn u32(&self, name: &str) -> TokrResult<u32> {
        match self.require(name, "u32")? {
            Value::U32(v) => Ok(*v),
            other => Err(Self::wrong_kind(name, "u32", other)),
        }
    }

    pub fn u64(&self, name: &str) -> TokrResult<u64> {
        match self.require(name, "u64")? {
            Value::U64(v) => Ok(*v),
            other => Err(Self::wrong_kind(name, "u64", other)),
        }
    }

    pub fn pubkey(&self, name: &str) -> TokrResult<Pubkey> {
        match self.require(name, "pubkey")? {
            Value::PublicKey(v) => Ok(*v),
            other => Err(Self::wrong_kind(name, "pubkey", other)),
        }
    }

    pub fn record(&self, name: &str) -> TokrResult<&ArgumentRecord> {
        match self.require(name, "record")? {
            Value::Record(v) => Ok(v),
            other => Err(Self::wrong_kind(name, "record", other)),
        }
    }

    pub fn list(&self, name: &str) -> TokrResult<&[Value]> {
        match self.require(name, "vec")? {
            Value::Vec(v) => Ok(v),
            other => Err(Self::wrong_kind(name, "vec", other)),
        }
    }

    /// Variant index of an enum field
    pub fn variant(&self, name: &str) -> TokrResult<(u8, &ArgumentRecord)> {
        match self.require(name, "enum")? {
            Value::Enum { variant, fields } => Ok((*variant, fields)),
            other => Err(Self::wrong_kind(name, "enum", other)),
        }
    }
}

fn mismatch(schema: &'static str, path: &str, expected: String, found: &str) -> TokrError {
    TokrError::SchemaMismatch {
        schema,
        field: path.to_string(),
        expected,
        found: found.to_string(),
    }
}

fn child_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Encode `record` with `schema`, prefix included
pub fn encode(schema: &Schema, record: &ArgumentRecord) -> TokrResult<Vec<u8>> {
    let mut data = schema.prefix.bytes();
    encode_fields(schema.name, "", schema.fields, record, &mut data)?;
    Ok(data)
}

fn encode_fields(
    schema: &'static str,
    path: &str,
    fields: &'static [Field],
    record: &ArgumentRecord,
    out: &mut Vec<u8>,
) -> TokrResult<()> {
    if let Some((name, value)) = record
        .iter()
        .find(|(name, _)| !fields.iter().any(|f| f.name == *name))
    {
        return Err(mismatch(
            schema,
            &child_path(path, name),
            "no such field".to_string(),
            value.kind(),
        ));
    }

    for field in fields {
        let field_path = child_path(path, field.name);
        let value = record
            .get(field.name)
            .ok_or_else(|| mismatch(schema, &field_path, field.ty.describe(), "missing"))?;
        encode_value(schema, &field_path, &field.ty, value, out)?;
    }
    Ok(())
}

fn encode_value(
    schema: &'static str,
    path: &str,
    ty: &FieldType,
    value: &Value,
    out: &mut Vec<u8>,
) -> TokrResult<()> {
    match (ty, value) {
        (FieldType::Bool, Value::Bool(v)) => v.serialize(out)?,
        (FieldType::U8, Value::U8(v)) => v.serialize(out)?,
        (FieldType::U16, Value::U16(v)) => v.serialize(out)?,
        (FieldType::U32, Value::U32(v)) => v.serialize(out)?,
        (FieldType::U64, Value::U64(v)) => v.serialize(out)?,
        (FieldType::I64, Value::I64(v)) => v.serialize(out)?,
        (FieldType::PublicKey, Value::PublicKey(key)) => out.extend_from_slice(key.as_ref()),
        (FieldType::FixedBytes(len), Value::FixedBytes(bytes)) => {
            if bytes.len() != *len {
                return Err(mismatch(
                    schema,
                    path,
                    ty.describe(),
                    &format!("[u8; {}]", bytes.len()),
                ));
            }
            out.extend_from_slice(bytes);
        }
        (FieldType::String, Value::String(s)) => s.serialize(out)?,
        (FieldType::Bytes, Value::Bytes(bytes)) => bytes.serialize(out)?,
        (FieldType::Option(_), Value::Option(None)) => out.push(0),
        (FieldType::Option(inner), Value::Option(Some(v))) => {
            out.push(1);
            encode_value(schema, path, inner, v, out)?;
        }
        (FieldType::Vec(inner), Value::Vec(items)) => {
            let len = u32::try_from(items.len())
                .map_err(|_| mismatch(schema, path, ty.describe(), "oversized vec"))?;
            len.serialize(out)?;
            for (i, item) in items.iter().enumerate() {
                encode_value(schema, &format!("{}[{}]", path, i), inner, item, out)?;
            }
        }
        (FieldType::Record(nested), Value::Record(record)) => {
            encode_fields(schema, path, nested.fields, record, out)?;
        }
        (FieldType::Enum(variants), Value::Enum { variant, fields }) => {
            let declared = variants.get(usize::from(*variant)).ok_or_else(|| {
                mismatch(
                    schema,
                    path,
                    ty.describe(),
                    &format!("variant index {}", variant),
                )
            })?;
            out.push(*variant);
            encode_fields(
                schema,
                &child_path(path, declared.name),
                declared.fields,
                fields,
                out,
            )?;
        }
        (ty, value) => return Err(mismatch(schema, path, ty.describe(), value.kind())),
    }
    Ok(())
}

/// Decode `data` with `schema`
///
/// The prefix must match. Bytes after the last field are ignored so account data with reserved
/// space or padding decodes; truncated data fails.
pub fn decode(schema: &Schema, data: &[u8]) -> TokrResult<ArgumentRecord> {
    let prefix = schema.prefix.bytes();
    if data.len() < prefix.len() || data[..prefix.len()] != prefix[..] {
        return Err(TokrError::DeserializationError {
            schema: schema.name,
            reason: "discriminator mismatch".to_string(),
        });
    }

    let mut reader = &data[prefix.len()..];
    decode_fields(schema.name, "", schema.fields, &mut reader)
}

fn read<T: BorshDeserialize>(
    schema: &'static str,
    path: &str,
    reader: &mut &[u8],
) -> TokrResult<T> {
    T::deserialize(reader).map_err(|e| TokrError::DeserializationError {
        schema,
        reason: format!("{}: {}", path, e),
    })
}

fn take<'a>(
    schema: &'static str,
    path: &str,
    reader: &mut &'a [u8],
    len: usize,
) -> TokrResult<&'a [u8]> {
    if reader.len() < len {
        return Err(TokrError::DeserializationError {
            schema,
            reason: format!("{}: need {} bytes, {} left", path, len, reader.len()),
        });
    }
    let (head, tail) = reader.split_at(len);
    *reader = tail;
    Ok(head)
}

fn decode_fields(
    schema: &'static str,
    path: &str,
    fields: &'static [Field],
    reader: &mut &[u8],
) -> TokrResult<ArgumentRecord> {
    let mut record = ArgumentRecord::new();
    for field in fields {
        let field_path = child_path(path, field.name);
        let value = decode_value(schema, &field_path, &field.ty, reader)?;
        record.insert(field.name, value);
    }
    Ok(record)
}

fn decode_value(
    schema: &'static str,
    path: &str,
    ty: &FieldType,
    reader: &mut &[u8],
) -> TokrResult<Value> {
    let value = match ty {
        FieldType::Bool => Value::Bool(read(schema, path, reader)?),
        FieldType::U8 => Value::U8(read(schema, path, reader)?),
        FieldType::U16 => Value::U16(read(schema, path, reader)?),
        FieldType::U32 => Value::U32(read(schema, path, reader)?),
        FieldType::U64 => Value::U64(read(schema, path, reader)?),
        FieldType::I64 => Value::I64(read(schema, path, reader)?),
        FieldType::PublicKey => {
            let bytes = take(schema, path, reader, 32)?;
            let mut key = [0u8; 32];
            key.copy_from_slice(bytes);
            Value::PublicKey(Pubkey::new_from_array(key))
        }
        FieldType::FixedBytes(len) => Value::FixedBytes(take(schema, path, reader, *len)?.to_vec()),
        FieldType::String => Value::String(read(schema, path, reader)?),
        FieldType::Bytes => Value::Bytes(read(schema, path, reader)?),
        FieldType::Option(inner) => match read::<u8>(schema, path, reader)? {
            0 => Value::Option(None),
            1 => Value::Option(Some(Box::new(decode_value(schema, path, inner, reader)?))),
            flag => {
                return Err(TokrError::DeserializationError {
                    schema,
                    reason: format!("{}: invalid option flag {}", path, flag),
                })
            }
        },
        FieldType::Vec(inner) => {
            let len: u32 = read(schema, path, reader)?;
            let mut items = Vec::new();
            for i in 0..len {
                items.push(decode_value(schema, &format!("{}[{}]", path, i), inner, reader)?);
            }
            Value::Vec(items)
        }
        FieldType::Record(nested) => Value::Record(decode_fields(schema, path, nested.fields, reader)?),
        FieldType::Enum(variants) => {
            let index: u8 = read(schema, path, reader)?;
            let declared = variants.get(usize::from(index)).ok_or_else(|| {
                mismatch(schema, path, ty.describe(), &format!("variant index {}", index))
            })?;
            let fields = decode_fields(
                schema,
                &child_path(path, declared.name),
                declared.fields,
                reader,
            )?;
            Value::Enum {
                variant: index,
                fields,
            }
        }
    };
    Ok(value)
}
