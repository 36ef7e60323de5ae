//! Composite cache keys
//!
//! A [`CacheKey`] accumulates an ordered sequence of contributions (statement
//! id, row bounds, SQL text, bound parameters) into a single identity. The
//! running hash is multiplicative and order-sensitive: `[a, b]` and `[b, a]`
//! produce different keys.

use crate::cache::types::Value;
use crate::error::{CacheError, Result};
use std::fmt;
use std::hash::{Hash, Hasher};

const DEFAULT_MULTIPLIER: i32 = 37;
const DEFAULT_HASHCODE: i32 = 17;

/// Offset used when a read has no lower result-window bound
pub const NO_ROW_OFFSET: i64 = 0;

/// Limit used when a read has no upper result-window bound
pub const NO_ROW_LIMIT: i64 = i32::MAX as i64;

/// Multi-factor identity of a cached read
#[derive(Debug, Clone)]
pub struct CacheKey {
    multiplier: i32,
    hashcode: i32,
    checksum: i64,
    count: i32,
    parts: Vec<Value>,
    immutable: bool,
}

impl CacheKey {
    pub fn new() -> Self {
        Self {
            multiplier: DEFAULT_MULTIPLIER,
            hashcode: DEFAULT_HASHCODE,
            checksum: 0,
            count: 0,
            parts: Vec::new(),
            immutable: false,
        }
    }

    /// The reserved null key; every update on it fails with [`CacheError::ImmutableKey`]
    pub fn null_key() -> Self {
        Self {
            immutable: true,
            ..Self::new()
        }
    }

    /// Build a key from a sequence of contributions
    pub fn from_parts<I, V>(parts: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut key = Self::new();
        for part in parts {
            key.push(part.into());
        }
        key
    }

    /// Key for a mapped statement read.
    ///
    /// Contributions are, in order: statement id, offset, limit, SQL text,
    /// each bound parameter, then the environment id when one is set.
    pub fn for_statement(
        statement_id: &str,
        bounds: RowBounds,
        sql: &str,
        params: &[Value],
        environment: Option<&str>,
    ) -> Self {
        let mut key = Self::new();
        key.push(statement_id.into());
        key.push(bounds.offset.into());
        key.push(bounds.limit.into());
        key.push(sql.into());
        for param in params {
            key.push(param.clone());
        }
        if let Some(env) = environment {
            key.push(env.into());
        }
        key
    }

    /// Append one contribution to the key
    pub fn update(&mut self, value: impl Into<Value>) -> Result<()> {
        if self.immutable {
            return Err(CacheError::ImmutableKey);
        }
        self.push(value.into());
        Ok(())
    }

    /// Append every contribution in order
    pub fn update_all<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for value in values {
            self.update(value)?;
        }
        Ok(())
    }

    fn push(&mut self, value: Value) {
        let base = value.hash_code();

        self.count = self.count.wrapping_add(1);
        self.checksum = self.checksum.wrapping_add(base as i64);
        let contribution = base.wrapping_mul(self.count);

        self.hashcode = self
            .multiplier
            .wrapping_mul(self.hashcode)
            .wrapping_add(contribution);

        self.parts.push(value);
    }

    pub fn hashcode(&self) -> i32 {
        self.hashcode
    }

    pub fn checksum(&self) -> i64 {
        self.checksum
    }

    pub fn update_count(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[Value] {
        &self.parts
    }

    pub fn is_null_key(&self) -> bool {
        self.immutable
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.hashcode == other.hashcode
            && self.checksum == other.checksum
            && self.count == other.count
            && self.parts == other.parts
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hashcode);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hashcode, self.checksum)?;
        for part in &self.parts {
            write!(f, ":{}", part)?;
        }
        Ok(())
    }
}

/// Result-window bounds of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBounds {
    pub offset: i64,
    pub limit: i64,
}

impl RowBounds {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        Self {
            offset: NO_ROW_OFFSET,
            limit: NO_ROW_LIMIT,
        }
    }
}
