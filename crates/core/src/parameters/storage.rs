//! Parameter Storage Types
//!
//! Provides core parameter types and the `ParameterStore` for configuration management.
//! Loading from files is in the runtime crate.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use super::error::ParameterError;
use bitflags::bitflags;

bitflags! {
    /// Parameter flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ParamFlags: u8 {
        /// Parameter is read-only (cannot be modified after registration)
        const READ_ONLY = 0b00000001;
    }
}

/// Parameter value types
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// String parameter
    String(String),
    /// Boolean parameter
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit floating point
    Float(f64),
}

impl ParamValue {
    /// Type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: ParamValue,
    flags: ParamFlags,
}

/// Parameter store for configuration management
///
/// Stores parameters as key-value pairs with flags, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    parameters: BTreeMap<String, Entry>,
}

impl ParameterStore {
    /// Create a new empty parameter store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get parameter value
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name).map(|entry| &entry.value)
    }

    /// Check if a parameter is defined
    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Set an existing parameter value
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        let entry = self
            .parameters
            .get_mut(name)
            .ok_or_else(|| ParameterError::InvalidConfig(alloc::format!("unknown parameter {name}")))?;

        if entry.flags.contains(ParamFlags::READ_ONLY) {
            return Err(ParameterError::ReadOnly(name.to_string()));
        }

        entry.value = value;
        Ok(())
    }

    /// Register a new parameter with default value and flags
    ///
    /// If the parameter already exists, this is a no-op (idempotent).
    pub fn register(
        &mut self,
        name: &str,
        default_value: ParamValue,
        flags: ParamFlags,
    ) -> Result<(), ParameterError> {
        if name.is_empty() {
            return Err(ParameterError::InvalidConfig("empty parameter name".to_string()));
        }

        self.parameters
            .entry(name.to_string())
            .or_insert(Entry {
                value: default_value,
                flags,
            });
        Ok(())
    }

    /// Define or overwrite a parameter
    ///
    /// Registers unknown names with empty flags, otherwise behaves like [`set`](Self::set).
    pub fn insert(&mut self, name: &str, value: ParamValue) -> Result<(), ParameterError> {
        if self.contains(name) {
            self.set(name, value)
        } else {
            self.register(name, value, ParamFlags::empty())
        }
    }

    /// Read a required floating point parameter
    ///
    /// Integer values are widened.
    pub fn get_float(&self, name: &str) -> Result<f64, ParameterError> {
        match self.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Int(v)) => Ok(f64::from(*v)),
            Some(other) => Err(ParameterError::TypeMismatch {
                name: name.to_string(),
                expected: "float",
                found: other.type_name(),
            }),
            None => Err(ParameterError::Missing(name.to_string())),
        }
    }

    /// Read a required string parameter
    pub fn get_string(&self, name: &str) -> Result<&str, ParameterError> {
        match self.get(name) {
            Some(ParamValue::String(v)) => Ok(v.as_str()),
            Some(other) => Err(ParameterError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
                found: other.type_name(),
            }),
            None => Err(ParameterError::Missing(name.to_string())),
        }
    }

    /// Number of defined parameters
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}
