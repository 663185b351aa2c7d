//! # Message
//!
//! A decoded protocol record: an ordered mapping from [`KeyType`] to
//! [`Value`]. Messages are created per frame and discarded after handling.

use crate::commands::Command;
use crate::entities::Identifier;
use crate::errors::IdError;
use crate::keys::{KeyType, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value stored under a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Bytes(Vec<u8>),
    Text(String),
    Int(i64),
    Bool(bool),
    List(Vec<Vec<u8>>),
    Tree(Vec<Vec<Vec<u8>>>),
}

impl Value {
    /// Kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Text(_) => ValueKind::Text,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::List(_) => ValueKind::List,
            Value::Tree(_) => ValueKind::Tree,
        }
    }
}

/// Keyed protocol record.
///
/// Setters do not check the key's declared kind; the codec rejects a
/// mismatched entry when encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    entries: BTreeMap<KeyType, Value>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a message with its `command` key set.
    pub fn with_command(command: Command) -> Self {
        let mut msg = Self::new();
        msg.set_command(command);
        msg
    }

    // =========================================================================
    // SETTERS
    // =========================================================================

    pub fn insert(&mut self, key: KeyType, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn set_command(&mut self, command: Command) -> &mut Self {
        self.set_int(KeyType::Command, command.code())
    }

    pub fn set_bytes(&mut self, key: KeyType, value: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.insert(key, Value::Bytes(value.into()));
        self
    }

    pub fn set_id<T: Identifier>(&mut self, key: KeyType, id: &T) -> &mut Self {
        self.set_bytes(key, id.as_bytes().to_vec())
    }

    pub fn set_text(&mut self, key: KeyType, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key, Value::Text(value.into()));
        self
    }

    pub fn set_int(&mut self, key: KeyType, value: i64) -> &mut Self {
        self.entries.insert(key, Value::Int(value));
        self
    }

    pub fn set_bool(&mut self, key: KeyType, value: bool) -> &mut Self {
        self.entries.insert(key, Value::Bool(value));
        self
    }

    pub fn set_list(&mut self, key: KeyType, items: Vec<Vec<u8>>) -> &mut Self {
        self.entries.insert(key, Value::List(items));
        self
    }

    pub fn set_tree(&mut self, key: KeyType, layers: Vec<Vec<Vec<u8>>>) -> &mut Self {
        self.entries.insert(key, Value::Tree(layers));
        self
    }

    pub fn remove(&mut self, key: KeyType) -> Option<Value> {
        self.entries.remove(&key)
    }

    // =========================================================================
    // GETTERS
    // =========================================================================

    pub fn get(&self, key: KeyType) -> Option<&Value> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: KeyType) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyType, &Value)> {
        self.entries.iter()
    }

    /// The command tag, if present.
    pub fn command(&self) -> Option<Command> {
        self.int(KeyType::Command).map(Command::from_code)
    }

    pub fn bytes(&self, key: KeyType) -> Option<&[u8]> {
        match self.entries.get(&key) {
            Some(Value::Bytes(b)) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn text(&self, key: KeyType) -> Option<&str> {
        match self.entries.get(&key) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn int(&self, key: KeyType) -> Option<i64> {
        match self.entries.get(&key) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn bool(&self, key: KeyType) -> Option<bool> {
        match self.entries.get(&key) {
            Some(Value::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Boolean flag; absent means `false`.
    pub fn flag(&self, key: KeyType) -> bool {
        self.bool(key).unwrap_or(false)
    }

    pub fn list(&self, key: KeyType) -> Option<&[Vec<u8>]> {
        match self.entries.get(&key) {
            Some(Value::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn tree(&self, key: KeyType) -> Option<&[Vec<Vec<u8>>]> {
        match self.entries.get(&key) {
            Some(Value::Tree(layers)) => Some(layers.as_slice()),
            _ => None,
        }
    }

    /// Parse an identifier stored under `key`.
    ///
    /// `Ok(None)` when the key is absent, `Err` when present with the wrong
    /// length.
    pub fn id<T: Identifier>(&self, key: KeyType) -> Result<Option<T>, IdError> {
        self.bytes(key).map(T::from_slice).transpose()
    }

    /// First key of `required` that is absent.
    pub fn first_missing(&self, required: &[KeyType]) -> Option<KeyType> {
        required.iter().copied().find(|key| !self.contains(*key))
    }
}

impl FromIterator<(KeyType, Value)> for Message {
    fn from_iter<I: IntoIterator<Item = (KeyType, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DomainId, UserId};

    #[test]
    fn test_typed_getters() {
        let mut msg = Message::with_command(Command::RequestInsert);
        msg.set_bytes(KeyType::TransactionData, vec![1, 2, 3])
            .set_bool(KeyType::IsAnycast, true)
            .set_int(KeyType::Count, 4);

        assert_eq!(msg.command(), Some(Command::RequestInsert));
        assert_eq!(msg.bytes(KeyType::TransactionData), Some(&[1u8, 2, 3][..]));
        assert!(msg.flag(KeyType::IsAnycast));
        assert!(!msg.flag(KeyType::RequestAsync));
        assert_eq!(msg.int(KeyType::Count), Some(4));
        // Wrong accessor for the stored kind yields nothing.
        assert_eq!(msg.text(KeyType::Count), None);
    }

    #[test]
    fn test_id_parsing() {
        let mut msg = Message::new();
        let domain = DomainId::new([9; 32]);
        msg.set_id(KeyType::DomainId, &domain);
        msg.set_bytes(KeyType::SourceUserId, vec![1; 5]);

        assert_eq!(msg.id::<DomainId>(KeyType::DomainId), Ok(Some(domain)));
        assert!(msg.id::<UserId>(KeyType::SourceUserId).is_err());
        assert_eq!(msg.id::<UserId>(KeyType::DestinationUserId), Ok(None));
    }

    #[test]
    fn test_first_missing() {
        let mut msg = Message::with_command(Command::Register);
        msg.set_bytes(KeyType::SourceUserId, vec![0; 32]);
        assert_eq!(
            msg.first_missing(&[KeyType::Command, KeyType::SourceUserId]),
            None
        );
        assert_eq!(
            msg.first_missing(&[KeyType::Command, KeyType::TransactionId]),
            Some(KeyType::TransactionId)
        );
    }
}
