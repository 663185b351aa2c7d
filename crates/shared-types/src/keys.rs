//! # Message Keys
//!
//! The closed set of keys a [`crate::Message`] may carry. Each key has a
//! fixed wire code and a declared [`ValueKind`]; the codec uses the kind to
//! decide how the value bytes are laid out.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a value stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Opaque byte string.
    Bytes,
    /// UTF-8 text (JSON documents travel as text).
    Text,
    /// Signed 64-bit integer.
    Int,
    /// Single-byte boolean.
    Bool,
    /// List of byte strings.
    List,
    /// List of lists of byte strings (layered traversal output).
    Tree,
}

macro_rules! key_types {
    ($($variant:ident = $code:literal, $kind:ident, $name:literal;)*) => {
        /// Typed message key.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum KeyType {
            $($variant,)*
        }

        impl KeyType {
            /// Every key, in wire-code order.
            pub const ALL: &'static [KeyType] = &[$(KeyType::$variant,)*];

            /// Wire code.
            pub const fn code(self) -> u32 {
                match self {
                    $(KeyType::$variant => $code,)*
                }
            }

            /// Look up a key by wire code. Unknown codes yield `None`.
            pub const fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(KeyType::$variant),)*
                    _ => None,
                }
            }

            /// Declared value kind.
            pub const fn kind(self) -> ValueKind {
                match self {
                    $(KeyType::$variant => ValueKind::$kind,)*
                }
            }

            /// Snake-case protocol name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(KeyType::$variant => $name,)*
                }
            }
        }
    };
}

key_types! {
    Status = 1, Int, "status";
    Reason = 2, Text, "reason";
    Result = 3, Bool, "result";
    Command = 4, Int, "command";
    DomainId = 5, Bytes, "domain_id";
    SourceUserId = 6, Bytes, "source_user_id";
    DestinationUserId = 7, Bytes, "destination_user_id";
    DestinationUserIds = 8, List, "destination_user_ids";
    QueryId = 9, Bytes, "query_id";
    TransactionId = 10, Bytes, "transaction_id";
    TransactionData = 11, Bytes, "transaction_data";
    CompromisedTransactionData = 12, Bytes, "compromised_transaction_data";
    Transactions = 13, List, "transactions";
    CompromisedTransactions = 14, List, "compromised_transactions";
    AssetGroupId = 15, Bytes, "asset_group_id";
    AssetGroupIds = 16, List, "asset_group_ids";
    AssetId = 17, Bytes, "asset_id";
    UserId = 18, Bytes, "user_id";
    Count = 19, Int, "count";
    TransactionTree = 20, Tree, "transaction_tree";
    AllIncluded = 21, Bool, "all_included";
    Signature = 22, Bytes, "signature";
    TransactionDataFormat = 23, Int, "transaction_data_format";
    RefIndex = 24, Int, "ref_index";
    Hint = 25, Bytes, "hint";
    Message = 26, Bytes, "message";
    IsAnycast = 27, Bool, "is_anycast";
    AnycastTtl = 28, Int, "anycast_ttl";
    OnMultinodes = 29, Bool, "on_multinodes";
    RequestAsync = 30, Bool, "request_async";
    Stats = 31, Text, "stats";
    BbcConfiguration = 32, Text, "bbc_configuration";
    DomainList = 33, Bytes, "domain_list";
    UserList = 34, Bytes, "user_list";
    NodeId = 35, Bytes, "node_id";
    NotificationList = 36, Bytes, "notification_list";
    Direction = 37, Int, "direction";
    HopCount = 38, Int, "hop_count";
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique_and_reversible() {
        let mut seen = std::collections::HashSet::new();
        for key in KeyType::ALL {
            assert!(seen.insert(key.code()), "duplicate code for {key}");
            assert_eq!(KeyType::from_code(key.code()), Some(*key));
        }
        assert_eq!(KeyType::ALL.len(), 38);
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(KeyType::from_code(0), None);
        assert_eq!(KeyType::from_code(9999), None);
    }

    #[test]
    fn test_declared_kinds() {
        assert_eq!(KeyType::Command.kind(), ValueKind::Int);
        assert_eq!(KeyType::DestinationUserIds.kind(), ValueKind::List);
        assert_eq!(KeyType::TransactionTree.kind(), ValueKind::Tree);
        assert_eq!(KeyType::Stats.kind(), ValueKind::Text);
        assert_eq!(KeyType::AllIncluded.kind(), ValueKind::Bool);
    }
}
