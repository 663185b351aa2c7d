//! # Command Tags
//!
//! The `command` key carries one of these tags. Decoding never fails: an
//! unrecognised integer becomes [`Command::Unknown`], which the dispatcher
//! logs and drops.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! commands {
    ($($variant:ident = $code:literal,)*) => {
        /// Protocol command.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Command {
            $($variant,)*
            /// Any tag this node does not understand.
            Unknown(i64),
        }

        impl Command {
            /// Every known command.
            pub const ALL: &'static [Command] = &[$(Command::$variant,)*];

            /// Map a wire value to a command.
            pub const fn from_code(code: i64) -> Self {
                match code {
                    $($code => Command::$variant,)*
                    other => Command::Unknown(other),
                }
            }

            /// Wire value.
            pub const fn code(self) -> i64 {
                match self {
                    $(Command::$variant => $code,)*
                    Command::Unknown(other) => other,
                }
            }
        }
    };
}

commands! {
    Register = 1,
    Unregister = 2,
    Message = 5,
    RequestSetupDomain = 10,
    ResponseSetupDomain = 11,
    RequestCloseDomain = 12,
    ResponseCloseDomain = 13,
    RequestGetStats = 14,
    ResponseGetStats = 15,
    RequestGetConfig = 16,
    ResponseGetConfig = 17,
    RequestGetDomainList = 18,
    ResponseGetDomainList = 19,
    RequestGetUsers = 20,
    ResponseGetUsers = 21,
    RequestGetNodeId = 22,
    ResponseGetNodeId = 23,
    RequestGetNotificationList = 24,
    ResponseGetNotificationList = 25,
    RequestInsertNotification = 26,
    CancelInsertNotification = 27,
    NotifyInserted = 28,
    RequestGetStoredMessages = 29,
    RequestGatherSignature = 30,
    ResponseGatherSignature = 31,
    RequestSignature = 32,
    ResponseSignature = 33,
    RequestInsert = 34,
    ResponseInsert = 35,
    RequestSearchTransaction = 36,
    ResponseSearchTransaction = 37,
    RequestSearchWithConditions = 38,
    ResponseSearchWithConditions = 39,
    RequestTraverseTransactions = 40,
    ResponseTraverseTransactions = 41,
    RequestCountTransactions = 42,
    ResponseCountTransactions = 43,
}

impl Command {
    /// The response command paired with a request, if the request has one.
    pub const fn response(self) -> Option<Command> {
        use Command::*;
        match self {
            RequestSetupDomain => Some(ResponseSetupDomain),
            RequestCloseDomain => Some(ResponseCloseDomain),
            RequestGetStats => Some(ResponseGetStats),
            RequestGetConfig => Some(ResponseGetConfig),
            RequestGetDomainList => Some(ResponseGetDomainList),
            RequestGetUsers => Some(ResponseGetUsers),
            RequestGetNodeId => Some(ResponseGetNodeId),
            RequestGetNotificationList => Some(ResponseGetNotificationList),
            RequestGatherSignature => Some(ResponseGatherSignature),
            RequestSignature => Some(ResponseSignature),
            RequestInsert => Some(ResponseInsert),
            RequestSearchTransaction => Some(ResponseSearchTransaction),
            RequestSearchWithConditions => Some(ResponseSearchWithConditions),
            RequestTraverseTransactions => Some(ResponseTraverseTransactions),
            RequestCountTransactions => Some(ResponseCountTransactions),
            // Relayed signature responses surface as gather responses.
            ResponseSignature => Some(ResponseGatherSignature),
            _ => None,
        }
    }

    /// Command to put in a reply to `self`: the paired response, or `self`.
    pub const fn reply_command(self) -> Command {
        match self.response() {
            Some(cmd) => cmd,
            None => self,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Unknown(code) => write!(f, "Unknown({code})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}
