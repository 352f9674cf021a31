//! SAS verification transactions as seen from the screen: the handle the SDK
//! hands out, its states and cancel codes, and the bus the SDK announces
//! state changes on.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Identifier of a verification transaction.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap an SDK transaction id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// States of a short authentication string (SAS) verification transaction.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum SasState {
    /// State not known to the SDK.
    #[default]
    Unknown,

    /// An incoming request is waiting for the user to accept it.
    IncomingShowAccept,

    /// An outgoing request is waiting for the other party to accept it.
    OutgoingWaitForPartnerToAccept,

    /// Waiting for the other party's key.
    WaitForPartnerKey,

    /// Both sides can now compare the short authentication string.
    ShowSas,

    /// Waiting for the other party to confirm the comparison.
    WaitForPartnerToConfirm,

    /// The device has been verified.
    Verified,

    /// The other party (or the SDK) cancelled the transaction.
    Cancelled,

    /// This device cancelled the transaction.
    CancelledByMe,

    /// The transaction failed.
    Error,
}

/// Reason a verification transaction was cancelled.
///
/// Serialized as the Matrix cancel code string, e.g. `"m.user"`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum CancelCode {
    /// The user cancelled the verification.
    User,
    /// The verification process timed out.
    Timeout,
    /// The device does not know about the transaction.
    UnknownTransaction,
    /// The device cannot use any of the offered methods.
    UnknownMethod,
    /// The device received an unexpected message.
    UnexpectedMessage,
    /// The keys did not match.
    KeyMismatch,
    /// The expected user did not match the one being verified.
    UserMismatch,
    /// The device received an invalid message.
    InvalidMessage,
    /// The request was accepted by another of the user's devices.
    Accepted,
    /// The hash commitment did not match.
    MismatchedCommitment,
    /// The short authentication strings did not match.
    MismatchedSas,
    /// Any other code.
    Other(String),
}

impl CancelCode {
    /// The Matrix cancel code string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "m.user",
            Self::Timeout => "m.timeout",
            Self::UnknownTransaction => "m.unknown_transaction",
            Self::UnknownMethod => "m.unknown_method",
            Self::UnexpectedMessage => "m.unexpected_message",
            Self::KeyMismatch => "m.key_mismatch",
            Self::UserMismatch => "m.user_mismatch",
            Self::InvalidMessage => "m.invalid_message",
            Self::Accepted => "m.accepted",
            Self::MismatchedCommitment => "m.mismatched_commitment",
            Self::MismatchedSas => "m.mismatched_sas",
            Self::Other(code) => code,
        }
    }

    /// Default English description of the code.
    pub const fn human_readable(&self) -> &'static str {
        match self {
            Self::User => "The user cancelled the verification.",
            Self::Timeout => "The verification process timed out.",
            Self::UnknownTransaction => "The device does not know about that transaction.",
            Self::UnknownMethod => "The device can't agree on a key agreement, hash, MAC, or SAS method.",
            Self::UnexpectedMessage => "The device received an unexpected message.",
            Self::KeyMismatch => "The key was not verified.",
            Self::UserMismatch => "The expected user did not match the user verified.",
            Self::InvalidMessage => "The message received was invalid.",
            Self::Accepted => "The request was accepted by a different device.",
            Self::MismatchedCommitment => "The hash commitment did not match.",
            Self::MismatchedSas => "The SAS did not match.",
            Self::Other(_) => "The verification was cancelled.",
        }
    }
}

impl From<&str> for CancelCode {
    fn from(code: &str) -> Self {
        match code {
            "m.user" => Self::User,
            "m.timeout" => Self::Timeout,
            "m.unknown_transaction" => Self::UnknownTransaction,
            "m.unknown_method" => Self::UnknownMethod,
            "m.unexpected_message" => Self::UnexpectedMessage,
            "m.key_mismatch" => Self::KeyMismatch,
            "m.user_mismatch" => Self::UserMismatch,
            "m.invalid_message" => Self::InvalidMessage,
            "m.accepted" => Self::Accepted,
            "m.mismatched_commitment" => Self::MismatchedCommitment,
            "m.mismatched_sas" => Self::MismatchedSas,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for CancelCode {
    fn from(code: String) -> Self {
        Self::from(code.as_str())
    }
}

impl From<CancelCode> for String {
    fn from(code: CancelCode) -> Self {
        match code {
            CancelCode::Other(code) => code,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for CancelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming SAS verification transaction, owned by the SDK.
pub trait IncomingSasTransaction: Send + Sync {
    /// The transaction's id.
    fn id(&self) -> TransactionId;

    /// Device id of the device that started the verification.
    fn other_device_id(&self) -> String;

    /// Current state of the transaction.
    fn state(&self) -> SasState;

    /// Accept the incoming request.
    fn accept(&self);

    /// Cancel the transaction with the given reason.
    fn cancel(&self, code: CancelCode);
}

/// A state change announced by the SDK for one transaction.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TransactionChanged {
    /// Transaction that changed.
    pub transaction_id: TransactionId,

    /// Its new state.
    pub state: SasState,

    /// Reason code, when the new state is a cancellation and the SDK knows
    /// why.
    pub reason_cancel_code: Option<CancelCode>,
}

impl TransactionChanged {
    /// Snapshot of a transaction's current state. The reason code is supplied
    /// separately since the transaction handle does not expose it.
    pub fn snapshot(
        transaction: &Arc<dyn IncomingSasTransaction>, reason_cancel_code: Option<CancelCode>,
    ) -> Self {
        Self {
            transaction_id: transaction.id(),
            state: transaction.state(),
            reason_cancel_code,
        }
    }
}

/// The channel the SDK announces transaction state changes on. It is shared
/// by all transactions, so subscribers must filter by transaction id.
#[derive(Clone, Debug)]
pub struct VerificationEvents {
    sender: broadcast::Sender<TransactionChanged>,
}

impl VerificationEvents {
    /// Create a bus that buffers up to `capacity` changes per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announce a change. Returns the number of subscribers it reached.
    pub fn notify(&self, change: TransactionChanged) -> usize {
        self.sender.send(change).unwrap_or(0)
    }

    /// Listen for changes to any transaction.
    pub fn subscribe(&self) -> broadcast::Receiver<TransactionChanged> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for VerificationEvents {
    fn default() -> Self {
        Self::new(crate::Config::default().verification_bus_capacity)
    }
}
