//! Platform store status codes.
//!
//! Codes follow the Security framework `OSStatus` numbering so that values
//! reported by a real keychain and by the in-process backends line up.

use std::fmt;

/// Result status reported by a credential store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    /// No error.
    pub const SUCCESS: Status = Status(0);
    /// One or more parameters passed to the store were not valid.
    pub const PARAM: Status = Status(-50);
    /// An I/O error occurred inside the store.
    pub const IO: Status = Status(-36);
    /// The user name or passphrase was not correct.
    pub const AUTH_FAILED: Status = Status(-25293);
    /// The specified item already exists in the keychain.
    pub const DUPLICATE_ITEM: Status = Status(-25299);
    /// The specified item could not be found in the keychain.
    pub const ITEM_NOT_FOUND: Status = Status(-25300);
    /// User interaction is not allowed (e.g. device locked).
    pub const INTERACTION_NOT_ALLOWED: Status = Status(-25308);
    /// Unable to decode the provided data.
    pub const DECODE: Status = Status(-26275);
    /// A required entitlement (access group) is missing.
    pub const MISSING_ENTITLEMENT: Status = Status(-34018);

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    pub fn is_not_found(self) -> bool {
        self == Self::ITEM_NOT_FOUND
    }

    /// Built-in description for the well-known codes.
    ///
    /// Backends without their own message lookup use this table to answer
    /// [`CredentialStorePort::error_message`](crate::ports::CredentialStorePort::error_message).
    pub fn description(self) -> Option<&'static str> {
        let message = match self {
            Self::SUCCESS => "No error.",
            Self::PARAM => "One or more parameters passed to a function were not valid.",
            Self::IO => "I/O error.",
            Self::AUTH_FAILED => "The user name or passphrase you entered is not correct.",
            Self::DUPLICATE_ITEM => "The specified item already exists in the keychain.",
            Self::ITEM_NOT_FOUND => "The specified item could not be found in the keychain.",
            Self::INTERACTION_NOT_ALLOWED => "User interaction is not allowed.",
            Self::DECODE => "Unable to decode the provided data.",
            Self::MISSING_ENTITLEMENT => {
                "A required entitlement isn't present."
            }
            _ => return None,
        };
        Some(message)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OSStatus {}", self.0)
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Status(code)
    }
}
