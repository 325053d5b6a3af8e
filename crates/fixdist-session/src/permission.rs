//! Location permission request and response checking
//!
//! The host answers a permission request with the request code, the list of
//! permissions it answered for and one grant result per permission. Anything
//! other than exactly our request code and exactly the fine-location
//! permission is an internal inconsistency. Each kind is logged separately,
//! but the user only ever sees one generic internal-error message.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Request code identifying our location permission request
pub const LOCATION_REQUEST_CODE: u32 = 1234;

/// Host permission needed for satellite positioning
pub const FINE_LOCATION_PERMISSION: &str = "android.permission.ACCESS_FINE_LOCATION";

/// A permission request sent to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    /// Code the host must echo back
    pub request_code: u32,
    /// Permission being asked for
    pub permission: String,
}

impl PermissionRequest {
    /// The fine-location request issued by every session
    pub fn fine_location() -> Self {
        Self {
            request_code: LOCATION_REQUEST_CODE,
            permission: FINE_LOCATION_PERMISSION.to_string(),
        }
    }

    /// Well-formed response granting this request
    pub fn grant(&self) -> PermissionResponse {
        self.respond(PermissionGrant::Granted)
    }

    /// Well-formed response denying this request
    pub fn deny(&self) -> PermissionResponse {
        self.respond(PermissionGrant::Denied)
    }

    fn respond(&self, grant: PermissionGrant) -> PermissionResponse {
        PermissionResponse {
            request_code: self.request_code,
            permissions: vec![self.permission.clone()],
            grants: vec![grant],
        }
    }
}

/// Per-permission result reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionGrant {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
}

/// The host's answer to a [`PermissionRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResponse {
    /// Echoed request code
    pub request_code: u32,
    /// Permissions the host answered for
    pub permissions: Vec<String>,
    /// Grant results, parallel to `permissions`
    pub grants: Vec<PermissionGrant>,
}

impl PermissionResponse {
    /// Check the response against the request it answers
    ///
    /// Every inconsistency is logged on its own before being returned.
    pub fn verdict(
        &self,
        request: &PermissionRequest,
    ) -> std::result::Result<PermissionGrant, PermissionInconsistency> {
        let inconsistency = if self.request_code != request.request_code {
            PermissionInconsistency::UnexpectedRequestCode {
                expected: request.request_code,
                got: self.request_code,
            }
        } else if self.permissions.len() != 1 {
            PermissionInconsistency::PermissionCount(self.permissions.len())
        } else if self.permissions[0] != request.permission {
            PermissionInconsistency::UnexpectedPermission(self.permissions[0].clone())
        } else if let Some(grant) = self.grants.first() {
            return Ok(*grant);
        } else {
            PermissionInconsistency::MissingGrant
        };

        error!(code = inconsistency.error_code(), "{}", inconsistency);
        Err(inconsistency)
    }
}

/// Ways a permission response can fail to match its request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionInconsistency {
    /// Response carries a different request code
    #[error("Unexpected request code: expected {expected}, got {got}")]
    UnexpectedRequestCode {
        /// Code we sent
        expected: u32,
        /// Code the host echoed
        got: u32,
    },

    /// Response does not answer exactly one permission
    #[error("Permission response has {0} entries, expected exactly one")]
    PermissionCount(usize),

    /// Response answers some other permission
    #[error("Unexpected permission in response: \"{0}\"")]
    UnexpectedPermission(String),

    /// Response has no grant result
    #[error("Permission response carries no grant result")]
    MissingGrant,
}

impl PermissionInconsistency {
    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            PermissionInconsistency::UnexpectedRequestCode { .. } => "UNEXPECTED_REQUEST_CODE",
            PermissionInconsistency::PermissionCount(_) => "PERMISSION_COUNT",
            PermissionInconsistency::UnexpectedPermission(_) => "UNEXPECTED_PERMISSION",
            PermissionInconsistency::MissingGrant => "MISSING_GRANT",
        }
    }
}
