/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible without a validated session: entry flows plus the
/// session/gate endpoints, which must answer anonymous callers.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated session.
pub mod authenticated;

/// Routes restricted exclusively to accounts with the 'admin' role.
/// Implements mandatory authorization checks.
pub mod admin;
