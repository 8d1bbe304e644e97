//! Permission markers for [`Authorized`](super::middleware::Authorized).

use super::middleware::RequiredPermission;

macro_rules! permissions {
    ($($(#[$meta:meta])* $marker:ident => $name:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $marker;

            impl RequiredPermission for $marker {
                const NAME: &'static str = $name;
            }
        )*
    };
}

permissions! {
    /// Read finance reports.
    ReportsFinance => "reports:finance";
    /// Read operations reports.
    ReportsOperations => "reports:operations";
    /// List support tickets.
    SupportTicketsView => "support:tickets:view";
    /// Open support tickets.
    SupportTicketsCreate => "support:tickets:create";
    /// Upload a profile picture.
    ProfilePicture => "files:profile-picture";
    /// Inspect roles and grants.
    AdminRoles => "admin:roles";
}
