//! Resource names the dashboard checks permissions against.
//!
//! These are the keys of the effective-permissions matrix. The backend
//! grants a superuser full access to exactly this list.

pub const DASHBOARD: &str = "Dashboard";
pub const PROFILE: &str = "Profile";
pub const ENQUIRIES: &str = "enquiries";
pub const NEW_ENQUIRIES: &str = "new_enquiries";
pub const SCHEDULED_SURVEYS: &str = "scheduled_surveys";
pub const SURVEY_SUMMARY: &str = "survey_summary";
pub const QUOTATION: &str = "quotation";
pub const BOOKING: &str = "booking";
pub const INVENTORY: &str = "inventory";
pub const PRICING: &str = "pricing";
pub const LOCAL_MOVE: &str = "local_move";
pub const INTERNATIONAL_MOVE: &str = "international_move";
pub const TYPES: &str = "types";
pub const UNITS: &str = "units";
pub const CURRENCY: &str = "currency";
pub const TAX: &str = "tax";
pub const HANDYMAN: &str = "handyman";
pub const MANPOWER: &str = "manpower";
pub const ROOM: &str = "room";
pub const ADDITIONAL_SERVICES: &str = "additional-services";
pub const LABOURS: &str = "labours";
pub const MATERIALS: &str = "materials";
pub const USERS: &str = "users";
pub const ROLES: &str = "roles";
pub const PERMISSIONS: &str = "permissions";

/// Sidebar group key; not part of the superuser grant list.
pub const ADDITIONAL_SETTINGS: &str = "additional_settings";

pub const ALL: &[&str] = &[
    DASHBOARD,
    PROFILE,
    ENQUIRIES,
    NEW_ENQUIRIES,
    SCHEDULED_SURVEYS,
    SURVEY_SUMMARY,
    QUOTATION,
    BOOKING,
    INVENTORY,
    PRICING,
    LOCAL_MOVE,
    INTERNATIONAL_MOVE,
    TYPES,
    UNITS,
    CURRENCY,
    TAX,
    HANDYMAN,
    MANPOWER,
    ROOM,
    ADDITIONAL_SERVICES,
    LABOURS,
    MATERIALS,
    USERS,
    ROLES,
    PERMISSIONS,
];

pub fn is_known(resource: &str) -> bool {
    ALL.contains(&resource)
}
