//! Navigation menu filtered by permission.
//!
//! A leaf is shown when its resource is permitted. A group is shown when
//! any of its children is permitted or the group's own resource is, and
//! it keeps only the permitted children.

use serde::Serialize;
use shared::{Action, resources};

use crate::permission::PermissionGate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    /// Route path; groups have none.
    pub to: Option<String>,
    pub page: String,
    pub action: Action,
    pub sub_items: Vec<MenuItem>,
}

impl MenuItem {
    pub fn link(id: &str, label: &str, to: &str, page: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            to: Some(to.to_string()),
            page: page.to_string(),
            action: Action::View,
            sub_items: Vec::new(),
        }
    }

    pub fn group(id: &str, label: &str, page: &str, sub_items: Vec<MenuItem>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            to: None,
            page: page.to_string(),
            action: Action::View,
            sub_items,
        }
    }

    /// Groups have no route of their own, even when every child is filtered out.
    pub fn is_group(&self) -> bool {
        self.to.is_none()
    }
}

/// Filter `items` down to what the current user may see.
pub fn visible(gate: &PermissionGate, items: &[MenuItem]) -> Vec<MenuItem> {
    items
        .iter()
        .filter_map(|item| {
            if !item.is_group() {
                return gate.has_permission(&item.page, item.action).then(|| item.clone());
            }

            let sub_items: Vec<MenuItem> = item
                .sub_items
                .iter()
                .filter(|sub| gate.has_permission(&sub.page, sub.action))
                .cloned()
                .collect();

            if sub_items.is_empty() && !gate.has_permission(&item.page, item.action) {
                return None;
            }
            Some(MenuItem {
                sub_items,
                ..item.clone()
            })
        })
        .collect()
}

/// Full dashboard sidebar
pub fn dashboard() -> Vec<MenuItem> {
    use resources::*;

    vec![
        MenuItem::link("dashboard", "Dashboard", "/", DASHBOARD),
        MenuItem::link("enquiries", "Enquiries", "/enquiries", ENQUIRIES),
        MenuItem::link("new-enquiries", "New Assigned", "/new-enquiries", NEW_ENQUIRIES),
        MenuItem::link("scheduled-surveys", "Scheduled Surveys", "/scheduled-surveys", SCHEDULED_SURVEYS),
        MenuItem::link("survey_summary", "Survey Summary", "/survey/survey-summary", SURVEY_SUMMARY),
        MenuItem::link("quotation", "Quotation", "/quotation-list", QUOTATION),
        MenuItem::link("booking", "Book Move", "/booking-list", BOOKING),
        MenuItem::link("inventory", "Inventory", "/inventory", INVENTORY),
        MenuItem::group(
            "pricing",
            "Pricing",
            PRICING,
            vec![
                MenuItem::link("local-move", "Local Move", "/pricing/local-move", LOCAL_MOVE),
                MenuItem::link(
                    "international-move",
                    "International Move",
                    "/pricing/international-move",
                    INTERNATIONAL_MOVE,
                ),
            ],
        ),
        MenuItem::group(
            "additional-settings",
            "Additional Settings",
            ADDITIONAL_SETTINGS,
            vec![
                MenuItem::link("types", "Types", "/additional-settings/types", TYPES),
                MenuItem::link("units", "Units", "/additional-settings/units", UNITS),
                MenuItem::link("currency", "Currency", "/additional-settings/currency", CURRENCY),
                MenuItem::link("tax", "Tax", "/additional-settings/tax", TAX),
                MenuItem::link("handyman", "Handyman", "/additional-settings/handyman", HANDYMAN),
                MenuItem::link("manpower", "Manpower", "/additional-settings/manpower", MANPOWER),
                MenuItem::link("room", "Room", "/additional-settings/room", ROOM),
                MenuItem::link(
                    "additional-services",
                    "Additional Services",
                    "/additional-settings/additional-services",
                    ADDITIONAL_SERVICES,
                ),
                MenuItem::link("labours", "Labours", "/additional-settings/labours", LABOURS),
                MenuItem::link("materials", "Materials", "/additional-settings/materials", MATERIALS),
            ],
        ),
        MenuItem::group(
            "user-roles",
            "User Roles",
            USERS,
            vec![
                MenuItem::link("roles", "Roles", "/user-roles/roles", ROLES),
                MenuItem::link("users", "Users", "/user-roles/users", USERS),
                MenuItem::link("permissions", "Permissions", "/user-roles/permissions", PERMISSIONS),
            ],
        ),
        MenuItem::link("profile", "Profile", "/profile", PROFILE),
    ]
}

/// Subset shown on narrow screens
pub fn compact() -> Vec<MenuItem> {
    const IDS: [&str; 4] = ["pricing", "additional-settings", "user-roles", "profile"];
    dashboard()
        .into_iter()
        .filter(|item| IDS.contains(&item.id.as_str()))
        .collect()
}
