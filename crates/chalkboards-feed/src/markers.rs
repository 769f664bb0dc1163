//! Map marker descriptors and the link-outs attached to them.

use chalkboards_core::SpecialKind;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::format::{pretty_window, status_icon, ICON_FLASH};
use crate::group::RestaurantGroup;

/// Characters `encodeURIComponent` leaves alone, removed from the escape set.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";
const MAX_LINES_PER_KIND: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerDescriptor {
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub address: String,
    pub lines: Vec<String>,
    pub maps_url: String,
    pub report_url: String,
}

/// What an issue-report email is about.
#[derive(Debug, Clone, Copy)]
pub struct ReportTarget<'a> {
    pub business_name: &'a str,
    pub address: &'a str,
    pub description: Option<&'a str>,
    pub kind: SpecialKind,
}

impl<'a> ReportTarget<'a> {
    /// Report a whole card: its display name and its lead description.
    #[must_use]
    pub fn for_group(group: &'a RestaurantGroup) -> Self {
        Self {
            business_name: group.display_name(),
            address: &group.address,
            description: group.lead_description(),
            kind: group.report_kind(),
        }
    }
}

#[must_use]
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

#[must_use]
pub fn maps_url(address: &str) -> String {
    format!("{MAPS_SEARCH_URL}{}", encode_component(address))
}

/// `mailto:` draft addressed to `support_email` describing `target`.
#[must_use]
pub fn report_mailto(support_email: &str, target: &ReportTarget<'_>) -> String {
    let subject = format!("Chalkboards Report Issue — {}", target.business_name);
    let mut lines = vec![
        "Report issue:".to_string(),
        format!("Business: {}", target.business_name),
        format!("Address: {}", target.address),
        format!("Type: {}", target.kind.as_str()),
    ];
    if let Some(desc) = target.description.filter(|d| !d.trim().is_empty()) {
        lines.push(format!("Special: {desc}"));
    }
    lines.push("What’s wrong? (tell us):".to_string());

    format!(
        "mailto:{support_email}?subject={}&body={}",
        encode_component(&subject),
        encode_component(&lines.join("\n"))
    )
}

/// Popup lines for a group: up to three flash and three recurring entries.
#[must_use]
pub fn marker_lines(group: &RestaurantGroup) -> Vec<String> {
    let flash = group
        .flash
        .iter()
        .take(MAX_LINES_PER_KIND)
        .map(|f| format!("{ICON_FLASH} {}", f.description));
    let recurring = group.recurring.iter().take(MAX_LINES_PER_KIND).map(|r| {
        format!(
            "{} {} ({})",
            status_icon(r.status),
            r.description,
            pretty_window(r.start, r.end)
        )
    });
    flash.chain(recurring).collect()
}

/// One marker per group, in feed order.
#[must_use]
pub fn build_markers(groups: &[RestaurantGroup], support_email: &str) -> Vec<MarkerDescriptor> {
    groups
        .iter()
        .map(|group| MarkerDescriptor {
            lat: group.coordinates.lat,
            lng: group.coordinates.lng,
            title: group.display_name().to_string(),
            address: group.address.clone(),
            lines: marker_lines(group),
            maps_url: maps_url(&group.address),
            report_url: report_mailto(support_email, &ReportTarget::for_group(group)),
        })
        .collect()
}
