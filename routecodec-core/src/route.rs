//! Route names

/// Flat form of a dotted route, for keying outside the schema tree
///
/// Every `.` becomes `_`. Schema lookups always use the dotted form; this
/// is never applied before a lookup.
pub fn normalize_route(route: &str) -> String {
    route.replace('.', "_")
}
