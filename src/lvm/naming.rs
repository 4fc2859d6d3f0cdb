//! Deterministic device and volume names.
//!
//! Names are fixed width so they look like the WWIDs and UUIDs a real
//! deployment produces; the index lives in the trailing digits.

/// Prefix shared by every vg the harness creates.
pub const VG_PREFIX: &str = "bz1837199";

/// Largest count whose indices still fit the 4 digit name fields.
pub const MAX_INDEX: usize = 10_000;

pub fn delay_name(i: usize) -> String {
    format!("delay{:028}", i)
}

pub fn pv_name(i: usize) -> String {
    format!("/dev/mapper/{}", delay_name(i))
}

pub fn vg_name(i: usize) -> String {
    format!("{}-000000000000000000000-{:04}", VG_PREFIX, i)
}

pub fn lv_name(i: usize) -> String {
    format!("lv-0000000000000000000000000000-{:04}", i)
}

/// Device node of an active lv.
pub fn lv_device(vg_name: &str, lv_name: &str) -> String {
    format!("/dev/{}/{}", vg_name, lv_name)
}

/// `vg/lv` form accepted by the lv commands.
pub fn lv_path(vg_name: &str, lv_name: &str) -> String {
    format!("{}/{}", vg_name, lv_name)
}

/// Local link names created by setup, e.g. `loop_03`.
pub fn link_name(prefix: &str, i: usize) -> String {
    format!("{}_{:02}", prefix, i)
}
