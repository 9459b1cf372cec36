//! Encoded image reference resolution.
//!
//! A `nix:0` image reference embeds a store path instead of a registry
//! coordinate. Single-architecture references carry the path directly;
//! multi-architecture references carry a `/multiarch/` table of
//! `<system><store path>` pairs with no separator between pairs. The
//! boundary between a store path and the next system name is disambiguated
//! purely by the store-path grammar: `/nix/store/` followed by a
//! 32-character lowercase hash, a hyphen, and the package name.

use std::collections::HashMap;

use tracing::error;

use crate::error::{ImageError, Result};

/// Prefix marking an image reference as a Nix store encoding.
pub const IMAGE_REF_PREFIX: &str = "nix:0";

const MULTIARCH_MARKER: &str = "/multiarch/";
const STORE_ROOT: &str = "/nix/store/";
const STORE_HASH_LEN: usize = 32;

/// Returns the Nix system double of the host platform.
///
/// # Errors
///
/// Fails when the host is not one of the supported `linux/x86_64` or
/// `linux/aarch64` pairs.
pub fn host_system() -> Result<&'static str> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => Ok("x86_64-linux"),
        ("linux", "aarch64") => Ok("aarch64-linux"),
        (os, arch) => Err(ImageError::UnsupportedPlatform { os, arch }),
    }
}

/// Extracts the store path for `system` from an encoded image reference.
///
/// Single-architecture references resolve to their embedded path
/// unconditionally, whatever `system` is. Multi-architecture references
/// resolve to the path paired with `system`; when the reference carries no
/// entry for it, the failure is logged and an empty path is returned, which
/// makes the subsequent build step fail for that architecture only.
pub fn resolve_store_path(reference: &str, system: &str) -> String {
    let path = reference.strip_prefix(IMAGE_REF_PREFIX).unwrap_or(reference);
    let path = path.strip_suffix(":latest").unwrap_or(path);

    let Some(mut rest) = path.strip_prefix(MULTIARCH_MARKER) else {
        return path.to_string();
    };

    let mut paths_per_system: HashMap<&str, &str> = HashMap::new();
    while !rest.is_empty() {
        // The system name runs up to the leading '/' of its store path.
        let name = rest.split('/').next().unwrap_or(rest);
        rest = &rest[name.len()..];

        let store_path = match_store_path(rest).unwrap_or("");
        rest = &rest[store_path.len()..];
        rest = rest.strip_prefix('/').unwrap_or(rest);

        paths_per_system.insert(name, store_path);
    }

    match paths_per_system.get(system) {
        Some(found) => (*found).to_string(),
        None => {
            error!(
                reference = %reference,
                system = %system,
                "failed to extract store path from reference"
            );
            String::new()
        }
    }
}

/// Returns the longest prefix of `input` that is a well-formed store path.
///
/// The next system name in a multiarch table starts with '/', which is not
/// a name character, so the greedy name scan stops exactly at the pair
/// boundary.
fn match_store_path(input: &str) -> Option<&str> {
    let rest = input.strip_prefix(STORE_ROOT)?;
    let bytes = rest.as_bytes();
    if bytes.len() < STORE_HASH_LEN + 2 {
        return None;
    }
    if !bytes[..STORE_HASH_LEN]
        .iter()
        .all(|&b| b.is_ascii_digit() || b.is_ascii_lowercase())
    {
        return None;
    }
    if bytes[STORE_HASH_LEN] != b'-' {
        return None;
    }
    let name_len = bytes[STORE_HASH_LEN + 1..]
        .iter()
        .take_while(|&&b| is_name_char(b))
        .count();
    if name_len == 0 {
        return None;
    }
    Some(&input[..STORE_ROOT.len() + STORE_HASH_LEN + 1 + name_len])
}

const fn is_name_char(b: u8) -> bool {
    matches!(b, b'-' | b'.' | b'+' | b'_' | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z')
}

#[cfg(test)]
mod tests {
    use super::*;

    const X86_PATH: &str = "/nix/store/02zg1wk37s9k35n5iv850g52dp1ffdxz-nginx-1.24.0";
    const ARM_PATH: &str = "/nix/store/gjilixzvxk9pzilz3ixxamrjqk4mk1jl-nginx-1.24.0";

    fn multiarch_ref() -> String {
        format!("nix:0/multiarch/x86_64-linux{X86_PATH}/aarch64-linux{ARM_PATH}")
    }

    #[test]
    fn test_single_arch_ref() {
        let reference = format!("nix:0{X86_PATH}");
        assert_eq!(resolve_store_path(&reference, "x86_64-linux"), X86_PATH);
    }

    #[test]
    fn test_single_arch_ignores_system() {
        let reference = format!("nix:0{X86_PATH}");
        assert_eq!(resolve_store_path(&reference, "aarch64-linux"), X86_PATH);
        assert_eq!(resolve_store_path(&reference, "riscv64-linux"), X86_PATH);
    }

    #[test]
    fn test_multi_arch_ref() {
        let reference = multiarch_ref();
        assert_eq!(resolve_store_path(&reference, "x86_64-linux"), X86_PATH);
        assert_eq!(resolve_store_path(&reference, "aarch64-linux"), ARM_PATH);
    }

    #[test]
    fn test_multi_arch_unknown_system_is_empty() {
        let reference = multiarch_ref();
        assert_eq!(resolve_store_path(&reference, "riscv64-linux"), "");
    }

    #[test]
    fn test_latest_tag_is_stripped() {
        let bare = format!("nix:0{X86_PATH}");
        let tagged = format!("nix:0{X86_PATH}:latest");
        assert_eq!(
            resolve_store_path(&tagged, "x86_64-linux"),
            resolve_store_path(&bare, "x86_64-linux"),
        );

        let tagged = format!("{}:latest", multiarch_ref());
        assert_eq!(resolve_store_path(&tagged, "aarch64-linux"), ARM_PATH);
    }

    #[test]
    fn test_other_tags_are_kept() {
        let reference = format!("nix:0{X86_PATH}:v2");
        assert_eq!(
            resolve_store_path(&reference, "x86_64-linux"),
            format!("{X86_PATH}:v2"),
        );
    }

    #[test]
    fn test_empty_body_resolves_empty() {
        assert_eq!(resolve_store_path("nix:0", "x86_64-linux"), "");
        assert_eq!(resolve_store_path("nix:0/multiarch/", "x86_64-linux"), "");
    }

    #[test]
    fn test_malformed_store_segment_maps_empty() {
        // Hash contains uppercase characters, so the store-path scan fails
        // and the system maps to an empty path instead of aborting.
        let reference =
            "nix:0/multiarch/x86_64-linux/nix/store/02ZG1WK37S9K35N5IV850G52DP1FFDXZ-nginx";
        assert_eq!(resolve_store_path(reference, "x86_64-linux"), "");
    }

    #[test]
    fn test_match_store_path_stops_at_pair_boundary() {
        let input = format!("{X86_PATH}/aarch64-linux{ARM_PATH}");
        assert_eq!(match_store_path(&input), Some(X86_PATH));
    }

    #[test]
    fn test_match_store_path_accepts_name_punctuation() {
        let input = "/nix/store/02zg1wk37s9k35n5iv850g52dp1ffdxz-gtk+3_1.2-rc.1";
        assert_eq!(match_store_path(input), Some(input));
    }

    #[test]
    fn test_match_store_path_rejects_short_hash() {
        assert_eq!(match_store_path("/nix/store/02zg1wk37s9k-nginx"), None);
        assert_eq!(match_store_path("/nix/store/"), None);
        assert_eq!(match_store_path("/srv/other/root"), None);
    }

    #[cfg(all(
        target_os = "linux",
        any(target_arch = "x86_64", target_arch = "aarch64")
    ))]
    #[test]
    fn test_host_system_is_supported() {
        assert!(host_system().is_ok());
    }
}
