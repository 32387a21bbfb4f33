//! Fallback role assignment.
//!
//! This is NOT a security control. It only keeps all three roles populated
//! when the identity oracle verifies a user without telling us their role.
//! Anyone can compute the role a username will receive, so access decisions
//! must always combine the role with the ownership checks in
//! [`super::policy`]. An oracle-supplied role always takes precedence.

use sha2::{Digest, Sha256};

use super::Role;

/// Deterministically map a username onto one of `Role::ALL`.
///
/// SHA-256 of the UTF-8 bytes, first eight bytes read big-endian, modulo 3.
/// Unkeyed and content-based, so the result is identical across calls,
/// processes and hosts.
pub fn derive_role(username: &str) -> Role {
    let digest = Sha256::digest(username.as_bytes());

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let bucket = u64::from_be_bytes(prefix) % Role::ALL.len() as u64;

    Role::ALL[bucket as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_username_same_role() {
        for name in ["alice", "bob", "dave", "", "ünïcödé", "a-very-long-username-with-dashes"] {
            let first = derive_role(name);
            for _ in 0..16 {
                assert_eq!(derive_role(name), first, "role drifted for {:?}", name);
            }
        }
    }

    #[test]
    fn stable_across_processes() {
        // Pinned values; a change here means every deployed user changes role.
        assert_eq!(derive_role("alice"), Role::User);
        assert_eq!(derive_role("bob"), Role::User);
        assert_eq!(derive_role("dave"), Role::Staff);
        assert_eq!(derive_role("erin"), Role::Admin);
        assert_eq!(derive_role("heidi"), Role::Staff);
    }

    #[test]
    fn all_roles_reachable() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..200 {
            seen.insert(derive_role(&format!("user{}", i)));
        }
        assert_eq!(seen.len(), 3);
    }
}
