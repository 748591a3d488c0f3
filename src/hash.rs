use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn stable_hash_with(f: impl FnOnce(&mut DefaultHasher)) -> u64 {
    let mut hasher = DefaultHasher::new();
    f(&mut hasher);
    hasher.finish()
}

/// Per-item draw seed mixing the invocation seed, the item identity, and the
/// retry round. Hash-derived rather than positional so the seed schedule is
/// stable under corpus reordering.
pub fn item_draw_seed(invocation_seed: u64, item: &str, round: u32) -> u64 {
    stable_hash_with(|hasher| {
        invocation_seed.hash(hasher);
        item.hash(hasher);
        round.hash(hasher);
    })
}
