/// Static passage pool supplying the target text for a session.
///
/// Callers treat a passage as an opaque immutable string for the lifetime
/// of one test or race.
pub const PASSAGES: &[&str] = &[
    "The quick brown fox jumps over the lazy dog while the sleepy cat watches from the warm windowsill.",
    "Typing fast is a matter of rhythm more than of speed; the fingers learn the words before the mind does.",
    "A river carves its canyon not by force but by persistence, one grain of sand at a time, year after year.",
    "The library smelled of old paper and quiet afternoons, and nobody ever wanted to be the one to break the silence.",
    "Ships in harbor are safe, but that is not what ships are built for, and the tide does not wait for anyone.",
    "Every map is a small act of optimism: someone believed the territory could be understood and drawn.",
    "The keyboard is just the interface between your thoughts and the machine; the real work happens in between.",
    "Rust programs promise that if it compiles, a whole family of bugs has already been shown the door.",
    "Morning fog rolled over the track as the runners took their marks, each one listening for the starter's gun.",
    "Practice does not make perfect; practice makes permanent, so be careful what you rehearse.",
];

/// Pick a passage pseudo-randomly, seeded from the wall clock.
pub fn random_passage() -> &'static str {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::time::{SystemTime, UNIX_EPOCH};

    let mut hasher = DefaultHasher::new();
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);

    let index = (hasher.finish() as usize) % PASSAGES.len();
    PASSAGES[index]
}

/// Deterministic lookup for tests and replays.
pub fn passage_by_index(index: usize) -> Option<&'static str> {
    PASSAGES.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_is_populated() {
        assert!(PASSAGES.len() >= 5);
        assert!(PASSAGES.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn lookup_by_index() {
        assert!(passage_by_index(0).is_some());
        assert!(passage_by_index(PASSAGES.len()).is_none());
    }

    #[test]
    fn random_passage_comes_from_pool() {
        let passage = random_passage();
        assert!(PASSAGES.contains(&passage));
    }
}
