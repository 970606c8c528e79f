//! Agent name pool.

use rand::Rng;
use rand::seq::SliceRandom;

/// Names handed out to new agents.
pub const NAME_POOL: [&str; 20] = [
    "Ada", "Bruno", "Clara", "Dante", "Elena", "Felix", "Greta", "Hugo", "Iris", "Jonas", "Kira",
    "Leo", "Maya", "Niko", "Olive", "Pablo", "Quinn", "Rosa", "Sven", "Thea",
];

/// Draw `count` distinct names. Once the pool is exhausted, names are
/// reused with a numeric suffix (`Ada_2`).
pub fn pick_names<R: Rng>(count: usize, rng: &mut R) -> Vec<String> {
    let mut pool: Vec<&str> = NAME_POOL.to_vec();
    pool.shuffle(rng);
    let mut names = Vec::with_capacity(count);
    let mut round: usize = 1;
    while names.len() < count {
        for base in &pool {
            if names.len() >= count {
                break;
            }
            if round == 1 {
                names.push((*base).to_owned());
            } else {
                names.push(format!("{base}_{round}"));
            }
        }
        round = round.saturating_add(1);
    }
    names
}
