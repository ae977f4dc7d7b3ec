//! Player identity: an opaque id, a display emoji/color drawn from fixed
//! palettes, and transient typing text. One player lives for exactly the
//! lifetime of one connection.
use atlas_core::ID;

/// Fixed emoji palette players are assigned from. Collisions are allowed
/// and not deduplicated.
pub const EMOJI_PALETTE: &[&str] = &[
    "🦊", "🐻", "🐼", "🦁", "🐸", "🐙", "🦉", "🐢", "🦄", "🐲", "🦋", "🐳",
];

/// Fixed color palette players are assigned from, as CSS hex strings.
pub const COLOR_PALETTE: &[&str] = &[
    "#e63946", "#f1a208", "#2a9d8f", "#457b9d", "#6a4c93", "#ef476f", "#06d6a0", "#118ab2",
];

/// A connected participant. `id` is stable for the life of the connection
/// and is cast to `ID<Actor>` 1:1 (`actorId == ownerId`).
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ID<Player>,
    pub emoji: &'static str,
    pub color: &'static str,
    pub typing: String,
}

impl Player {
    /// Mint a new player, assigning emoji/color uniformly at random.
    pub fn new() -> Self {
        let mut rng = rand::rng();
        Self {
            id: ID::default(),
            emoji: pick(&mut rng, EMOJI_PALETTE),
            color: pick(&mut rng, COLOR_PALETTE),
            typing: String::new(),
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<R: rand::Rng>(rng: &mut R, palette: &[&'static str]) -> &'static str {
    palette[rng.random_range(0..palette.len())]
}
