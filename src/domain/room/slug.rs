//! Human-shareable room labels such as `brave-azure-wolf`.

use rand::seq::SliceRandom;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "able", "agile", "ancient", "bold", "brave", "bright", "calm", "clever", "cosmic", "curious",
    "daring", "eager", "early", "fancy", "fierce", "gentle", "glad", "grand", "happy", "hidden",
    "humble", "jolly", "keen", "kind", "lively", "lucky", "mellow", "mighty", "modest", "nimble",
    "noble", "patient", "polite", "proud", "quick", "quiet", "rapid", "rare", "silent", "sleepy",
    "smart", "snowy", "steady", "swift", "tidy", "vivid", "warm", "wise", "witty", "zesty",
];

const COLORS: &[&str] = &[
    "amber", "aqua", "azure", "beige", "black", "blue", "bronze", "brown", "coral", "crimson",
    "cyan", "emerald", "gold", "gray", "green", "indigo", "ivory", "jade", "lavender", "lime",
    "magenta", "maroon", "olive", "orange", "peach", "pink", "plum", "purple", "red", "rose",
    "ruby", "salmon", "sapphire", "scarlet", "silver", "tan", "teal", "turquoise", "violet",
    "white", "yellow",
];

const ANIMALS: &[&str] = &[
    "badger", "bat", "bear", "beaver", "bison", "camel", "cat", "cobra", "crane", "crow", "deer",
    "dolphin", "eagle", "falcon", "ferret", "fox", "frog", "gecko", "goat", "goose", "hawk",
    "heron", "hyena", "ibis", "jaguar", "koala", "lemur", "lion", "llama", "lynx", "moose",
    "otter", "owl", "panda", "parrot", "puffin", "rabbit", "raven", "seal", "shark", "sloth",
    "swan", "tiger", "toad", "turtle", "walrus", "whale", "wolf", "yak", "zebra",
];

/// Compose an `adjective-color-animal` slug from the given rng.
pub fn generate_slug_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = pick(ADJECTIVES, rng);
    let color = pick(COLORS, rng);
    let animal = pick(ANIMALS, rng);

    format!("{}-{}-{}", adjective, color, animal)
}

fn pick<R: Rng + ?Sized>(words: &[&'static str], rng: &mut R) -> &'static str {
    words.choose(rng).copied().unwrap_or("room")
}

pub fn generate_slug() -> String {
    generate_slug_with(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn slug_should_be_three_lowercase_words() {
        // Act
        let slug = generate_slug();

        // Assert
        let parts: Vec<&str> = slug.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(COLORS.contains(&parts[1]));
        assert!(ANIMALS.contains(&parts[2]));
        assert_eq!(slug, slug.to_lowercase());
    }

    #[test]
    fn same_seed_should_produce_same_slug() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);

        assert_eq!(generate_slug_with(&mut a), generate_slug_with(&mut b));
    }

    #[test]
    fn word_lists_should_not_contain_separators() {
        for word in ADJECTIVES.iter().chain(COLORS).chain(ANIMALS) {
            assert!(!word.contains('-'), "{word} contains a hyphen");
            assert!(!word.is_empty());
        }
    }
}
