use proptest::prelude::*;

use iota_crypto::sign::{self, MAX_TRYTE_VALUE, MIN_TRYTE_VALUE};
use iota_types::Hash;

proptest! {
    /// Every normalized fragment sums to zero with values in [-13, 13].
    #[test]
    fn normalized_fragments_sum_to_zero(s in "[9A-Z]{81}") {
        let normalized = sign::normalize(&Hash::new(&s).unwrap());
        prop_assert_eq!(normalized.len(), 81);
        for fragment in normalized.chunks_exact(27) {
            let sum: i32 = fragment.iter().map(|&v| i32::from(v)).sum();
            prop_assert_eq!(sum, 0);
            for &value in fragment {
                prop_assert!((MIN_TRYTE_VALUE..=MAX_TRYTE_VALUE).contains(&value));
            }
        }
    }

    /// Normalization is a pure function of the hash.
    #[test]
    fn normalization_is_deterministic(s in "[9A-Z]{81}") {
        let hash = Hash::new(&s).unwrap();
        prop_assert_eq!(sign::normalize(&hash), sign::normalize(&hash));
    }
}
