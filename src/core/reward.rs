// Block reward schedule: ten fixed halving tiers of 2,100,000 blocks each,
// then nothing. The table values are protocol constants shared by every node;
// changing one forks the network.

use num_bigint::BigUint;
use once_cell::sync::Lazy;

/// Number of blocks in one reward tier.
pub const BLOCKS_PER_TIER: u64 = 2_100_000;

/// Exclusive upper bound of each tier, in block numbers.
const TIER_BOUNDARIES: [u64; 10] = [
    2_100_001, 4_200_001, 6_300_001, 8_400_001, 10_500_001, 12_600_001, 14_700_001, 16_800_001,
    18_900_001, 21_000_001,
];

/// Per-block reward for each tier, halving from 10^14 base units.
static TIER_REWARDS: Lazy<[BigUint; 10]> = Lazy::new(|| {
    [
        "100000000000000",
        "50000000000000",
        "25000000000000",
        "12500000000000",
        "6250000000000",
        "3125000000000",
        "1562500000000",
        "781250000000",
        "390625000000",
        "195312500000",
    ]
    .map(|units| BigUint::parse_bytes(units.as_bytes(), 10).expect("reward table literal"))
});

/// Reward for `block_number`: the first tier whose boundary exceeds the
/// number, zero at or beyond the tenth boundary.
pub fn reward(block_number: u64) -> BigUint {
    for (boundary, tier_reward) in TIER_BOUNDARIES.iter().zip(TIER_REWARDS.iter()) {
        if block_number < *boundary {
            return tier_reward.clone();
        }
    }
    BigUint::default()
}
