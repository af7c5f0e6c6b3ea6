//! Proptest generators for property-based testing.

use proptest::prelude::*;

use starledger_core::{Address, Block, BlockHash, Keypair, Payload, Star, StarRegistration};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a well-formed address.
pub fn address() -> impl Strategy<Value = Address> {
    keypair().prop_map(|kp| kp.address())
}

/// Generate a random BlockHash.
pub fn block_hash() -> impl Strategy<Value = BlockHash> {
    any::<[u8; 32]>().prop_map(BlockHash::from_bytes)
}

/// Generate payload bytes of specified max length.
pub fn data(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate an owned or unowned payload.
pub fn payload() -> impl Strategy<Value = Payload> {
    (prop::option::of("[a-z0-9]{1,16}"), data(256)).prop_map(|(owner, data)| match owner {
        Some(owner) => Payload::owned(owner, data),
        None => Payload::unowned(data),
    })
}

/// Generate a sequence of payloads to append in order.
pub fn payloads(max: usize) -> impl Strategy<Value = Vec<Payload>> {
    prop::collection::vec(payload(), 1..=max)
}

/// Generate a block timestamp in seconds.
pub fn timestamp() -> impl Strategy<Value = i64> {
    -1_000_000i64..=4_000_000_000i64
}

/// Generate a star that passes schema validation.
pub fn star() -> impl Strategy<Value = Star> {
    (
        "[0-9]{1,2}h [0-9]{1,2}m [0-9]{1,2}\\.[0-9]s",
        "-?[0-9]{1,2} [0-9]{1,2} [0-9]{1,2}\\.[0-9]",
        prop::option::of("[0-9]\\.[0-9]{1,3}"),
        prop::option::of("[A-Z][a-z]{2,10}"),
        "[ -~]{1,500}",
    )
        .prop_map(|(ra, dec, mag, cen, story)| Star {
            ra,
            dec,
            mag,
            cen,
            story,
        })
}

/// Generate a valid registration for a generated address.
pub fn star_registration() -> impl Strategy<Value = StarRegistration> {
    (address(), star()).prop_map(|(address, star)| StarRegistration::new(address, star))
}

/// Parameters for sealing a single block.
#[derive(Debug, Clone)]
pub struct BlockParams {
    pub height: u64,
    pub timestamp: i64,
    pub previous_hash: Option<BlockHash>,
    pub body: Payload,
}

impl Arbitrary for BlockParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            0u64..=1_000_000u64,
            timestamp(),
            prop::option::of(block_hash()),
            payload(),
        )
            .prop_map(|(height, timestamp, previous_hash, body)| BlockParams {
                height,
                timestamp,
                previous_hash,
                body,
            })
            .boxed()
    }
}

/// Seal a block from parameters.
pub fn block_from_params(params: &BlockParams) -> Block {
    Block::seal(
        params.height,
        params.timestamp,
        params.previous_hash,
        params.body.clone(),
    )
}
