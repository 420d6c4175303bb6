//! Entity identity carried on physics bodies
//!
//! Bodies store an [`EntityKey`] in their 128-bit user data so a collision
//! reported by the physics engine resolves back to the gameplay entity.
//! Bit 127 marks the value as engine-written; anything without it (for
//! example the zero a body gets by default) is not an entity handle.

use crate::ecs::{EntityId, EntityKey, SystemId};
use crate::foundation::logging::fatal;

const ENTITY_TAG: u128 = 1 << 127;
const SYSTEM_MASK: u128 = 0xFFFF_FFFF;

/// Encode a key into body user data
pub fn encode(key: EntityKey) -> u128 {
    ENTITY_TAG | (u128::from(key.system.0) << 64) | u128::from(key.entity.raw())
}

/// Decode body user data, `None` when it does not carry an entity key
pub fn decode(user_data: u128) -> Option<EntityKey> {
    if user_data & ENTITY_TAG == 0 {
        return None;
    }
    let system = u32::try_from((user_data >> 64) & SYSTEM_MASK).ok()?;
    // Truncation keeps the low 64 bits, which is exactly the entity id.
    #[allow(clippy::cast_possible_truncation)]
    let entity = user_data as u64;
    if entity == 0 {
        return None;
    }
    Some(EntityKey::new(SystemId(system), EntityId::from_raw(entity)))
}

/// Decode body user data; a body without a valid key breaks the
/// physics/engine contract and is fatal
pub fn decode_or_fatal(user_data: u128) -> EntityKey {
    decode(user_data).unwrap_or_else(|| {
        fatal(format!("physics body user data {user_data:#x} is not a valid entity handle"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let key = EntityKey::new(SystemId(3), EntityId::from_raw(123_456));
        assert_eq!(decode(encode(key)), Some(key));
    }

    #[test]
    fn test_untagged_data_is_rejected() {
        assert_eq!(decode(0), None);
        assert_eq!(decode(42), None);
    }

    #[test]
    #[should_panic(expected = "not a valid entity handle")]
    fn test_decode_or_fatal_panics() {
        decode_or_fatal(7);
    }
}
