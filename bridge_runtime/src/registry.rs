use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::gateway::WorldGateway;

/// Names claimed through `register` since the last world reset.
///
/// Only the name string is tracked. A name in the set was bound to exactly
/// one state's display name when it was claimed; display names the world
/// assigned on its own are not recorded here.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    claimed: HashSet<String>,
}

/// Result of [`NameRegistry::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation<E> {
    Assigned(E),
    AlreadyClaimed,
    /// Every state already carries a claimed name. Nothing was mutated.
    Exhausted,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claimed.contains(name)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    pub fn clear(&mut self) {
        self.claimed.clear();
    }

    /// Claimed names in lexical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.claimed.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Bind `name` to one state picked uniformly among the states whose
    /// current display name is not claimed. Single pass over the world, no
    /// retries.
    pub fn allocate<W, R>(&mut self, world: &mut W, name: &str, rng: &mut R) -> Allocation<W::EntityRef>
    where
        W: WorldGateway,
        R: Rng + ?Sized,
    {
        if self.claimed.contains(name) {
            return Allocation::AlreadyClaimed;
        }

        let candidates: Vec<W::EntityRef> = world
            .list_entities()
            .into_iter()
            .filter(|entity| {
                world
                    .display_name(*entity)
                    .map_or(false, |current| !self.claimed.contains(current))
            })
            .collect();

        let Some(&chosen) = candidates.choose(rng) else {
            return Allocation::Exhausted;
        };

        world.rename(chosen, name);
        world.notify_renamed();
        self.claimed.insert(name.to_string());
        Allocation::Assigned(chosen)
    }
}
