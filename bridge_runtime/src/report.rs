use crate::gateway::{StateAttributes, WorldGateway};

pub const LIST_SEPARATOR: &str = ", ";

/// Build the `info` line for a resolved state, or `None` if the reference
/// went stale. Enemies are listed by display name in lexical order; traits
/// keep the order the world stores them in.
pub fn state_report<W: WorldGateway>(world: &W, entity: W::EntityRef) -> Option<String> {
    let attributes = world.attributes(entity)?;
    let traits: Vec<String> = world
        .traits_of(entity)
        .iter()
        .map(ToString::to_string)
        .collect();
    let mut enemies: Vec<String> = world
        .enemies_of(entity)
        .into_iter()
        .filter_map(|enemy| world.display_name(enemy).map(str::to_string))
        .collect();
    enemies.sort();
    Some(format_state_report(&attributes, &traits, &enemies))
}

pub fn format_state_report(attributes: &StateAttributes, traits: &[String], enemies: &[String]) -> String {
    format!(
        "Name: {}-Color: {}-Ethnic: {}-Diplomacy Power: {}-Diplomacy Efficiency: {}-\
         Food Reserve: {}-Population: {}-Gold: {}-Gold/Month: {}-Political System: {}-\
         traits: {}-Enemies: {}",
        attributes.full_name,
        attributes.color,
        attributes.ethnic,
        attributes.diplomacy_power,
        attributes.diplomacy_efficiency,
        attributes.food_reserve,
        attributes.population,
        attributes.gold,
        attributes.gold_per_month,
        attributes.political_system,
        traits.join(LIST_SEPARATOR),
        enemies.join(LIST_SEPARATOR),
    )
}
