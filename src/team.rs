// Team construction from role names

use crate::agent::{CaptureAgent, Role};
use crate::config::Config;

pub const DEFAULT_FIRST: &str = "OffensiveReflexAgent";
pub const DEFAULT_SECOND: &str = "DefensiveReflexAgent";

/// Role names a team may be built from
static ROLE_REGISTRY: &[(&str, Role)] = &[
    ("OffensiveReflexAgent", Role::Offensive),
    ("DefensiveReflexAgent", Role::Defensive),
];

pub fn resolve_role(name: &str) -> Result<Role, String> {
    ROLE_REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, role)| *role)
        .ok_or_else(|| {
            let known: Vec<&str> = ROLE_REGISTRY.iter().map(|(n, _)| *n).collect();
            format!("Unknown agent role '{}' (known: {})", name, known.join(", "))
        })
}

/// Builds the two agents of a team
///
/// # Arguments
/// * `first_index` / `second_index` - Agent indices on the board
/// * `is_red` - Team colour; indices of the wrong parity are accepted with a warning
/// * `first` / `second` - Registered role names
/// * `config` - Shared tunables
pub fn create_team(
    first_index: usize,
    second_index: usize,
    is_red: bool,
    first: &str,
    second: &str,
    config: &Config,
) -> Result<Vec<CaptureAgent>, String> {
    let first_role = resolve_role(first)?;
    let second_role = resolve_role(second)?;

    for index in [first_index, second_index].iter() {
        if (index % 2 == 0) != is_red {
            log::warn!(
                "Agent {} does not belong to the {} team",
                index,
                if is_red { "red" } else { "blue" }
            );
        }
    }

    Ok(vec![
        CaptureAgent::new(first_index, first_role, config),
        CaptureAgent::new(second_index, second_role, config),
    ])
}
