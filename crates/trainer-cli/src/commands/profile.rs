//! Profile command implementation.

use anyhow::Result;

use crate::cli::{Cli, ProfileAction};
use crate::profile::Profile;

/// Run the profile command
pub fn run(cli: &Cli, action: &ProfileAction) -> Result<()> {
    let mut profile = Profile::load(&cli.profile)?;

    match *action {
        ProfileAction::Show => {
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ProfileAction::Save {
            coin,
            diamond,
            fuel,
            boost,
        } => {
            apply_values(&mut profile, coin, diamond, fuel, boost);
            if let Some(game) = &cli.game {
                profile.game = Some(game.clone());
            }
            if let Some(module) = &cli.module {
                profile.module = Some(module.clone());
            }
            profile.save(&cli.profile)?;
        }
    }

    Ok(())
}

fn apply_values(
    profile: &mut Profile,
    coin: Option<u32>,
    diamond: Option<u32>,
    fuel: Option<f32>,
    boost: Option<i32>,
) {
    if let Some(coin) = coin {
        profile.coin = coin.to_string();
    }
    if let Some(diamond) = diamond {
        profile.diamond = diamond.to_string();
    }
    if let Some(fuel) = fuel {
        profile.fuel = format!("{:.2}", fuel);
    }
    if let Some(boost) = boost {
        profile.boost = boost.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_values_only_touches_given_fields() {
        let mut profile = Profile::default();
        apply_values(&mut profile, Some(500), None, Some(42.5), None);

        assert_eq!(profile.coin, "500");
        assert_eq!(profile.diamond, "0");
        assert_eq!(profile.fuel, "42.50");
        assert_eq!(profile.boost, "0");
        assert_eq!(profile.fuel_value(), 42.5);
    }
}
