pub mod autocomplete;
pub mod duels;
pub mod general;
pub mod gym;
pub mod maps;
pub mod moderation;
pub mod personal;
pub mod playtest;
pub mod rank;
pub mod records;
pub mod tags;
pub mod tournament;

use crate::error::Error;
use crate::Data;

/// Every top-level command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        general::ping(),
        general::about(),
        general::help(),
        records::submit_record(),
        records::leaderboard(),
        records::personal_records(),
        records::personal_records_menu(),
        records::world_records_menu(),
        records::verification_stats(),
        maps::submit_map(),
        maps::map_search(),
        maps::map_maker(),
        maps::guide(),
        maps::add_guide(),
        tournament::tournament(),
        tournament::ta(),
        tournament::mc(),
        tournament::hc(),
        tournament::bo(),
        tournament::tournament_leaderboard(),
        tournament::missions(),
        tournament::change_rank(),
        tournament::xp(),
        tournament::season(),
        tournament::map_contest(),
        tournament::map_contest_list(),
        tournament::map_contest_list_users(),
        tournament::map_contest_delete_code(),
        duels::duel(),
        gym::one_rep_max(),
        gym::add_pr(),
        gym::show_pr(),
        gym::exercise_search(),
        gym::add_exercise(),
        gym::convert(),
        tags::tag(),
        moderation::moderation(),
        personal::alerts(),
        personal::name(),
        personal::uwufier(),
        personal::blarg(),
        rank::rank(),
        rank::xp_leaderboard(),
        playtest::submit_playtest(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn command_names_are_unique() {
        let commands = all();
        let mut seen = HashSet::new();
        for command in &commands {
            let name = command
                .context_menu_name
                .clone()
                .unwrap_or_else(|| command.name.clone());
            assert!(seen.insert(name.clone()), "duplicate command {name}");
        }
    }

    #[test]
    fn slash_names_are_discord_safe() {
        fn check(command: &poise::Command<Data, Error>) {
            if command.context_menu_name.is_none() {
                assert!(
                    command
                        .name
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                    "bad name {}",
                    command.name
                );
            }
            command.subcommands.iter().for_each(check);
        }
        all().iter().for_each(check);
    }
}
