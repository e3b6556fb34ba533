//! XP awarded at the end of a round.
//!
//! The calculator is pure: callers fetch each player's latest run per
//! category plus the round's missions and hand them over.

use super::{Category, MissionCategory, MissionDifficulty, MissionType, Rank};
use std::collections::{BTreeMap, HashMap};

const BASE_XP: f64 = 2500.0;
const MIN_LEADERBOARD_XP: i64 = 100;

/// A player's latest time in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub user_id: u64,
    pub nickname: String,
    pub category: Category,
    pub rank: Rank,
    pub record: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    pub category: MissionCategory,
    pub difficulty: MissionDifficulty,
    pub mission_type: MissionType,
    pub target: f64,
    /// Difficulty counted by a `Mission Threshold` general mission.
    pub extra_target: Option<MissionDifficulty>,
}

/// Everything a player earned in one round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserXp {
    pub nickname: String,
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub expert: u32,
    pub general: u32,
    pub mission_total: i64,
    pub total: i64,
    pub categories: BTreeMap<Category, i64>,
}

impl UserXp {
    pub fn completed(&self, difficulty: MissionDifficulty) -> u32 {
        match difficulty {
            MissionDifficulty::Easy => self.easy,
            MissionDifficulty::Medium => self.medium,
            MissionDifficulty::Hard => self.hard,
            MissionDifficulty::Expert => self.expert,
            MissionDifficulty::General => self.general,
        }
    }

    fn complete(&mut self, difficulty: MissionDifficulty) {
        let counter = match difficulty {
            MissionDifficulty::Easy => &mut self.easy,
            MissionDifficulty::Medium => &mut self.medium,
            MissionDifficulty::Hard => &mut self.hard,
            MissionDifficulty::Expert => &mut self.expert,
            MissionDifficulty::General => &mut self.general,
        };
        *counter += 1;
        self.mission_total += difficulty.points();
        self.total += difficulty.points();
    }

    pub fn category_xp(&self, category: Category) -> i64 {
        self.categories.get(&category).copied().unwrap_or(0)
    }
}

pub type XpTable = BTreeMap<u64, UserXp>;

/// `ceil((1 - (record - top) / (multiplier * top)) * 2500)`, never below 100.
pub fn leaderboard_xp(category: Category, record: f64, top: f64) -> i64 {
    if top <= 0.0 {
        return BASE_XP as i64;
    }
    let gap = (record - top) / (category.xp_multiplier() * top);
    let xp = ((1.0 - gap) * BASE_XP).ceil();
    if xp < MIN_LEADERBOARD_XP as f64 {
        MIN_LEADERBOARD_XP
    } else {
        xp as i64
    }
}

/// Fastest time per category within each rank tier.
fn top_records(runs: &[Run]) -> HashMap<(Category, Rank), f64> {
    let mut tops: HashMap<(Category, Rank), f64> = HashMap::new();
    for run in runs {
        tops.entry((run.category, run.rank))
            .and_modify(|top| *top = top.min(run.record))
            .or_insert(run.record);
    }
    tops
}

/// Standard competition rank of a run inside its category and tier.
fn placement(run: &Run, runs: &[Run]) -> usize {
    1 + runs
        .iter()
        .filter(|other| {
            other.category == run.category && other.rank == run.rank && other.record < run.record
        })
        .count()
}

fn satisfies(mission: &Mission, record: f64) -> bool {
    match mission.mission_type {
        MissionType::SubTime => record < mission.target,
        MissionType::Completion => true,
        _ => false,
    }
}

pub fn compute(runs: &[Run], missions: &[Mission]) -> XpTable {
    let mut table = XpTable::new();
    let tops = top_records(runs);

    for run in runs {
        let entry = table.entry(run.user_id).or_insert_with(|| UserXp {
            nickname: run.nickname.clone(),
            ..UserXp::default()
        });
        let top = tops.get(&(run.category, run.rank)).copied().unwrap_or(run.record);
        let xp = leaderboard_xp(run.category, run.record, top);
        *entry.categories.entry(run.category).or_insert(0) += xp;
        entry.total += xp;
    }

    // Only the hardest satisfied mission of a category counts.
    for run in runs {
        let hardest = missions
            .iter()
            .filter(|m| m.category.category() == Some(run.category))
            .filter(|m| m.difficulty != MissionDifficulty::General)
            .filter(|m| satisfies(m, run.record))
            .map(|m| m.difficulty)
            .max();
        if let (Some(difficulty), Some(entry)) = (hardest, table.get_mut(&run.user_id)) {
            entry.complete(difficulty);
        }
    }

    if let Some(general) = missions
        .iter()
        .find(|m| m.category == MissionCategory::General)
    {
        apply_general_mission(&mut table, general, runs);
    }

    table
}

fn apply_general_mission(table: &mut XpTable, mission: &Mission, runs: &[Run]) {
    let target = mission.target;
    let winners: Vec<u64> = match mission.mission_type {
        MissionType::XpThreshold => table
            .iter()
            .filter(|(_, xp)| xp.total as f64 >= target)
            .map(|(id, _)| *id)
            .collect(),
        MissionType::MissionThreshold => table
            .iter()
            .filter(|(_, xp)| {
                let done = match mission.extra_target {
                    Some(difficulty) => xp.completed(difficulty),
                    None => xp.easy + xp.medium + xp.hard + xp.expert,
                };
                f64::from(done) >= target
            })
            .map(|(id, _)| *id)
            .collect(),
        MissionType::TopPlacement => {
            let mut podiums: BTreeMap<u64, u32> = BTreeMap::new();
            for run in runs.iter().filter(|r| placement(r, runs) <= 3) {
                *podiums.entry(run.user_id).or_insert(0) += 1;
            }
            podiums
                .into_iter()
                .filter(|(_, count)| f64::from(*count) >= target)
                .map(|(id, _)| id)
                .collect()
        }
        MissionType::SubTime | MissionType::Completion => Vec::new(),
    };

    for user_id in winners {
        if let Some(entry) = table.get_mut(&user_id) {
            entry.complete(MissionDifficulty::General);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(user_id: u64, category: Category, rank: Rank, record: f64) -> Run {
        Run {
            user_id,
            nickname: format!("player{user_id}"),
            category,
            rank,
            record,
        }
    }

    fn mission(category: MissionCategory, difficulty: MissionDifficulty, mission_type: MissionType, target: f64) -> Mission {
        Mission {
            category,
            difficulty,
            mission_type,
            target,
            extra_target: None,
        }
    }

    #[test]
    fn top_record_earns_full_xp() {
        assert_eq!(leaderboard_xp(Category::TimeAttack, 60.0, 60.0), 2500);
    }

    #[test]
    fn slower_records_scale_down() {
        // (1 - 6 / (0.14094 * 60)) * 2500 = 726.19...
        assert_eq!(leaderboard_xp(Category::TimeAttack, 66.0, 60.0), 727);
        // (1 - 10 / (0.8352 * 100)) * 2500 = 2200.67...
        assert_eq!(leaderboard_xp(Category::Hardcore, 110.0, 100.0), 2201);
    }

    #[test]
    fn leaderboard_xp_is_floored() {
        assert_eq!(leaderboard_xp(Category::TimeAttack, 200.0, 60.0), 100);
        assert_eq!(leaderboard_xp(Category::Bonus, 1000.0, 10.0), 100);
    }

    #[test]
    fn tops_are_per_rank_tier() {
        let runs = vec![
            run(1, Category::Mildcore, Rank::Grandmaster, 30.0),
            run(2, Category::Mildcore, Rank::Gold, 50.0),
        ];
        let table = compute(&runs, &[]);
        assert_eq!(table[&1].total, 2500);
        assert_eq!(table[&2].total, 2500);
        assert_eq!(table[&2].category_xp(Category::Mildcore), 2500);
        assert_eq!(table[&2].nickname, "player2");
    }

    #[test]
    fn only_the_hardest_mission_counts() {
        let runs = vec![run(1, Category::Hardcore, Rank::Unranked, 40.0)];
        let missions = vec![
            mission(MissionCategory::Hardcore, MissionDifficulty::Easy, MissionType::Completion, 0.0),
            mission(MissionCategory::Hardcore, MissionDifficulty::Medium, MissionType::SubTime, 50.0),
            mission(MissionCategory::Hardcore, MissionDifficulty::Expert, MissionType::SubTime, 30.0),
        ];
        let table = compute(&runs, &missions);
        let xp = &table[&1];
        assert_eq!(xp.medium, 1);
        assert_eq!(xp.easy, 0);
        assert_eq!(xp.expert, 0);
        assert_eq!(xp.mission_total, 1000);
        assert_eq!(xp.total, 3500);
    }

    #[test]
    fn missions_of_other_categories_are_ignored() {
        let runs = vec![run(1, Category::Bonus, Rank::Unranked, 40.0)];
        let missions = vec![mission(
            MissionCategory::TimeAttack,
            MissionDifficulty::Hard,
            MissionType::Completion,
            0.0,
        )];
        assert_eq!(compute(&runs, &missions)[&1].mission_total, 0);
    }

    #[test]
    fn xp_threshold_general_mission() {
        let runs = vec![
            run(1, Category::TimeAttack, Rank::Unranked, 60.0),
            run(2, Category::TimeAttack, Rank::Unranked, 120.0),
        ];
        let missions = vec![mission(
            MissionCategory::General,
            MissionDifficulty::General,
            MissionType::XpThreshold,
            1000.0,
        )];
        let table = compute(&runs, &missions);
        assert_eq!(table[&1].general, 1);
        assert_eq!(table[&1].total, 4500);
        assert_eq!(table[&2].general, 0);
        assert_eq!(table[&2].total, 100);
    }

    #[test]
    fn mission_threshold_counts_the_named_difficulty() {
        let runs = vec![
            run(1, Category::TimeAttack, Rank::Unranked, 60.0),
            run(1, Category::Mildcore, Rank::Unranked, 60.0),
        ];
        let mut general = mission(
            MissionCategory::General,
            MissionDifficulty::General,
            MissionType::MissionThreshold,
            2.0,
        );
        general.extra_target = Some(MissionDifficulty::Easy);
        let missions = vec![
            mission(MissionCategory::TimeAttack, MissionDifficulty::Easy, MissionType::Completion, 0.0),
            mission(MissionCategory::Mildcore, MissionDifficulty::Easy, MissionType::Completion, 0.0),
            general,
        ];
        let xp = &compute(&runs, &missions)[&1];
        assert_eq!(xp.easy, 2);
        assert_eq!(xp.general, 1);
        assert_eq!(xp.mission_total, 500 + 500 + 2000);
    }

    #[test]
    fn top_placement_counts_podiums_within_tiers() {
        let mut runs = Vec::new();
        for (user, record) in [(1, 10.0), (2, 11.0), (3, 12.0), (4, 13.0)] {
            runs.push(run(user, Category::TimeAttack, Rank::Unranked, record));
            runs.push(run(user, Category::Bonus, Rank::Unranked, record));
        }
        let missions = vec![mission(
            MissionCategory::General,
            MissionDifficulty::General,
            MissionType::TopPlacement,
            2.0,
        )];
        let table = compute(&runs, &missions);
        assert_eq!(table[&1].general, 1);
        assert_eq!(table[&3].general, 1);
        assert_eq!(table[&4].general, 0);
    }
}
