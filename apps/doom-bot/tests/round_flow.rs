//! End-of-round pipeline and duel settlement, driven through the public API.

use doom_bot::commands::rank::find_level;
use doom_bot::duels::{resolve, Outcome, LOST, WON};
use doom_bot::tournament::xp::{compute, Mission, Run};
use doom_bot::tournament::{spreadsheet, Category, MissionCategory, MissionDifficulty, MissionType, Rank};
use doom_bot::utils::format::format_xp;
use doom_bot::utils::time::{pretty_record, time_convert};
use doom_bot::utils::validate;

fn run(user_id: u64, category: Category, record: &str) -> Run {
    Run {
        user_id,
        nickname: format!("player{user_id}"),
        category,
        rank: Rank::Gold,
        record: time_convert(record).unwrap(),
    }
}

#[test]
fn round_results_flow_into_xp_and_workbook() {
    let runs = vec![
        run(1, Category::TimeAttack, "1:00"),
        run(2, Category::TimeAttack, "1:06.5"),
        run(2, Category::Hardcore, "3:10"),
    ];
    let missions = vec![Mission {
        category: MissionCategory::TimeAttack,
        difficulty: MissionDifficulty::Easy,
        mission_type: MissionType::Completion,
        target: 0.0,
        extra_target: None,
    }];

    let table = compute(&runs, &missions);
    let first = &table[&1];
    let second = &table[&2];

    // Fastest time in a tier earns the full base.
    assert_eq!(first.category_xp(Category::TimeAttack), 2500);
    assert_eq!(second.category_xp(Category::Hardcore), 2500);
    assert!(second.category_xp(Category::TimeAttack) < 2500);
    assert!(second.category_xp(Category::TimeAttack) >= 100);

    assert_eq!(first.easy, 1);
    assert_eq!(first.total, 2500 + MissionDifficulty::Easy.points());
    assert_eq!(format_xp(first.total), "3k");
    assert!(find_level(first.total) > find_level(0));

    let workbook = spreadsheet::build(&runs, &table).unwrap();
    assert!(workbook.starts_with(b"PK"));
}

#[test]
fn duel_times_decide_the_winner() {
    let slow = time_convert("2:30").unwrap();
    let fast = time_convert("2:10.25").unwrap();
    assert_eq!(pretty_record(fast), "2:10.25");

    let outcome = resolve((7, Some(slow)), (8, Some(fast)));
    assert_eq!(outcome, Outcome::Winner { winner: 8, loser: 7 });
    assert_eq!(outcome.results(&[7, 8]), vec![(7, LOST), (8, WON)]);

    let nobody = resolve((7, None), (8, None));
    assert_eq!(nobody.results(&[7, 8]), vec![(7, 0), (8, 0)]);
}

#[test]
fn only_positive_times_reach_the_xp_table() {
    for raw in ["0", "-5", "-0:30"] {
        assert!(validate::record(raw).is_err(), "{raw} accepted");
    }

    let submitted = [(1, "0"), (2, "8:20"), (3, "1:00")];
    let runs: Vec<Run> = submitted
        .iter()
        .filter_map(|(user_id, raw)| {
            validate::record(raw).ok().map(|record| Run {
                user_id: *user_id,
                nickname: format!("player{user_id}"),
                category: Category::TimeAttack,
                rank: Rank::Gold,
                record,
            })
        })
        .collect();
    assert_eq!(runs.len(), 2);

    let table = compute(&runs, &[]);
    assert!(!table.contains_key(&1));
    assert_eq!(table[&3].total, 2500);
    assert_eq!(table[&2].total, 100);
}
