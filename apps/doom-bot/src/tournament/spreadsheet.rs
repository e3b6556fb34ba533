//! Round results workbook: one sheet per rank tier plus a missions sheet.

use super::xp::{Run, XpTable};
use super::{Category, Rank};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

const COLUMN_WIDTH_PX: u16 = 105;

fn header_color(category: Category) -> &'static str {
    match category {
        Category::TimeAttack => "#93c47d",
        Category::Mildcore => "#ff9900",
        Category::Hardcore => "#ff0000",
        Category::Bonus => "#ffff00",
    }
}

/// First column of a category's Name/Time/Points group.
fn first_column(category: Category) -> u16 {
    match category {
        Category::TimeAttack => 0,
        Category::Mildcore => 4,
        Category::Hardcore => 8,
        Category::Bonus => 12,
    }
}

pub fn file_name(date: chrono::NaiveDate) -> String {
    format!("DPK_Tournament_{}.xlsx", date.format("%d-%m-%Y"))
}

/// Build the workbook in memory. `runs` must hold each player's latest
/// run per category.
pub fn build(runs: &[Run], xp: &XpTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    for rank in Rank::ALL {
        let mut sheet = rank_sheet(rank)?;
        for category in Category::ALL {
            let mut rows: Vec<&Run> = runs
                .iter()
                .filter(|r| r.rank == rank && r.category == category)
                .collect();
            rows.sort_by(|a, b| a.record.total_cmp(&b.record));

            let col = first_column(category);
            for (i, run) in rows.iter().enumerate() {
                let row = 2 + i as u32;
                let points = xp
                    .get(&run.user_id)
                    .map(|x| x.category_xp(category))
                    .unwrap_or(0);
                sheet.write_string(row, col, format!("{} ({})", run.nickname, run.user_id))?;
                sheet.write_number(row, col + 1, run.record)?;
                sheet.write_number(row, col + 2, points as f64)?;
            }
        }
        workbook.push_worksheet(sheet);
    }

    workbook.push_worksheet(missions_sheet(xp)?);
    workbook.save_to_buffer()
}

fn rank_sheet(rank: Rank) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(rank.as_str())?;

    let label = Format::new()
        .set_align(FormatAlign::Left)
        .set_border(FormatBorder::Thin);
    for category in Category::ALL {
        let col = first_column(category);
        let title = Format::new()
            .set_align(FormatAlign::Center)
            .set_background_color(header_color(category))
            .set_border(FormatBorder::Thin);
        sheet.merge_range(0, col, 0, col + 2, category.as_str(), &title)?;
        for (offset, text) in ["Name", "Time", "Points"].into_iter().enumerate() {
            sheet.write_string_with_format(1, col + offset as u16, text, &label)?;
        }
    }
    for col in 0..16 {
        sheet.set_column_width_pixels(col, COLUMN_WIDTH_PX)?;
    }
    Ok(sheet)
}

fn missions_sheet(xp: &XpTable) -> Result<Worksheet, XlsxError> {
    let mut sheet = Worksheet::new();
    sheet.set_name("Missions")?;

    let header = Format::new().set_border(FormatBorder::Thin);
    let headers = [
        "Names",
        "Easy",
        "Medium",
        "Hard",
        "Expert",
        "General",
        "Missions Total",
        "Total XP",
    ];
    for (col, text) in headers.into_iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, text, &header)?;
    }

    let centered = Format::new().set_align(FormatAlign::Center);
    for (i, (user_id, data)) in xp.iter().enumerate() {
        let row = 1 + i as u32;
        sheet.write_string(row, 0, format!("{} ({user_id})", data.nickname))?;
        let counts = [data.easy, data.medium, data.hard, data.expert, data.general];
        for (offset, count) in counts.into_iter().enumerate() {
            sheet.write_number_with_format(row, 1 + offset as u16, f64::from(count), &centered)?;
        }
        sheet.write_number(row, 6, data.mission_total as f64)?;
        sheet.write_number(row, 7, data.total as f64)?;
    }
    for col in 0..8 {
        sheet.set_column_width_pixels(col, COLUMN_WIDTH_PX)?;
    }
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::xp;

    #[test]
    fn workbook_is_a_zip_archive() {
        let runs = vec![xp::Run {
            user_id: 7,
            nickname: "nebula".into(),
            category: Category::Hardcore,
            rank: Rank::Diamond,
            record: 42.5,
        }];
        let table = xp::compute(&runs, &[]);
        let bytes = build(&runs, &table).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn file_name_carries_the_date() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(file_name(date), "DPK_Tournament_09-03-2026.xlsx");
    }
}
