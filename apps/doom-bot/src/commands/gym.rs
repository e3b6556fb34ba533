use super::autocomplete;
use crate::cache::autocomplete as filter_choices;
use crate::db;
use crate::db::gym::ExerciseRow;
use crate::error::Error;
use crate::gym::{both_units, format_pr, kg_to_lb, lb_to_kg, one_rep_max_report, ExerciseCategory, Unit};
use crate::utils::{embeds, paginator::paginate, validate};
use crate::Context;
use poise::CreateReply;
use serenity::all::{CreateEmbed, Mentionable};
use tracing::info;

const PR_EMOJI: &str = "<:_:1029045690829115402>";

pub const BODY_PARTS: [&str; 10] = [
    "back",
    "cardio",
    "chest",
    "lower arms",
    "lower legs",
    "neck",
    "shoulders",
    "upper arms",
    "upper legs",
    "waist",
];

pub const EQUIPMENT: [&str; 23] = [
    "assisted",
    "band",
    "barbell",
    "body weight",
    "bosu ball",
    "cable",
    "dumbbell",
    "elliptical machine",
    "ez barbell",
    "kettlebell",
    "leverage machine",
    "medicine ball",
    "resistance band",
    "skierg machine",
    "sled machine",
    "smith machine",
    "stability ball",
    "stationary bike",
    "stepmill machine",
    "trap bar",
    "upper body ergometer",
    "weighted",
    "wheel roller",
];

async fn body_parts(_: Context<'_>, partial: &str) -> impl Iterator<Item = String> {
    let names: Vec<String> = BODY_PARTS.iter().map(|s| s.to_string()).collect();
    filter_choices(&names, partial).into_iter()
}

async fn equipment(_: Context<'_>, partial: &str) -> impl Iterator<Item = String> {
    let names: Vec<String> = EQUIPMENT.iter().map(|s| s.to_string()).collect();
    filter_choices(&names, partial).into_iter()
}

/// Estimate your one rep max with every common formula.
#[poise::command(slash_command, rename = "one-rep-max")]
pub async fn one_rep_max(
    ctx: Context<'_>,
    #[description = "Weight used"] weight: f64,
    #[description = "Unit of the weight"] unit: Unit,
    #[description = "Reps done"]
    #[min = 1]
    #[max = 36]
    reps: u32,
) -> Result<(), Error> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(Error::OutOfRange);
    }
    ctx.say(one_rep_max_report(weight, unit, reps)).await?;
    Ok(())
}

/// Set your PR for an exercise.
#[poise::command(slash_command, rename = "add-pr")]
pub async fn add_pr(
    ctx: Context<'_>,
    #[description = "Exercise"]
    #[autocomplete = "autocomplete::exercises"]
    exercise: String,
    #[description = "Weight, reps or time in seconds"] value: f64,
    #[description = "Unit of the weight, if the exercise is weighted"] unit: Option<Unit>,
) -> Result<(), Error> {
    ctx.defer().await?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::OutOfRange);
    }
    let data = ctx.data();
    let exercise = validate::exercise(&data.cache, &exercise).await?;
    let category = data
        .cache
        .exercises
        .read()
        .await
        .get(&exercise)
        .copied()
        .ok_or(Error::ExerciseDoesntExist)?;

    let stored = match category {
        ExerciseCategory::Max => both_units(value, unit.unwrap_or(Unit::Kg)).0,
        ExerciseCategory::Reps => value.trunc(),
        ExerciseCategory::Time => value,
    };
    db::gym::upsert_pr(&data.db, ctx.author().id.get(), &exercise, stored).await?;

    ctx.say(format!(
        "{} your {exercise} PR is set to {}. {PR_EMOJI}",
        ctx.author().mention(),
        format_pr(category, stored)
    ))
    .await?;
    info!(user = %ctx.author().name, exercise = %exercise, value = stored, "Gym PR set");
    Ok(())
}

/// Show the PR leaderboard of an exercise.
#[poise::command(slash_command, rename = "show-pr")]
pub async fn show_pr(
    ctx: Context<'_>,
    #[description = "Exercise"]
    #[autocomplete = "autocomplete::exercises"]
    exercise: String,
) -> Result<(), Error> {
    ctx.defer().await?;
    let data = ctx.data();
    let exercise = validate::exercise(&data.cache, &exercise).await?;
    let category = data
        .cache
        .exercises
        .read()
        .await
        .get(&exercise)
        .copied()
        .ok_or(Error::ExerciseDoesntExist)?;

    let prs = db::gym::leaderboard(&data.db, &exercise).await?;
    if prs.is_empty() {
        return Err(Error::NoRecordsFound);
    }
    let mut board = format!("# {exercise} Leaderboard\n");
    for (position, (user_id, value)) in prs.iter().enumerate() {
        let name = data.cache.nickname(*user_id).await;
        board.push_str(&format!("{}. {name} - {}\n", position + 1, format_pr(category, *value)));
    }
    ctx.say(board).await?;
    Ok(())
}

/// Search the exercise catalogue.
#[poise::command(slash_command, rename = "exercise-search")]
pub async fn exercise_search(
    ctx: Context<'_>,
    #[description = "Body part"]
    #[autocomplete = "body_parts"]
    location: Option<String>,
    #[description = "Equipment"]
    #[autocomplete = "equipment"]
    equipment: Option<String>,
    #[description = "Exercise name"] exercise_name: Option<String>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    if location.is_none() && equipment.is_none() && exercise_name.is_none() {
        return Err(Error::InvalidFilters);
    }
    let pool = &ctx.data().db;
    let exercise_name = match exercise_name {
        Some(raw) => {
            let names = db::gym::catalogue_names(pool).await?;
            Some(validate::correct(&raw, &names).unwrap_or(raw))
        }
        None => None,
    };

    let rows = db::gym::search_exercises(
        pool,
        location.as_deref(),
        equipment.as_deref(),
        exercise_name.as_deref(),
    )
    .await?;
    if rows.is_empty() {
        return Err(Error::NoExercisesFound);
    }
    paginate(ctx, rows.iter().map(exercise_page).collect(), true).await
}

fn exercise_page(row: &ExerciseRow) -> CreateEmbed {
    embeds::gym_embed()
        .title(&row.name)
        .description(format!(
            "┣ `Target` {}\n┣ `Body part` {}\n┗ `Equipment` {}",
            row.target, row.location, row.equipment
        ))
        .image(&row.url)
}

/// Add an exercise that PRs can be tracked for.
#[poise::command(slash_command, rename = "add-exercise", owners_only)]
pub async fn add_exercise(
    ctx: Context<'_>,
    #[description = "Exercise name"] name: String,
    #[description = "How the PR is measured"] category: ExerciseCategory,
) -> Result<(), Error> {
    let data = ctx.data();
    let name = name.trim().to_string();
    if data.cache.exercises.read().await.contains_key(&name)
        || !db::gym::insert_exercise(&data.db, &name, category).await?
    {
        return Err(Error::DuplicateExercise);
    }
    data.cache.exercises.write().await.insert(name.clone(), category);
    ctx.send(
        CreateReply::default()
            .content(format!("Added {name} to exercise list."))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Convert between kilograms and pounds.
#[poise::command(slash_command)]
pub async fn convert(
    ctx: Context<'_>,
    #[description = "Value to convert"] value: f64,
    #[description = "Unit of the value, both directions if empty"] unit: Option<Unit>,
) -> Result<(), Error> {
    ctx.say(conversion_text(value, unit)).await?;
    Ok(())
}

fn conversion_text(value: f64, unit: Option<Unit>) -> String {
    let kg = lb_to_kg(value);
    let lb = kg_to_lb(value);
    match unit {
        Some(Unit::Lb) => format!("{value} lb ≈ {kg} kg"),
        Some(Unit::Kg) => format!("{value} kg ≈ {lb} lb"),
        None => format!("{value} lb ≈ {kg} kg\n{value} kg ≈ {lb} lb"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_in_both_directions() {
        assert_eq!(conversion_text(220.0, Some(Unit::Lb)), "220 lb ≈ 100 kg");
        assert_eq!(conversion_text(100.0, Some(Unit::Kg)), "100 kg ≈ 220 lb");
        assert_eq!(conversion_text(10.0, None), "10 lb ≈ 4.55 kg\n10 kg ≈ 22 lb");
    }

    #[test]
    fn exercise_page_shows_the_demo() {
        let row = ExerciseRow {
            name: "squat".into(),
            location: "upper legs".into(),
            target: "quads".into(),
            equipment: "barbell".into(),
            url: "https://gif".into(),
        };
        let json = serde_json::to_value(exercise_page(&row)).unwrap();
        assert_eq!(json["title"], "squat");
        assert_eq!(json["image"]["url"], "https://gif");
        assert!(json["description"].as_str().unwrap().contains("`Equipment` barbell"));
    }
}
