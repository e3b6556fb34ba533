/// Every failure a command or event handler can produce.
///
/// Variants above the infrastructure block are user errors: their display text
/// is shown to the invoking user as-is and nothing is reported to the log
/// channel. Infrastructure errors get a generic message and are logged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Record must be in HH:MM:SS.ss format. Hours and minutes are optional.")]
    IncorrectRecordFormat,

    #[error("Map code must be 4-6 characters long and contain only letters and numbers.")]
    IncorrectCodeFormat,

    #[error("The URL you provided is not valid or could not be reached.")]
    IncorrectUrlFormat,

    #[error("You must use at least one filter.")]
    InvalidFilters,

    #[error("Invalid map name. Please choose a map name from the autocomplete list.")]
    InvalidMapName,

    #[error("Invalid map code. Please choose a map code that exists in the database.")]
    InvalidMapCode,

    #[error("Invalid level name. Please choose a level from the autocomplete list.")]
    InvalidMapLevel,

    #[error("Invalid map type. Please choose a map type from the autocomplete list.")]
    InvalidMapType,

    #[error("Record must be faster than your previous submission.")]
    RecordNotFaster,

    #[error("No maps found with the given filters.")]
    NoMapsFound,

    #[error("No records found.")]
    NoRecordsFound,

    #[error("You do not have permission to do this.")]
    NoPermissions,

    #[error("This user is already a creator of this map.")]
    CreatorAlreadyExists,

    #[error("This user is not a creator of this map.")]
    CreatorDoesntExist,

    #[error("This level already exists on this map.")]
    LevelExists,

    #[error("There are no guides for this map.")]
    NoGuidesExist,

    #[error("This guide already exists.")]
    GuideExists,

    #[error("The value you entered is out of range.")]
    OutOfRange,

    #[error("The value you entered is not a valid number.")]
    InvalidInteger,

    #[error("User not found. Please choose a user from the autocomplete list.")]
    UserNotFound,

    #[error("No exercises found with the given filters.")]
    NoExercisesFound,

    #[error("There is no exercise with that name.")]
    ExerciseDoesntExist,

    #[error("This exercise already exists.")]
    DuplicateExercise,

    #[error("There is no data for this user in the current season.")]
    NoDataOnCurrentSeason,

    #[error("There is no active tournament.")]
    TournamentNotActive,

    #[error("A tournament is already scheduled or running.")]
    TournamentAlreadyExists,

    #[error("This map has already been released and cannot enter the contest.")]
    MapAlreadyReleased,

    #[error("Invalid mission type for this category.")]
    InvalidMissionType,

    #[error("General missions must use a general mission type and difficulty missions a difficulty type.")]
    MismatchedMissionCategoryType,

    #[error("The target for this mission type must be a whole number.")]
    TargetNotInteger,

    #[error("There is no mission for that category and difficulty.")]
    NoMissionExists,

    #[error("One of the players is already in a duel.")]
    PlayerAlreadyInMatch,

    #[error("One of the players does not have enough XP for this wager.")]
    NotEnoughXp,

    #[error("You are not in a running duel.")]
    NoActiveDuel,

    #[error("There is no tag with that name.")]
    TagNotFound,

    #[error("A tag with that name already exists.")]
    TagExists,

    #[error("Please enter a valid date such as `2026-10-31 18:00` or `in 3 days`.")]
    InvalidDate,

    #[error("This action was not confirmed in time.")]
    Timeout,

    // ─── Infrastructure ──────────────────────────────────────────────

    #[error("Discord API error: {0}")]
    Discord(#[from] Box<serenity::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

impl From<serenity::Error> for Error {
    fn from(err: serenity::Error) -> Self {
        Error::Discord(Box::new(err))
    }
}

impl Error {
    /// True for errors caused by the invoking user rather than by the bot.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Error::Discord(_)
                | Error::Config(_)
                | Error::Database(_)
                | Error::Http(_)
                | Error::Spreadsheet(_)
        )
    }

    /// Text shown to the user in the error embed.
    pub fn user_message(&self) -> String {
        match self {
            Error::Discord(_) | Error::Database(_) | Error::Http(_) | Error::Spreadsheet(_) => {
                "Unknown error. This has been logged and will be looked at shortly.".into()
            }
            Error::Config(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Report posted to the error log channel.
    pub fn log_report(&self, source: &str, origin: &str) -> String {
        let details: String = format!("{self:?}").chars().take(1500).collect();
        format!("**{source}** failed\n{origin}\n```\n{details}\n```")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_are_user_errors() {
        assert!(Error::RecordNotFaster.is_user_error());
        assert!(Error::InvalidMapCode.is_user_error());
        assert!(!Error::Config("missing".into()).is_user_error());
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let err = Error::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_user_error());
        assert!(err.user_message().starts_with("Unknown error"));
    }

    #[test]
    fn log_report_names_the_source() {
        let report = Error::Config("missing".into()).log_report("tournament start", "User: `pixel`");
        assert!(report.starts_with("**tournament start** failed\nUser: `pixel`\n"));
        assert!(report.contains("Config(\"missing\")"));
    }

    #[test]
    fn user_message_matches_display() {
        let err = Error::NoMapsFound;
        assert_eq!(err.user_message(), err.to_string());
    }
}
