use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use courtside_api::{GameDraft, Player, PlayerDraft};
use secrecy::SecretString;
use std::fmt;

/// One text input of a modal form. Masked fields render as bullets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

/// Text-input state shared by the login, intake and editor modals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focused: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    Required(&'static str),
    NotANumber(&'static str),
    JerseyOutOfRange(u32),
    BadDate(String),
    BadTime(String),
    AmbiguousLocalTime,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Required(label) => write!(f, "{label} is required"),
            FormError::NotANumber(label) => write!(f, "{label} must be a whole number"),
            FormError::JerseyOutOfRange(n) => {
                write!(f, "Jersey number {n} is outside 0-{}", Player::MAX_JERSEY)
            }
            FormError::BadDate(raw) => write!(f, "Date {raw:?} is not YYYY-MM-DD"),
            FormError::BadTime(raw) => write!(f, "Time {raw:?} is not HH:MM"),
            FormError::AmbiguousLocalTime => write!(f, "That local time does not exist"),
        }
    }
}

impl Form {
    pub fn new(fields: &[(&'static str, bool)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|&(label, masked)| FormField { label, value: String::new(), masked })
                .collect(),
            focused: 0,
        }
    }

    pub fn login() -> Self {
        Self::new(&[("Email", false), ("Password", true)])
    }

    pub fn registration() -> Self {
        Self::new(&[("Name", false), ("Email", false), ("Password", true), ("Jersey", false)])
    }

    pub fn manager() -> Self {
        Self::new(&[("Name", false), ("Email", false), ("Password", true)])
    }

    pub fn intake() -> Self {
        Self::new(&[("Stats URL", false), ("Access cookie", true)])
    }

    pub fn game_editor() -> Self {
        Self::new(&[
            ("Opponent", false),
            ("Date", false),
            ("Time", false),
            ("Venue", false),
            ("Our score", false),
            ("Their score", false),
            ("Video URL", false),
        ])
    }

    pub fn player_editor() -> Self {
        Self::new(&[("Name", false), ("Jersey", false)])
    }

    pub fn search() -> Self {
        Self::new(&[("Search", false)])
    }

    pub fn with_value(mut self, index: usize, value: impl Into<String>) -> Self {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = value.into();
        }
        self
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or_default()
    }

    fn trimmed(&self, index: usize) -> &str {
        self.value(index).trim()
    }

    fn label(&self, index: usize) -> &'static str {
        self.fields.get(index).map(|f| f.label).unwrap_or("Field")
    }

    #[cfg(test)]
    pub fn focused_field(&self) -> Option<&FormField> {
        self.fields.get(self.focused)
    }

    pub fn input(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.value.pop();
        }
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn required(&self, index: usize) -> Result<&str, FormError> {
        let value = self.trimmed(index);
        if value.is_empty() {
            return Err(FormError::Required(self.label(index)));
        }
        Ok(value)
    }

    pub fn optional(&self, index: usize) -> Option<String> {
        let value = self.trimmed(index);
        (!value.is_empty()).then(|| value.to_owned())
    }

    pub fn secret(&self, index: usize) -> SecretString {
        SecretString::new(self.value(index).to_owned().into_boxed_str())
    }

    fn optional_number<T: std::str::FromStr>(&self, index: usize) -> Result<Option<T>, FormError> {
        match self.optional(index) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| FormError::NotANumber(self.label(index))),
        }
    }

    pub fn jersey(&self, index: usize) -> Result<Option<u8>, FormError> {
        let Some(number) = self.optional_number::<u32>(index)? else {
            return Ok(None);
        };
        if !Player::jersey_in_range(number) {
            return Err(FormError::JerseyOutOfRange(number));
        }
        Ok(u8::try_from(number).ok())
    }
}

// ---------------------------------------------------------------------------
// Form -> draft conversions
// ---------------------------------------------------------------------------

pub fn game_form(draft: Option<&GameDraft>) -> Form {
    let Some(draft) = draft else {
        return Form::game_editor().with_value(2, "19:00");
    };
    let local = draft.scheduled_at.with_timezone(&Local);
    let score = |s: Option<u16>| s.map(|v| v.to_string()).unwrap_or_default();
    Form::game_editor()
        .with_value(0, draft.opponent_name.clone())
        .with_value(1, local.format("%Y-%m-%d").to_string())
        .with_value(2, local.format("%H:%M").to_string())
        .with_value(3, draft.venue.clone().unwrap_or_default())
        .with_value(4, score(draft.final_score))
        .with_value(5, score(draft.opponent_score))
        .with_value(6, draft.video_url.clone().unwrap_or_default())
}

/// Date and time are entered in local time.
pub fn game_draft(form: &Form) -> Result<GameDraft, FormError> {
    game_draft_in(form, &Local)
}

fn game_draft_in<Tz: TimeZone>(form: &Form, tz: &Tz) -> Result<GameDraft, FormError> {
    let opponent = form.required(0)?;
    let raw_date = form.required(1)?;
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|_| FormError::BadDate(raw_date.to_owned()))?;
    let time = match form.optional(2) {
        None => NaiveTime::MIN,
        Some(raw) => NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|_| FormError::BadTime(raw))?,
    };
    let scheduled_at: DateTime<Utc> = tz
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or(FormError::AmbiguousLocalTime)?
        .with_timezone(&Utc);

    Ok(GameDraft {
        opponent_name: opponent.to_owned(),
        scheduled_at,
        venue: form.optional(3),
        final_score: form.optional_number(4)?,
        opponent_score: form.optional_number(5)?,
        video_url: form.optional(6),
    })
}

pub fn player_form(player: Option<&Player>) -> Form {
    match player {
        Some(p) => Form::player_editor()
            .with_value(0, p.name.clone())
            .with_value(1, p.jersey_number.to_string()),
        None => Form::player_editor(),
    }
}

pub fn player_draft(form: &Form) -> Result<PlayerDraft, FormError> {
    let name = form.required(0)?.to_owned();
    let jersey_number = form.jersey(1)?.ok_or(FormError::Required("Jersey"))?;
    Ok(PlayerDraft { name, jersey_number })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn typed(mut form: Form, values: &[&str]) -> Form {
        for (i, v) in values.iter().enumerate() {
            form.focused = i;
            v.chars().for_each(|c| form.input(c));
        }
        form.focused = 0;
        form
    }

    #[test]
    fn typing_and_focus_cycle() {
        let mut form = Form::login();
        "amy@club.test".chars().for_each(|c| form.input(c));
        form.focus_next();
        form.input('x');
        form.backspace();
        form.input('p');
        assert_eq!(form.value(0), "amy@club.test");
        assert_eq!(form.value(1), "p");
        assert!(form.focused_field().unwrap().masked);

        form.focus_next();
        assert_eq!(form.focused, 0);
        form.focus_prev();
        assert_eq!(form.focused, 1);
    }

    #[test]
    fn required_fields_are_trimmed() {
        let form = typed(Form::player_editor(), &["   ", "7"]);
        assert_eq!(form.required(0), Err(FormError::Required("Name")));
        assert_eq!(FormError::Required("Name").to_string(), "Name is required");
    }

    #[test]
    fn jersey_must_be_in_range() {
        let form = typed(Form::player_editor(), &["Amy", "100"]);
        assert_eq!(player_draft(&form), Err(FormError::JerseyOutOfRange(100)));

        let form = typed(Form::player_editor(), &["Amy", "seven"]);
        assert_eq!(player_draft(&form), Err(FormError::NotANumber("Jersey")));

        let form = typed(Form::player_editor(), &[" Amy ", "0"]);
        assert_eq!(
            player_draft(&form),
            Ok(PlayerDraft { name: "Amy".into(), jersey_number: 0 })
        );
    }

    #[test]
    fn game_draft_parses_local_date_and_optional_scores() {
        let form = typed(
            Form::game_editor(),
            &["Comets", "2025-03-04", "19:30", "", "61", "", "https://video"],
        );
        let draft = game_draft_in(&form, &Utc).unwrap();
        assert_eq!(draft.opponent_name, "Comets");
        assert_eq!(draft.scheduled_at, Utc.with_ymd_and_hms(2025, 3, 4, 19, 30, 0).unwrap());
        assert_eq!(draft.venue, None);
        assert_eq!(draft.final_score, Some(61));
        assert_eq!(draft.opponent_score, None);
        assert_eq!(draft.video_url.as_deref(), Some("https://video"));
    }

    #[test]
    fn game_draft_rejects_bad_dates_and_scores() {
        let form = typed(Form::game_editor(), &["Comets", "04/03/2025"]);
        assert!(matches!(game_draft_in(&form, &Utc), Err(FormError::BadDate(_))));

        let form = typed(Form::game_editor(), &["Comets", "2025-03-04", "7pm"]);
        assert!(matches!(game_draft_in(&form, &Utc), Err(FormError::BadTime(_))));

        let form = typed(Form::game_editor(), &["Comets", "2025-03-04", "", "", "-3"]);
        assert_eq!(game_draft_in(&form, &Utc), Err(FormError::NotANumber("Our score")));
    }

    #[test]
    fn editing_an_existing_player_prefills_the_form() {
        let player = Player {
            id: courtside_api::PlayerId(3),
            name: "Ben".into(),
            jersey_number: 11,
            is_active: true,
            joined_on: None,
        };
        let form = player_form(Some(&player));
        assert_eq!(form.value(0), "Ben");
        assert_eq!(form.value(1), "11");
    }
}
