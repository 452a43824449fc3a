use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::{
    domain::{Event, EventCategory, EventInput, Notice, NoticeInput},
    error::FieldErrors,
    service::INVALID_DEPARTMENT,
};

const DATETIME_INPUT: &str = "%Y-%m-%dT%H:%M";
const DATETIME_INPUT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct NoticeForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title is required and must be at most 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Content is required."))]
    pub content: String,
    #[serde(default)]
    pub department_id: String,
}

impl NoticeForm {
    pub fn from_notice(notice: &Notice) -> Self {
        Self {
            csrf_token: String::new(),
            title: notice.title.clone(),
            content: notice.content.clone(),
            department_id: notice.department_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    pub fn selected_department(&self) -> i64 {
        self.department_id.trim().parse().unwrap_or(0)
    }

    pub fn to_input(&self) -> Result<NoticeInput, FieldErrors> {
        let trimmed = NoticeForm {
            csrf_token: String::new(),
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            department_id: self.department_id.clone(),
        };

        let mut errors = trimmed.validate().err().map(FieldErrors::from).unwrap_or_default();
        let department_id = parse_department(&trimmed.department_id, &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NoticeInput {
            title: trimmed.title,
            content: trimmed.content,
            department_id,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct EventForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title is required and must be at most 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Venue is required and must be at most 100 characters."))]
    pub venue: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub department_id: String,
}

impl EventForm {
    pub fn from_event(event: &Event) -> Self {
        Self {
            csrf_token: String::new(),
            title: event.title.clone(),
            description: event.description.clone(),
            event_date: event.event_date.format(DATETIME_INPUT).to_string(),
            venue: event.venue.clone(),
            category: event.category.map(|c| c.as_str().to_string()).unwrap_or_default(),
            department_id: event.department_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    pub fn selected_department(&self) -> i64 {
        self.department_id.trim().parse().unwrap_or(0)
    }

    /// Syntactic checks only; the past-date rule needs the clock and runs in the service.
    pub fn to_input(&self) -> Result<EventInput, FieldErrors> {
        let trimmed = EventForm {
            csrf_token: String::new(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            event_date: self.event_date.trim().to_string(),
            venue: self.venue.trim().to_string(),
            category: self.category.trim().to_string(),
            department_id: self.department_id.clone(),
        };

        let mut errors = trimmed.validate().err().map(FieldErrors::from).unwrap_or_default();

        let event_date = parse_event_date(&trimmed.event_date);
        if event_date.is_none() {
            errors.add("event_date", "Enter the date and time as YYYY-MM-DDTHH:MM.");
        }

        let category = if trimmed.category.is_empty() {
            None
        } else {
            let parsed = EventCategory::parse(&trimmed.category);
            if parsed.is_none() {
                errors.add("category", "Not a valid category.");
            }
            parsed
        };

        let department_id = parse_department(&trimmed.department_id, &mut errors);

        match event_date {
            Some(event_date) if errors.is_empty() => Ok(EventInput {
                title: trimmed.title,
                description: trimmed.description,
                event_date,
                venue: trimmed.venue,
                category,
                department_id,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// Empty or `0` means no department.
fn parse_department(raw: &str, errors: &mut FieldErrors) -> Option<i64> {
    match raw.trim() {
        "" => None,
        value => match value.parse::<i64>() {
            Ok(0) => None,
            Ok(id) if id > 0 => Some(id),
            _ => {
                errors.add("department_id", INVALID_DEPARTMENT);
                None
            }
        },
    }
}

fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATETIME_INPUT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, DATETIME_INPUT_SECONDS))
        .ok()
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event_form() -> EventForm {
        EventForm {
            csrf_token: "t".into(),
            title: "Guest Lecture".into(),
            description: "On compilers".into(),
            event_date: "2030-03-14T15:30".into(),
            venue: "Room 101".into(),
            category: "Seminar".into(),
            department_id: "2".into(),
        }
    }

    #[test]
    fn notice_form_trims_and_maps_department() {
        let form = NoticeForm {
            csrf_token: String::new(),
            title: "  Exam Schedule ".into(),
            content: "Finals start Monday".into(),
            department_id: "0".into(),
        };
        let input = form.to_input().unwrap();
        assert_eq!(input.title, "Exam Schedule");
        assert_eq!(input.department_id, None);
    }

    #[test]
    fn notice_form_requires_title_and_content() {
        let form = NoticeForm {
            title: "   ".into(),
            department_id: "abc".into(),
            ..Default::default()
        };
        let errors = form.to_input().unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("content"));
        assert_eq!(errors.get("department_id"), [INVALID_DEPARTMENT]);
    }

    #[test]
    fn notice_title_is_limited_to_200_chars() {
        let form = NoticeForm {
            title: "x".repeat(201),
            content: "body".into(),
            ..Default::default()
        };
        assert!(form.to_input().unwrap_err().has("title"));
    }

    #[test]
    fn event_form_parses_datetime_local_input() {
        let input = event_form().to_input().unwrap();
        assert_eq!(input.event_date, Utc.with_ymd_and_hms(2030, 3, 14, 15, 30, 0).unwrap());
        assert_eq!(input.category, Some(EventCategory::Seminar));
        assert_eq!(input.department_id, Some(2));
    }

    #[test]
    fn event_form_rejects_bad_date_and_category() {
        let form = EventForm {
            event_date: "14/03/2030".into(),
            category: "Party".into(),
            ..event_form()
        };
        let errors = form.to_input().unwrap_err();
        assert!(errors.has("event_date"));
        assert!(errors.has("category"));
    }

    #[test]
    fn empty_category_means_none() {
        let form = EventForm { category: String::new(), ..event_form() };
        assert_eq!(form.to_input().unwrap().category, None);
    }

    #[test]
    fn edit_form_is_prefilled_from_event() {
        let input = event_form().to_input().unwrap();
        let event = Event {
            id: 7,
            title: input.title.clone(),
            description: input.description.clone(),
            event_date: input.event_date,
            venue: input.venue.clone(),
            category: input.category,
            user_id: 1,
            department_id: input.department_id,
            last_edited_by_id: None,
            last_edited_at: None,
        };
        let form = EventForm::from_event(&event);
        assert_eq!(form.event_date, "2030-03-14T15:30");
        assert_eq!(form.category, "Seminar");
        assert_eq!(form.selected_department(), 2);
    }
}
