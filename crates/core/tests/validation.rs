use schedule_core::model::{CustomEvent, Event, Schedule, TimeSlot};
use schedule_core::validation::{
    normalize_days, schedule_name, validate_schedule, CourseRef, CustomEventDraft, EventKey,
    ValidationError,
};

fn draft(name: &str, days: &str, start: &str, end: &str) -> CustomEventDraft {
    CustomEventDraft {
        name: name.into(),
        days: days.into(),
        start: start.into(),
        end: end.into(),
    }
}

#[test]
fn course_ref_normalizes() {
    let req = CourseRef {
        subject: " acct ".into(),
        course_code: 201,
        section: 'a',
    }
    .validate()
    .unwrap();
    assert_eq!(req.subject, "ACCT");
    assert_eq!(req.section, 'A');
}

#[test]
fn course_ref_rejects_partial_identity() {
    let base = CourseRef {
        subject: "ACCT".into(),
        course_code: 201,
        section: 'A',
    };

    let mut c = base.clone();
    c.subject = "  ".into();
    assert_eq!(c.validate(), Err(ValidationError::EmptySubject));

    let mut c = base.clone();
    c.course_code = 0;
    assert_eq!(c.validate(), Err(ValidationError::InvalidCourseCode));

    let mut c = base;
    c.section = '-';
    assert_eq!(c.validate(), Err(ValidationError::InvalidSection('-')));
}

#[test]
fn custom_event_draft_builds_request() {
    let req = draft(" Work ", "fxmw", "09:00", "10:30:00").validate().unwrap();
    assert_eq!(req.name, "Work");
    assert_eq!(req.days, "MWF");
    assert_eq!(req.start_time, "09:00");
    assert_eq!(req.end_time, "10:30");
}

#[test]
fn custom_event_draft_keeps_seconds_on_the_wire() {
    let req = draft("Quiz", "T", "10:00:10", "10:00:50").validate().unwrap();
    assert_eq!(req.start_time, "10:00:10");
    assert_eq!(req.end_time, "10:00:50");
}

#[test]
fn custom_event_draft_rejects_bad_input() {
    assert_eq!(
        draft("", "M", "09:00", "10:00").validate(),
        Err(ValidationError::EmptyEventName)
    );
    assert_eq!(
        draft("Gym", "SU", "09:00", "10:00").validate(),
        Err(ValidationError::NoDays)
    );
    assert_eq!(
        draft("Gym", "M", "9am", "10:00").validate(),
        Err(ValidationError::InvalidClock("9am".into()))
    );
    assert_eq!(
        draft("Gym", "M", "10:00", "10:00").validate(),
        Err(ValidationError::StartNotBeforeEnd)
    );
}

#[test]
fn event_key_requires_ordered_slot() {
    let key = EventKey {
        name: "Work".into(),
        days: "MWF".into(),
        time: TimeSlot {
            start_time: 36_000,
            end_time: 32_400,
        },
    };
    assert_eq!(key.validate(), Err(ValidationError::StartNotBeforeEnd));

    let key = EventKey {
        time: TimeSlot {
            start_time: 32_400,
            end_time: 90_000,
        },
        ..key
    };
    assert_eq!(key.validate(), Err(ValidationError::OutOfDay(90_000)));
}

#[test]
fn event_key_requires_days_and_keeps_them_verbatim() {
    let key = EventKey {
        name: "Lab".into(),
        days: " ".into(),
        time: TimeSlot {
            start_time: 32_400,
            end_time: 36_000,
        },
    };
    assert_eq!(key.validate(), Err(ValidationError::NoDays));

    let key = EventKey {
        days: "RT".into(),
        ..key
    };
    assert_eq!(key.validate().unwrap().days, "RT");
}

#[test]
fn event_key_of_existing_event() {
    let ev = Event::Custom(CustomEvent {
        name: "Work".into(),
        days: "MWF".into(),
        time: TimeSlot {
            start_time: 32_400,
            end_time: 36_000,
        },
    });
    let req = EventKey::of(&ev).validate().unwrap();
    assert_eq!(req.start_time_seconds, 32_400);
    assert_eq!(req.end_time_seconds, 36_000);
    assert_eq!(req.days, "MWF");
}

#[test]
fn schedule_names_are_trimmed() {
    assert_eq!(schedule_name("  Fall 2024 ").unwrap(), "Fall 2024");
    assert_eq!(schedule_name("   "), Err(ValidationError::EmptyScheduleName));
}

#[test]
fn schema_check_accepts_unscheduled_sections() {
    let mut s = Schedule {
        name: "Fall".into(),
        events: vec![Event::Custom(CustomEvent {
            name: "TBA".into(),
            days: String::new(),
            time: TimeSlot {
                start_time: 0,
                end_time: 0,
            },
        })],
    };
    assert!(validate_schedule(&s).is_ok());

    s.events.push(Event::Custom(CustomEvent {
        name: "Bad".into(),
        days: "M".into(),
        time: TimeSlot {
            start_time: 100,
            end_time: 50,
        },
    }));
    assert_eq!(validate_schedule(&s), Err(ValidationError::StartNotBeforeEnd));
}

#[test]
fn days_keep_weekday_order() {
    assert_eq!(normalize_days("RMT"), "MTR");
    assert_eq!(normalize_days("mmw"), "MW");
    assert_eq!(normalize_days("SaSu"), "");
}
