use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Bounds accepted by the exam service for question counts.
pub const MIN_QUESTIONS: u8 = 5;
pub const MAX_QUESTIONS: u8 = 20;

/// Category of test. Determines which config fields apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    School,
    College,
    Competitive,
}

impl Domain {
    /// Name of the field this domain requires in addition to the common ones.
    #[must_use]
    pub fn required_field(&self) -> &'static str {
        match self {
            Domain::School => "subject",
            Domain::College => "course",
            Domain::Competitive => "exam",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::School => write!(f, "school"),
            Domain::College => write!(f, "college"),
            Domain::Competitive => write!(f, "competitive"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("please enter a topic")]
    MissingTopic,

    #[error("please select a subject")]
    MissingSubject,

    #[error("please select a course")]
    MissingCourse,

    #[error("please select an exam")]
    MissingExam,

    #[error("class level must be between 6 and 12")]
    ClassLevelOutOfRange,

    #[error("semester must be between 1 and 8")]
    SemesterOutOfRange,

    #[error("number of questions must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}")]
    QuestionCountOutOfRange,
}

/// Test parameters gathered by the configuration collector.
///
/// The struct is flat to match the wire shape: domain-specific fields are
/// optional and skipped during serialization when absent. `validate` is the
/// gate between user input and the create-session call; once a config has
/// been submitted it is never mutated client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    pub domain: Domain,
    pub topic: String,
    pub num_questions: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam: Option<String>,
}

impl TestConfig {
    #[must_use]
    pub fn school(class_level: u8, subject: impl Into<String>, topic: impl Into<String>, num_questions: u8) -> Self {
        Self {
            domain: Domain::School,
            topic: topic.into(),
            num_questions,
            class_level: Some(class_level),
            subject: Some(subject.into()),
            course: None,
            semester: None,
            exam: None,
        }
    }

    #[must_use]
    pub fn college(course: impl Into<String>, semester: u8, topic: impl Into<String>, num_questions: u8) -> Self {
        Self {
            domain: Domain::College,
            topic: topic.into(),
            num_questions,
            class_level: None,
            subject: None,
            course: Some(course.into()),
            semester: Some(semester),
            exam: None,
        }
    }

    #[must_use]
    pub fn competitive(exam: impl Into<String>, topic: impl Into<String>, num_questions: u8) -> Self {
        Self {
            domain: Domain::Competitive,
            topic: topic.into(),
            num_questions,
            class_level: None,
            subject: None,
            course: None,
            semester: None,
            exam: Some(exam.into()),
        }
    }

    /// Validate the config locally before any network call.
    ///
    /// Checks run in a fixed order so the first violated rule determines the
    /// message shown to the user: topic, then the domain-specific required
    /// field, then numeric ranges, then question count.
    ///
    /// # Errors
    ///
    /// Returns the first violated `ConfigError`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::MissingTopic);
        }

        match self.domain {
            Domain::School => {
                if self.subject.as_deref().is_none_or(|s| s.trim().is_empty()) {
                    return Err(ConfigError::MissingSubject);
                }
                if let Some(level) = self.class_level {
                    if !(6..=12).contains(&level) {
                        return Err(ConfigError::ClassLevelOutOfRange);
                    }
                }
            }
            Domain::College => {
                if self.course.as_deref().is_none_or(|s| s.trim().is_empty()) {
                    return Err(ConfigError::MissingCourse);
                }
                if let Some(semester) = self.semester {
                    if !(1..=8).contains(&semester) {
                        return Err(ConfigError::SemesterOutOfRange);
                    }
                }
            }
            Domain::Competitive => {
                if self.exam.as_deref().is_none_or(|s| s.trim().is_empty()) {
                    return Err(ConfigError::MissingExam);
                }
            }
        }

        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.num_questions) {
            return Err(ConfigError::QuestionCountOutOfRange);
        }

        Ok(())
    }

    /// One-line description of the test, formatted per domain.
    #[must_use]
    pub fn info_line(&self) -> String {
        match self.domain {
            Domain::School => format!(
                "Class {} - {} - {}",
                self.class_level.map_or_else(|| "?".into(), |l| l.to_string()),
                self.subject.as_deref().unwrap_or("?"),
                self.topic
            ),
            Domain::College => format!(
                "{} - Semester {} - {}",
                self.course.as_deref().unwrap_or("?"),
                self.semester.map_or_else(|| "?".into(), |s| s.to_string()),
                self.topic
            ),
            Domain::Competitive => format!(
                "{} - {}",
                self.exam.as_deref().unwrap_or("?"),
                self.topic
            ),
        }
    }
}

/// Dropdown contents served by the exam service's config-options endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOptions {
    #[serde(default)]
    pub school_subjects: Vec<String>,
    #[serde(default)]
    pub college_courses: Vec<String>,
    #[serde(default)]
    pub competitive_exams: Vec<String>,
}

/// Subjects offered for a given class level (grades 6-12).
///
/// Returns an empty slice outside the supported range.
#[must_use]
pub fn subjects_for_class(class_level: u8) -> &'static [&'static str] {
    match class_level {
        6..=8 => &["Mathematics", "Science", "English", "Social Studies", "Hindi"],
        9 | 10 => &[
            "Mathematics",
            "Science",
            "English",
            "Social Science",
            "Hindi",
            "Sanskrit",
        ],
        // Science stream subjects by default for senior secondary.
        11 | 12 => &[
            "Physics",
            "Chemistry",
            "Mathematics",
            "Biology",
            "English",
            "Computer Science",
        ],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_school_config_passes() {
        let config = TestConfig::school(8, "Science", "Photosynthesis", 10);
        assert!(config.validate().is_ok());
        assert_eq!(config.domain, Domain::School);
        assert_eq!(config.class_level, Some(8));
        assert_eq!(config.num_questions, 10);
    }

    #[test]
    fn topic_is_checked_first() {
        // Missing topic and missing subject: topic wins.
        let mut config = TestConfig::school(8, "", "   ", 99);
        assert_eq!(config.validate(), Err(ConfigError::MissingTopic));

        config.topic = "Algebra".into();
        assert_eq!(config.validate(), Err(ConfigError::MissingSubject));

        config.subject = Some("Mathematics".into());
        assert_eq!(config.validate(), Err(ConfigError::QuestionCountOutOfRange));

        config.num_questions = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn domain_field_errors_match_domain() {
        let college = TestConfig {
            course: None,
            ..TestConfig::college("", 3, "Thermodynamics", 10)
        };
        assert_eq!(college.validate(), Err(ConfigError::MissingCourse));

        let competitive = TestConfig {
            exam: Some("  ".into()),
            ..TestConfig::competitive("", "History", 10)
        };
        assert_eq!(competitive.validate(), Err(ConfigError::MissingExam));
    }

    #[test]
    fn numeric_ranges_are_enforced() {
        let config = TestConfig::school(13, "Science", "Optics", 10);
        assert_eq!(config.validate(), Err(ConfigError::ClassLevelOutOfRange));

        let config = TestConfig::college("B.Tech", 9, "Signals", 10);
        assert_eq!(config.validate(), Err(ConfigError::SemesterOutOfRange));

        let config = TestConfig::competitive("JEE", "Calculus", 21);
        assert_eq!(config.validate(), Err(ConfigError::QuestionCountOutOfRange));
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let config = TestConfig::school(8, "Science", "Photosynthesis", 10);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["domain"], "school");
        assert_eq!(json["class_level"], 8);
        assert_eq!(json["subject"], "Science");
        assert_eq!(json["num_questions"], 10);
        // Fields for other domains are absent, not null.
        assert!(json.get("course").is_none());
        assert!(json.get("exam").is_none());
    }

    #[test]
    fn info_line_formats_per_domain() {
        assert_eq!(
            TestConfig::school(8, "Science", "Photosynthesis", 10).info_line(),
            "Class 8 - Science - Photosynthesis"
        );
        assert_eq!(
            TestConfig::college("B.Sc", 3, "Genetics", 10).info_line(),
            "B.Sc - Semester 3 - Genetics"
        );
        assert_eq!(
            TestConfig::competitive("UPSC", "Polity", 10).info_line(),
            "UPSC - Polity"
        );
    }

    #[test]
    fn subjects_track_class_level() {
        assert!(subjects_for_class(6).contains(&"Social Studies"));
        assert!(subjects_for_class(10).contains(&"Sanskrit"));
        assert!(subjects_for_class(12).contains(&"Physics"));
        assert!(subjects_for_class(5).is_empty());
    }
}
