//! Seeding configuration and the rows generated from it.

use campusly_models::users::UserRole;
use uuid::Uuid;

/// Domain used for every seeded account. `clear-seed` keys off it.
pub const SEED_EMAIL_DOMAIN: &str = "example.com";

/// Prefix for seeded admission numbers, employee numbers and subject codes.
pub const SEED_CODE_PREFIX: &str = "SEED-";

pub const SUBJECTS: &[(&str, &str)] = &[
    ("Mathematics", "MAT"),
    ("English Language", "ENG"),
    ("Basic Science", "SCI"),
    ("Social Studies", "SOC"),
    ("Computer Studies", "CMP"),
];

/// Seed data for creating a user account.
#[derive(Debug, Clone)]
pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// A student account plus the profile that places it in a section.
#[derive(Debug, Clone)]
pub struct StudentSeed {
    pub user: UserSeed,
    pub admission_number: String,
    pub class_id: Uuid,
    pub section_id: Uuid,
    pub gender: &'static str,
    pub date_of_birth: chrono::NaiveDate,
}

/// A class row and the sections created under it.
#[derive(Debug, Clone)]
pub struct SeededClass {
    pub id: Uuid,
    pub grade: usize,
    pub section_ids: Vec<Uuid>,
}

/// Plaintext passwords given to seeded accounts, one per role.
#[derive(Debug, Clone)]
pub struct SeedPasswords {
    pub teacher: String,
    pub student: String,
    pub parent: String,
}

impl Default for SeedPasswords {
    fn default() -> Self {
        Self {
            teacher: "teacher-pass-123".to_string(),
            student: "student-pass-123".to_string(),
            parent: "parent-pass-123".to_string(),
        }
    }
}

/// Complete configuration for a seeding run.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub classes: usize,
    pub sections_per_class: usize,
    pub students_per_section: usize,
    pub teachers: usize,
    pub academic_year: String,
    pub passwords: SeedPasswords,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            classes: 6,
            sections_per_class: 2,
            students_per_section: 20,
            teachers: 8,
            academic_year: default_academic_year(),
            passwords: SeedPasswords::default(),
        }
    }
}

impl SeedConfig {
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            ..Default::default()
        }
    }

    pub fn with_sections_per_class(mut self, sections: usize) -> Self {
        self.sections_per_class = sections;
        self
    }

    pub fn with_students_per_section(mut self, students: usize) -> Self {
        self.students_per_section = students;
        self
    }

    pub fn with_teachers(mut self, teachers: usize) -> Self {
        self.teachers = teachers;
        self
    }

    pub fn with_academic_year(mut self, academic_year: impl Into<String>) -> Self {
        self.academic_year = academic_year.into();
        self
    }

    pub fn total_students(&self) -> usize {
        self.classes * self.sections_per_class * self.students_per_section
    }

    /// One guardian per pair of students in a section.
    pub fn total_parents(&self) -> usize {
        self.classes * self.sections_per_class * self.students_per_section.div_ceil(2)
    }
}

/// Academic year label for today, e.g. `2025/2026` from September onwards.
pub fn default_academic_year() -> String {
    use chrono::Datelike;

    let today = chrono::Utc::now().date_naive();
    let start = if today.month() >= 9 {
        today.year()
    } else {
        today.year() - 1
    };
    format!("{}/{}", start, start + 1)
}

/// Section names run A, B, C, ...; past Z they fall back to numbers.
pub fn section_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => format!("S{}", index + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let config = SeedConfig::new(3)
            .with_sections_per_class(2)
            .with_students_per_section(5);
        assert_eq!(config.total_students(), 30);
        assert_eq!(config.total_parents(), 18);
    }

    #[test]
    fn test_section_names() {
        assert_eq!(section_name(0), "A");
        assert_eq!(section_name(2), "C");
        assert_eq!(section_name(25), "Z");
        assert_eq!(section_name(26), "S27");
    }

    #[test]
    fn test_academic_year_format() {
        let year = default_academic_year();
        let (start, end) = year.split_once('/').unwrap();
        let start: i32 = start.parse().unwrap();
        let end: i32 = end.parse().unwrap();
        assert_eq!(end, start + 1);
    }

    #[test]
    fn test_subject_codes_are_unique() {
        let mut codes: Vec<_> = SUBJECTS.iter().map(|(_, code)| *code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), SUBJECTS.len());
    }
}
